use anyhow::{bail, Context, Result};
use geojson::{FeatureCollection, GeoJson};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tzq::geojson::{annotate_features, timezones_for_geometry};
use tzq::LocationFinder;

use super::build_finder;
use crate::DataArgs;

/// Separator between ids in the CSV `timezones` column.
const ID_SEPARATOR: &str = ";";

pub async fn run(
    data: &DataArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let finder = build_finder(data)?;

    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => process_csv(&finder, &input, output, &lat_col, &lon_col).await,
        "geojson" | "json" => process_geojson(&finder, &input, output).await,
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_timezones.{}", stem, extension))
}

async fn process_csv(
    finder: &LocationFinder,
    input: &Path,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let output_path = output.unwrap_or_else(|| default_output(input, "csv"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("timezones");
    writer.write_record(&new_headers)?;

    let mut failed = 0u64;
    for (row, record) in records.iter().enumerate() {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude on row {}", row + 1))?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude on row {}", row + 1))?;

        // Failed lookups leave the column empty
        let timezones = match finder.find(lat, lon).await {
            Ok(zones) => zones.join(ID_SEPARATOR),
            Err(e) => {
                failed += 1;
                pb.println(format!("Row {}: {}", row + 1, e));
                String::new()
            }
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&timezones);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    if failed > 0 {
        println!("{} of {} lookups failed", failed, records.len());
    }
    println!("Output written to: {}", output_path.display());
    Ok(())
}

async fn process_geojson(
    finder: &LocationFinder,
    input: &Path,
    output: Option<PathBuf>,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let geojson: GeoJson =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message("Looking up timezones");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = match geojson {
        GeoJson::Geometry(geometry) => {
            let points = timezones_for_geometry(finder, &geometry)
                .await
                .context("Failed to look up geometry")?;
            serde_json::to_value(points)?
        }
        GeoJson::Feature(feature) => {
            let collection = FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            };
            let mut annotated = annotate_features(finder, collection)
                .await
                .context("Failed to annotate feature")?;
            match annotated.features.pop() {
                Some(feature) => serde_json::to_value(GeoJson::Feature(feature))?,
                None => bail!("Feature lost during annotation"),
            }
        }
        GeoJson::FeatureCollection(collection) => {
            let annotated = annotate_features(finder, collection)
                .await
                .context("Failed to annotate features")?;
            serde_json::to_value(GeoJson::FeatureCollection(annotated))?
        }
    };

    spinner.finish_with_message("done");

    let output_path = output.unwrap_or_else(|| default_output(input, "geojson"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

use anyhow::{Context, Result};
use serde::Serialize;

use super::{build_finder, format_offset};
use crate::DataArgs;

#[derive(Serialize)]
struct TimezoneResponse {
    lat: f64,
    lon: f64,
    timezones: Vec<TimezoneEntry>,
}

#[derive(Serialize)]
struct TimezoneEntry {
    tzid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset_minutes: Option<i32>,
}

pub async fn run(data: &DataArgs, lat: f64, lon: f64, offset: bool, json: bool) -> Result<()> {
    let finder = build_finder(data)?;

    let zones = finder
        .find(lat, lon)
        .await
        .context("Failed to look up timezone")?;

    let entries = zones
        .into_iter()
        .map(|tzid| {
            let offset_minutes = if offset {
                Some(
                    tzq::to_offset(&tzid)
                        .with_context(|| format!("No offset for {}", tzid))?,
                )
            } else {
                None
            };
            Ok(TimezoneEntry {
                tzid,
                offset_minutes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if json {
        let response = TimezoneResponse {
            lat,
            lon,
            timezones: entries,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        for entry in entries {
            match entry.offset_minutes {
                Some(minutes) => println!("{} {}", entry.tzid, format_offset(minutes)),
                None => println!("{}", entry.tzid),
            }
        }
    }

    Ok(())
}

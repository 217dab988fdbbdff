use anyhow::{Context, Result};

use super::build_finder;
use crate::DataArgs;

pub async fn run(data: &DataArgs) -> Result<()> {
    let finder = build_finder(data)?;
    let index = finder
        .index()
        .await
        .context("Failed to load index document")?;

    let stats = index.stats();
    let leaves = stats.geometry_leaves + stats.id_list_leaves + stats.empty_nodes;

    println!("Index: {}", data.tz_data.as_deref().unwrap_or("-"));
    println!("Geometry: {}", data.geo_data.as_deref().unwrap_or("-"));
    println!();
    println!("Timezones: {}", stats.timezones);
    println!("Max depth: {}", stats.max_depth);
    println!("Inner nodes: {}", stats.inner_nodes);
    println!("Leaves: {}", leaves);

    if leaves > 0 {
        let pct = |n: u64| (n as f64 / leaves as f64) * 100.0;
        println!(
            "  Id lists: {} ({:.1}%)",
            stats.id_list_leaves,
            pct(stats.id_list_leaves)
        );
        println!(
            "  Geometry: {} ({:.1}%)",
            stats.geometry_leaves,
            pct(stats.geometry_leaves)
        );
        println!(
            "  Empty (ocean): {} ({:.1}%)",
            stats.empty_nodes,
            pct(stats.empty_nodes)
        );
    }

    println!(
        "Referenced geometry: {}",
        format_size(stats.geometry_bytes)
    );

    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

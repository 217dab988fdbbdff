use anyhow::{Context, Result};

use super::build_finder;
use crate::DataArgs;

pub async fn run(data: &DataArgs) -> Result<()> {
    let finder = build_finder(data)?;
    let index = finder
        .index()
        .await
        .context("Failed to load index document")?;

    if index.timezones.is_empty() {
        println!("No timezones in index");
        return Ok(());
    }

    println!("{:>5}  {}", "ID", "TIMEZONE");
    println!("{}", "-".repeat(40));

    for (id, tzid) in index.timezones.iter().enumerate() {
        println!("{:>5}  {}", id, tzid);
    }

    println!();
    println!("Total timezones: {}", index.timezones.len());

    Ok(())
}

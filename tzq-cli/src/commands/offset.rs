use anyhow::{Context, Result};

use super::format_offset;

pub fn run(tzid: &str) -> Result<()> {
    let minutes = tzq::to_offset(tzid).context("Failed to compute offset")?;

    println!("Timezone: {}", tzid);
    println!("Offset: {} ({} minutes)", format_offset(minutes), minutes);

    Ok(())
}

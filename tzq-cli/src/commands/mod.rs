pub mod batch;
pub mod info;
pub mod list;
pub mod offset;
pub mod query;

use anyhow::{Context, Result};
use tzq::{LocationFinder, TzFinderBuilder};

use crate::DataArgs;

/// Build a finder from the global data options.
pub fn build_finder(data: &DataArgs) -> Result<LocationFinder> {
    let tz_data = data
        .tz_data
        .as_deref()
        .context("No index document given. Use --tz-data or set TZQ_TZ_DATA")?;
    let geo_data = data
        .geo_data
        .as_deref()
        .context("No geometry store given. Use --geo-data or set TZQ_GEO_DATA")?;

    TzFinderBuilder::new(tz_data, geo_data)
        .timeout_secs(data.timeout)
        .max_retries(data.max_retries)
        .build()
        .context("Failed to open timezone data")
}

/// Format a UTC offset in minutes as `+HH:MM`.
pub fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_offset() {
        assert_eq!(format_offset(0), "+00:00");
        assert_eq!(format_offset(330), "+05:30");
        assert_eq!(format_offset(-300), "-05:00");
        assert_eq!(format_offset(-570), "-09:30");
        assert_eq!(format_offset(765), "+12:45");
    }
}

//! UTC offsets for timezone ids.

use chrono::{DateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, TzError};

fn parse(tzid: &str) -> Result<Tz> {
    tzid.parse::<Tz>().map_err(|_| TzError::UnknownTimezone {
        tzid: tzid.to_string(),
    })
}

/// Offset from UTC in minutes for `tzid` at the given instant.
///
/// Daylight saving is applied where the zone observes it.
///
/// # Errors
///
/// Returns [`TzError::UnknownTimezone`] if `tzid` is not in the timezone
/// database.
pub fn offset_at(tzid: &str, at: DateTime<Utc>) -> Result<i32> {
    let tz = parse(tzid)?;
    let offset = tz.offset_from_utc_datetime(&at.naive_utc());
    Ok(offset.fix().local_minus_utc() / 60)
}

/// Current offset from UTC in minutes for `tzid`.
pub fn to_offset(tzid: &str) -> Result<i32> {
    offset_at(tzid, Utc::now())
}

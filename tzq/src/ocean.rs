//! Longitude-banded default zones for international waters.

/// A nautical timezone band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OceanZone {
    /// IANA id of the band (`Etc/GMT±N`).
    pub tzid: &'static str,
    /// Western edge, inclusive.
    pub left: f64,
    /// Eastern edge, inclusive.
    pub right: f64,
}

impl OceanZone {
    const fn new(tzid: &'static str, left: f64, right: f64) -> Self {
        Self { tzid, left, right }
    }

    /// Whether `lon` falls within this band (both edges inclusive).
    pub fn contains(&self, lon: f64) -> bool {
        self.left <= lon && lon <= self.right
    }
}

/// Nautical bands, 15° wide and centered on multiples of 15°, east to west.
///
/// `Etc/GMT-N` is N hours *ahead* of UTC (POSIX sign convention).
pub const OCEAN_ZONES: [OceanZone; 25] = [
    OceanZone::new("Etc/GMT-12", 172.5, 180.0),
    OceanZone::new("Etc/GMT-11", 157.5, 172.5),
    OceanZone::new("Etc/GMT-10", 142.5, 157.5),
    OceanZone::new("Etc/GMT-9", 127.5, 142.5),
    OceanZone::new("Etc/GMT-8", 112.5, 127.5),
    OceanZone::new("Etc/GMT-7", 97.5, 112.5),
    OceanZone::new("Etc/GMT-6", 82.5, 97.5),
    OceanZone::new("Etc/GMT-5", 67.5, 82.5),
    OceanZone::new("Etc/GMT-4", 52.5, 67.5),
    OceanZone::new("Etc/GMT-3", 37.5, 52.5),
    OceanZone::new("Etc/GMT-2", 22.5, 37.5),
    OceanZone::new("Etc/GMT-1", 7.5, 22.5),
    OceanZone::new("Etc/GMT", -7.5, 7.5),
    OceanZone::new("Etc/GMT+1", -22.5, -7.5),
    OceanZone::new("Etc/GMT+2", -37.5, -22.5),
    OceanZone::new("Etc/GMT+3", -52.5, -37.5),
    OceanZone::new("Etc/GMT+4", -67.5, -52.5),
    OceanZone::new("Etc/GMT+5", -82.5, -67.5),
    OceanZone::new("Etc/GMT+6", -97.5, -82.5),
    OceanZone::new("Etc/GMT+7", -112.5, -97.5),
    OceanZone::new("Etc/GMT+8", -127.5, -112.5),
    OceanZone::new("Etc/GMT+9", -142.5, -127.5),
    OceanZone::new("Etc/GMT+10", -157.5, -142.5),
    OceanZone::new("Etc/GMT+11", -172.5, -157.5),
    OceanZone::new("Etc/GMT+12", -180.0, -172.5),
];

/// Ids of every band containing `lon`, in table order.
///
/// A longitude on a band edge belongs to both neighbouring bands.
pub fn zones_at(lon: f64) -> Vec<String> {
    OCEAN_ZONES
        .iter()
        .filter(|zone| zone.contains(lon))
        .map(|zone| zone.tzid.to_string())
        .collect()
}

/// Ids of every band, in table order.
pub fn all_zones() -> Vec<String> {
    OCEAN_ZONES.iter().map(|zone| zone.tzid.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zones_at() {
        assert_eq!(zones_at(0.0), vec!["Etc/GMT"]);
        assert_eq!(zones_at(-30.0), vec!["Etc/GMT+2"]);
        assert_eq!(zones_at(150.0), vec!["Etc/GMT-10"]);
        assert_eq!(zones_at(180.0), vec!["Etc/GMT-12"]);
        assert_eq!(zones_at(-180.0), vec!["Etc/GMT+12"]);
    }

    #[test]
    fn test_band_edges_match_both() {
        assert_eq!(zones_at(7.5), vec!["Etc/GMT-1", "Etc/GMT"]);
        assert_eq!(zones_at(-172.5), vec!["Etc/GMT+11", "Etc/GMT+12"]);
    }

    #[test]
    fn test_no_gaps() {
        let mut lon = -180.0;
        while lon <= 180.0 {
            assert!(!zones_at(lon).is_empty(), "gap at {}", lon);
            lon += 0.01;
        }
    }

    #[test]
    fn test_all_zones() {
        let all = all_zones();
        assert_eq!(all.len(), 25);
        assert_eq!(all.first().map(String::as_str), Some("Etc/GMT-12"));
        assert_eq!(all.last().map(String::as_str), Some("Etc/GMT+12"));
    }
}

//! Error types for the tzq library.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Provider error shared between every caller that observed it.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Errors that can occur while looking up timezones.
#[derive(Error, Debug, Clone)]
pub enum TzError {
    /// Latitude or longitude is NaN or outside its domain.
    #[error("Invalid coordinate: lat={lat}, lon={lon} (valid: lat ±90°, lon ±180°)")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// The index document is corrupt or uses an incompatible layout.
    #[error("Malformed index: {reason}")]
    MalformedIndex { reason: String },

    /// An index or geometry provider failed.
    #[error("Transport error: {0}")]
    Transport(#[source] SharedError),

    /// A geometry slice could not be decoded.
    #[error("Failed to decode geometry at bytes {pos}+{len}: {reason}")]
    Decode { pos: u64, len: u64, reason: String },

    /// No ocean zone band covers the longitude.
    #[error("No ocean zone covers longitude {lon}")]
    UncoveredLongitude { lon: f64 },

    /// A GeoJSON geometry holds a position with fewer than two values.
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// The timezone id is not known to the timezone database.
    #[error("Unknown timezone: {tzid}")]
    UnknownTimezone { tzid: String },

    /// Missing or inconsistent configuration.
    #[error("Configuration error: {reason}")]
    Config { reason: String },
}

impl TzError {
    /// Wrap a provider failure without altering it.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        TzError::Transport(Arc::from(err.into()))
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TzError::MalformedIndex {
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`TzError`].
pub type Result<T> = std::result::Result<T, TzError>;

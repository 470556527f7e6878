//! Position fix data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;

/// Geodetic coordinate carried by a fix. Treated as opaque payload by the
/// fusion layer; only the timestamp and provider participate in decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
        }
    }
}

/// A single raw position fix as produced by a platform provider.
///
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Which provider produced this fix
    pub provider: ProviderKind,
    /// When the fix was obtained
    pub timestamp: DateTime<Utc>,
    /// Coordinate payload
    pub position: Position,
    /// Estimated horizontal accuracy in meters
    pub horizontal_accuracy: Option<f64>,
    /// Estimated vertical accuracy in meters
    pub vertical_accuracy: Option<f64>,
    /// Ground speed in m/s
    pub speed: Option<f64>,
    /// Bearing in degrees
    pub bearing: Option<f64>,
}

impl Fix {
    pub fn new(provider: ProviderKind, timestamp: DateTime<Utc>, position: Position) -> Self {
        Self {
            provider,
            timestamp,
            position,
            horizontal_accuracy: None,
            vertical_accuracy: None,
            speed: None,
            bearing: None,
        }
    }

    /// Signed age of this fix relative to another, in milliseconds.
    /// Positive when `self` is more recent.
    pub fn millis_since(&self, other: &Fix) -> i64 {
        self.timestamp
            .signed_duration_since(other.timestamp)
            .num_milliseconds()
    }
}

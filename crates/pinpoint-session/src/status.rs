//! Start/request result codes
//!
//! The ordinals are part of the external contract and must not change.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartStatus {
    /// The platform denied every provider subscription; retry after a
    /// permission grant
    AccessError,
    /// Providers are temporarily unavailable; the session stays registered
    /// and resumes once a provider is re-enabled
    ClosedError,
    /// Malformed request (empty provider mask) or unexpected collaborator
    /// failure
    UnknownSourceError,
    NoError,
}

impl StartStatus {
    /// Stable ordinal shared with the external collaborator.
    pub fn code(&self) -> u8 {
        match self {
            StartStatus::AccessError => 0,
            StartStatus::ClosedError => 1,
            StartStatus::UnknownSourceError => 2,
            StartStatus::NoError => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StartStatus::AccessError => "access_error",
            StartStatus::ClosedError => "closed_error",
            StartStatus::UnknownSourceError => "unknown_source_error",
            StartStatus::NoError => "no_error",
        }
    }

    pub fn is_error(&self) -> bool {
        !matches!(self, StartStatus::NoError)
    }
}

impl std::fmt::Display for StartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

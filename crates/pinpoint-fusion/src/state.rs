//! Fusion State Machine
//!
//! ```text
//! AwaitingFirstFix
//!   ↓ satellite fix
//! SatelliteLocked
//!   ↓ single-shot delivery / session stop
//! Terminated
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionState {
    /// No satellite fix observed yet; network fixes pass unconditionally
    AwaitingFirstFix,
    /// A satellite fix was forwarded; network fixes are debounced against it
    SatelliteLocked,
    /// Session is done; every further fix is dropped
    Terminated,
}

impl FusionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionState::AwaitingFirstFix => "awaiting_first_fix",
            FusionState::SatelliteLocked => "satellite_locked",
            FusionState::Terminated => "terminated",
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, FusionState::Terminated)
    }
}

impl std::fmt::Display for FusionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

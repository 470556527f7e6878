//! Session data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pinpoint_providers::ProviderMask;

use crate::channel::DeliveryChannel;

/// One active listening session. Present in the manager's table iff its
/// delivery channel is alive; exactly one exists per key at any time.
pub struct Session {
    /// Caller-supplied subscription key
    pub key: String,
    /// Requested providers; immutable for the session's lifetime
    pub providers: ProviderMask,
    /// Normalized update cadence in milliseconds (0 for single-shot)
    pub interval_ms: u32,
    /// Delivers at most one fix, then self-destructs
    pub single_shot: bool,
    /// When the session was registered
    pub created_at: DateTime<Utc>,
    /// Owned delivery channel; never shared across sessions
    pub(crate) channel: DeliveryChannel,
}

impl Session {
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            key: self.key.clone(),
            providers: self.providers,
            interval_ms: self.interval_ms,
            single_shot: self.single_shot,
            created_at: self.created_at,
        }
    }
}

/// Immutable snapshot of a session's registration, for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub key: String,
    pub providers: ProviderMask,
    pub interval_ms: u32,
    pub single_shot: bool,
    pub created_at: DateTime<Utc>,
}

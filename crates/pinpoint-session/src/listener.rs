//! Outbound consumer contract
//!
//! The only way results leave the core: forwarded fixes and unavailability
//! notifications. There is no separate error channel for mid-stream
//! delivery failures.

use pinpoint_providers::Fix;

/// Consumer callbacks, invoked from a session's delivery channel thread.
/// Implementations must be cheap or hand off quickly; a wedged callback
/// stalls only its own session.
pub trait FixListener: Send + Sync {
    /// A fix passed arbitration and is being forwarded.
    fn on_fix_delivered(&self, fix: Fix, session_key: &str, single_shot: bool);

    /// Every provider the session requested became disabled. The session
    /// stays registered and resumes transparently on re-enablement.
    fn on_providers_unavailable(&self, session_key: &str);
}

//! Pinpoint Session Management
//!
//! The only mutable shared state in the system. Maps a subscription key to
//! its active session, enforces single-session-per-key, and owns the
//! per-session delivery channels that carry provider callbacks off the
//! caller's thread and into the fusion engine.

mod channel;
mod error;
mod listener;
mod manager;
mod session;
mod status;

pub use channel::DeliveryChannel;
pub use error::SessionError;
pub use listener::FixListener;
pub use manager::{SessionManager, DEFAULT_READY_TIMEOUT, MIN_UPDATE_INTERVAL_MS};
pub use session::{Session, SessionInfo};
pub use status::StartStatus;

pub type Result<T> = std::result::Result<T, SessionError>;

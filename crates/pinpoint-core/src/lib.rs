//! Pinpoint Core
//!
//! Coordination layer binding an injected location platform and consumer
//! listener into the session, fusion and provider components.

mod config;
mod error;
mod source;

pub use config::Config;
pub use error::CoreError;
pub use source::PositionSource;

// Re-export core components
pub use pinpoint_fusion::{Decision, FusionEngine, FusionState};
pub use pinpoint_providers::{
    Fix, LocationPlatform, PlatformError, Position, ProviderCatalog, ProviderEvent,
    ProviderEventSink, ProviderKind, ProviderMask,
};
pub use pinpoint_session::{
    FixListener, Session, SessionError, SessionInfo, SessionManager, StartStatus,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}

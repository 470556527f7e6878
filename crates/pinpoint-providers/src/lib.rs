//! Pinpoint Provider Layer
//!
//! Normalizes platform location providers into a small closed set
//! (satellite, network, passive), models raw position fixes, and defines
//! the collaborator trait the rest of the system talks to the platform
//! through. The platform itself is injected; nothing in this crate calls
//! real location services.

mod catalog;
mod error;
mod fix;
mod platform;
mod provider;

pub use catalog::ProviderCatalog;
pub use error::PlatformError;
pub use fix::{Fix, Position};
pub use platform::{LocationPlatform, ProviderEvent, ProviderEventSink};
pub use provider::{ProviderKind, ProviderMask};

pub type Result<T> = std::result::Result<T, PlatformError>;

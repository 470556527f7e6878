//! Platform collaborator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Permission denied for provider subscription")]
    PermissionDenied,

    #[error("Platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, PlatformError::PermissionDenied)
    }
}

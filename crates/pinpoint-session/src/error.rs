//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to spawn delivery channel thread: {0}")]
    ChannelSpawn(String),

    #[error("Delivery channel did not become ready in time")]
    ChannelNotReady,
}

//! Registry error types
//!
//! Error types for stream registry operations.

use super::frame::StreamKey;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No producer is registered under this key
    StreamNotFound(StreamKey),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::StreamNotFound(key) => write!(f, "Stream not found: {}", key),
        }
    }
}

impl std::error::Error for RegistryError {}

//! Crate-level error types
//!
//! Module-specific failures (`CipherError`, `RegistryError`, `IngestError`,
//! `ChatError`) live beside their modules. This type covers what can abort
//! the server itself.

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for server-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the relay server
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The listener could not bind to the configured address
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),
}

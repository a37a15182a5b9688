//! Server configuration

use std::net::SocketAddr;

use crate::chat::ChatConfig;
use crate::registry::RegistryConfig;
use crate::relay::RelayConfig;

/// Default port the relay listens on
pub const DEFAULT_PORT: u16 = 8080;

/// Largest WebSocket message accepted by default (2 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2 * 1024 * 1024;

/// Origin allowed by default for the key API and viewer endpoint
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum size of one inbound WebSocket message; envelopes are about
    /// 4/3 of the frame size plus the header
    pub max_message_size: usize,

    /// Origins allowed by CORS (empty = any origin)
    pub cors_origins: Vec<String>,

    /// Stream registry behavior
    pub registry: RegistryConfig,

    /// Viewer relay behavior
    pub relay: RelayConfig,

    /// Chat room behavior
    pub chat: ChatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            cors_origins: vec![DEFAULT_CORS_ORIGIN.to_string()],
            registry: RegistryConfig::default(),
            relay: RelayConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the WebSocket message size limit
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Replace the allowed CORS origins
    pub fn cors_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cors_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Set registry options
    pub fn registry(mut self, config: RegistryConfig) -> Self {
        self.registry = config;
        self
    }

    /// Set viewer relay options
    pub fn relay(mut self, config: RelayConfig) -> Self {
        self.relay = config;
        self
    }

    /// Set chat options
    pub fn chat(mut self, config: ChatConfig) -> Self {
        self.chat = config;
        self
    }
}

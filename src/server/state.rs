//! Shared application state handed to every request handler

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::chat::ChatRoomBroadcaster;
use crate::crypto::SessionKeyStore;
use crate::registry::StreamRegistry;
use crate::relay::ViewerRelay;

use super::config::ServerConfig;

/// Handles to the shared maps plus per-process counters
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<SessionKeyStore>,
    pub registry: Arc<StreamRegistry>,
    pub viewers: ViewerRelay,
    pub chat: Arc<ChatRoomBroadcaster>,
    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
    pub max_message_size: usize,
    next_connection_id: Arc<AtomicU64>,
}

impl AppState {
    /// Build empty state from configuration
    pub fn new(config: &ServerConfig) -> Self {
        let registry = Arc::new(StreamRegistry::with_config(config.registry.clone()));

        Self {
            keys: Arc::new(SessionKeyStore::new()),
            viewers: ViewerRelay::new(Arc::clone(&registry), config.relay.clone()),
            registry,
            chat: Arc::new(ChatRoomBroadcaster::with_config(config.chat.clone())),
            shutdown: CancellationToken::new(),
            max_message_size: config.max_message_size,
            next_connection_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate an id for a new WebSocket connection
    pub fn next_connection_id(&self) -> u64 {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }
}

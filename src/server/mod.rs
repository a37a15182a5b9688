//! HTTP/WebSocket server
//!
//! Wires the key store, stream registry, viewer relay and chat rooms into
//! one axum router and serves it.

pub mod config;
pub mod listener;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use listener::RelayServer;
pub use routes::{router, ChatQuery, IngestQuery, SessionKeyPayload};
pub use state::AppState;

//! Encrypted live frame relay
//!
//! Producers push AES-encrypted JPEG frames over a WebSocket; the server
//! decrypts them and keeps only the latest frame per stream. Viewers pull
//! that frame over plain HTTP as an MJPEG (`multipart/x-mixed-replace`)
//! stream. A small room-scoped chat relay rides alongside.
//!
//! # Example
//!
//! ```no_run
//! use mjpeg_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> mjpeg_relay::Result<()> {
//!     let server = RelayServer::new(ServerConfig::default());
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod chat;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;

pub use chat::{ChatConfig, ChatError, ChatRoomBroadcaster};
pub use crypto::{CipherError, FrameCipher, SessionKey, SessionKeyStore};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use registry::{RegistryConfig, StreamKey, StreamRegistry};
pub use relay::{RelayConfig, ViewerRelay};
pub use server::{AppState, RelayServer, ServerConfig};
pub use session::{IngestError, IngestSession};

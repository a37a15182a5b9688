//! MJPEG viewer relay
//!
//! Bridges the registry's single-frame slots to HTTP viewers as an endless
//! `multipart/x-mixed-replace` body. Delivery is at-most-current-frame: no
//! backlog builds up behind a slow viewer.

pub mod config;
pub mod multipart;
pub mod viewer;

pub use config::RelayConfig;
pub use multipart::encode_part;
pub use viewer::{ViewerExit, ViewerRelay, ViewerSession};

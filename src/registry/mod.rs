//! Stream registry for producer/viewer hand-off
//!
//! The registry holds exactly one frame per stream: the latest one. The
//! producer overwrites it, viewers poll it at their own pace.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<StreamRegistry>
//!                     ┌─────────────────────────┐
//!                     │ entries: HashMap<Key,   │
//!                     │   StreamEntry {         │
//!                     │     latest: Bytes,      │
//!                     │   }                     │
//!                     │ >                       │
//!                     │ viewers: HashMap<Key,   │
//!                     │   u32>                  │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Producer]               [Viewer]                [Viewer]
//!    publish()                latest() every tick     latest() every tick
//! ```
//!
//! # Lossy by design
//!
//! There is no queue behind the slot. A viewer slower than the producer
//! simply sees fewer distinct frames; memory stays at one frame per stream
//! no matter how many viewers fall behind. `bytes::Bytes` is reference
//! counted, so all viewers reading a frame share one allocation.

pub mod config;
pub mod entry;
pub mod error;
pub mod frame;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{StreamEntry, StreamStats};
pub use error::RegistryError;
pub use frame::{FrameSnapshot, StreamKey};
pub use store::StreamRegistry;

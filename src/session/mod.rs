//! Producer session management
//!
//! Each producer connection owns an [`IngestSession`] that moves through
//! `Connecting → AwaitingUsername → Active → Closed` and turns inbound
//! envelopes into registry updates.

pub mod ingest;
pub mod state;

pub use ingest::IngestSession;
pub use state::{close_code, CloseReason, IngestError, IngestPhase};

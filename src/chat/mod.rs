//! Room-scoped chat relay
//!
//! Messages are opaque text. The server never parses them; it only fans
//! each one out to the members of the sender's room.

pub mod config;
pub mod error;
pub mod room;

pub use config::ChatConfig;
pub use error::ChatError;
pub use room::{BroadcastReport, ChatMembership, ChatRoomBroadcaster};

//! Chat join errors

use thiserror::Error;

use crate::session::{close_code, CloseReason};

/// Why a chat connection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// `roomId` missing or blank
    #[error("room id required")]
    MissingRoom,

    /// `username` missing or blank
    #[error("username required")]
    MissingUsername,
}

impl ChatError {
    /// Close frame the client receives
    pub fn close_reason(&self) -> CloseReason {
        CloseReason::new(close_code::BAD_DATA, "roomId and username required")
    }
}

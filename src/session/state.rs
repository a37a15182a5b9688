//! Connection lifecycle states and close reasons
//!
//! Tracks a producer connection from upgrade to close, and maps every
//! failure to the WebSocket close frame the peer receives.

use thiserror::Error;

use crate::crypto::CipherError;
use crate::registry::StreamKey;

/// WebSocket close codes used by the relay (RFC 6455 §7.4.1)
pub mod close_code {
    /// Server going down
    pub const GOING_AWAY: u16 = 1001;
    /// Endpoint received a message type it does not accept
    pub const UNSUPPORTED: u16 = 1003;
    /// Protocol violation
    pub const PROTOCOL_ERROR: u16 = 1002;
    /// Message data inconsistent with the expected type ("bad data")
    pub const BAD_DATA: u16 = 1007;
}

/// Close frame to send before dropping a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReason {
    /// Close code
    pub code: u16,
    /// Human-readable reason
    pub reason: &'static str,
}

impl CloseReason {
    /// Build a close reason
    pub const fn new(code: u16, reason: &'static str) -> Self {
        Self { code, reason }
    }
}

/// Producer connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestPhase {
    /// Upgrade done, nothing inspected yet
    Connecting,
    /// Reading the username from the query
    AwaitingUsername,
    /// Stream registered, accepting frames
    Active,
    /// Connection finished; terminal
    Closed,
}

/// Reasons an ingest connection is closed by the server
#[derive(Debug, Error)]
pub enum IngestError {
    /// Query carried no usable username
    #[error("username required")]
    MissingUsername,

    /// No key registered for the producer's session
    #[error("no session key registered for {0}")]
    MissingKey(StreamKey),

    /// Envelope could not be decrypted
    #[error("decryption failed: {0}")]
    Decryption(#[from] CipherError),

    /// Producer sent a binary frame
    #[error("binary messages are not supported")]
    UnsupportedMessage,

    /// Frame arrived while the session was not active
    #[error("session is not active ({0:?})")]
    NotActive(IngestPhase),
}

impl IngestError {
    /// Close frame the producer receives for this error
    pub fn close_reason(&self) -> CloseReason {
        match self {
            IngestError::MissingUsername => {
                CloseReason::new(close_code::BAD_DATA, "Username required.")
            }
            IngestError::MissingKey(_) => {
                CloseReason::new(close_code::PROTOCOL_ERROR, "Missing key")
            }
            IngestError::Decryption(_) => {
                CloseReason::new(close_code::PROTOCOL_ERROR, "Decryption error")
            }
            IngestError::UnsupportedMessage => {
                CloseReason::new(close_code::UNSUPPORTED, "Binary messages not supported")
            }
            IngestError::NotActive(_) => {
                CloseReason::new(close_code::PROTOCOL_ERROR, "Session not active")
            }
        }
    }

    /// Whether the error is a handshake rejection rather than a protocol violation
    pub fn is_bad_request(&self) -> bool {
        matches!(self, IngestError::MissingUsername)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_codes() {
        assert_eq!(IngestError::MissingUsername.close_reason().code, 1007);
        assert_eq!(
            IngestError::MissingKey(StreamKey::new("u1")).close_reason().code,
            1002
        );
        assert_eq!(
            IngestError::Decryption(CipherError::BadPadding).close_reason(),
            CloseReason::new(1002, "Decryption error")
        );
        assert_eq!(IngestError::UnsupportedMessage.close_reason().code, 1003);
    }

    #[test]
    fn test_bad_request_classification() {
        assert!(IngestError::MissingUsername.is_bad_request());
        assert!(!IngestError::Decryption(CipherError::MissingPrefix).is_bad_request());
    }
}

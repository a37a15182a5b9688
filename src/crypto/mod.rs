//! Frame encryption boundary
//!
//! Producers encrypt each JPEG frame with a per-session key and send it as a
//! text envelope. This module holds the key store and the stateless
//! parser/decryptor the ingest path runs on every message.

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod keystore;

pub use cipher::{FrameCipher, BLOCK_SIZE};
pub use envelope::{Envelope, DEFAULT_TAG, ENVELOPE_PREFIX};
pub use error::{CipherError, CipherErrorKind};
pub use keystore::{SessionKey, SessionKeyStore};

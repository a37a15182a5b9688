//! Frame cipher error types

use thiserror::Error;

/// Coarse classification of a cipher failure
///
/// The ingest path only cares which of the three stages failed; the
/// detailed variant stays in [`CipherError`] for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherErrorKind {
    /// Prefix or `tag::payload` shape is wrong
    EnvelopeMalformed,
    /// Payload is not valid base64
    Decode,
    /// Block cipher rejected the key or the ciphertext
    Cipher,
}

/// Error type for envelope parsing and frame decryption
#[derive(Debug, Error)]
pub enum CipherError {
    /// Envelope does not start with the required prefix
    #[error("envelope is missing the encryption prefix")]
    MissingPrefix,

    /// Envelope has the prefix but not the `tag::payload` shape
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(&'static str),

    /// Payload is not valid base64
    #[error("invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Key length does not select an AES variant
    #[error("invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    /// Ciphertext length is not a whole number of blocks
    #[error("ciphertext length {0} is not a multiple of the block size")]
    TruncatedCiphertext(usize),

    /// Padding check failed after decryption (wrong key or corrupted data)
    #[error("padding mismatch after decryption")]
    BadPadding,
}

impl CipherError {
    /// Stage at which the envelope was rejected
    pub fn kind(&self) -> CipherErrorKind {
        match self {
            CipherError::MissingPrefix | CipherError::MalformedEnvelope(_) => {
                CipherErrorKind::EnvelopeMalformed
            }
            CipherError::Decode(_) => CipherErrorKind::Decode,
            CipherError::InvalidKeyLength(_)
            | CipherError::TruncatedCiphertext(_)
            | CipherError::BadPadding => CipherErrorKind::Cipher,
        }
    }
}

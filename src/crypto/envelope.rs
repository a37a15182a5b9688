//! Ciphertext envelope framing
//!
//! One encrypted frame travels as a single text message:
//!
//! ```text
//! AES_ENC_PREFIX::00000000::<base64 ciphertext>
//! └─── prefix ───┘└─ tag ─┘└┘
//!                         separator
//! ```
//!
//! The 8-character tag is checked for position and length only. Producers
//! send `00000000`; any other 8 characters are accepted.

use super::error::CipherError;

/// Required envelope prefix
pub const ENVELOPE_PREFIX: &str = "AES_ENC_PREFIX::";

/// Tag length in characters
pub const TAG_LEN: usize = 8;

/// Separator between tag and payload
pub const TAG_SEPARATOR: &str = "::";

/// Tag sent by the reference producer
pub const DEFAULT_TAG: &str = "00000000";

/// Borrowed view of a parsed envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    /// Opaque 8-character tag
    pub tag: &'a str,
    /// Base64 ciphertext, not yet decoded
    pub payload: &'a str,
}

impl<'a> Envelope<'a> {
    /// Split an envelope into tag and payload without decoding
    pub fn parse(message: &'a str) -> Result<Self, CipherError> {
        let rest = message
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(CipherError::MissingPrefix)?;

        // Byte offset just past the 8th character
        let tag_end = rest
            .char_indices()
            .nth(TAG_LEN)
            .map(|(idx, _)| idx)
            .ok_or(CipherError::MalformedEnvelope("tag shorter than 8 characters"))?;

        let (tag, after_tag) = rest.split_at(tag_end);
        let payload = after_tag
            .strip_prefix(TAG_SEPARATOR)
            .ok_or(CipherError::MalformedEnvelope("missing separator after tag"))?;

        if payload.is_empty() {
            return Err(CipherError::MalformedEnvelope("empty payload"));
        }

        Ok(Self { tag, payload })
    }

    /// Assemble an envelope string from a tag and an already-encoded payload
    ///
    /// Returns `None` when the tag is not exactly 8 characters.
    pub fn encode(tag: &str, payload: &str) -> Option<String> {
        if tag.chars().count() != TAG_LEN {
            return None;
        }

        let mut out = String::with_capacity(
            ENVELOPE_PREFIX.len() + tag.len() + TAG_SEPARATOR.len() + payload.len(),
        );
        out.push_str(ENVELOPE_PREFIX);
        out.push_str(tag);
        out.push_str(TAG_SEPARATOR);
        out.push_str(payload);
        Some(out)
    }
}

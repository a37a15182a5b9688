//! Per-session key storage
//!
//! Keys are registered out of band before a producer starts streaming and
//! looked up by the ingest path on every frame. Entries are never expired:
//! a key lives until the process exits or the same session id registers a
//! replacement.

use bytes::Bytes;
use dashmap::DashMap;

/// Raw symmetric key bytes for one session
///
/// No length check happens here; [`FrameCipher`](super::FrameCipher) rejects
/// lengths it cannot use. `Debug` never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey(Bytes);

impl SessionKey {
    /// Wrap raw key bytes
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// Decode a Latin-1 (ISO-8859-1) string into key bytes
    ///
    /// Each character maps to one byte. Returns `None` if any character is
    /// above U+00FF.
    pub fn from_latin1(s: &str) -> Option<Self> {
        s.chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect::<Option<Vec<u8>>>()
            .map(Self::new)
    }

    /// Encode the key bytes as a Latin-1 string
    pub fn to_latin1(&self) -> String {
        self.0.iter().map(|&b| char::from(b)).collect()
    }

    /// Key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Key length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionKey(<{} bytes>)", self.0.len())
    }
}

/// Concurrent map from session id to key
#[derive(Debug, Default)]
pub struct SessionKeyStore {
    keys: DashMap<String, SessionKey>,
}

impl SessionKeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace the key for a session
    pub fn register(&self, session_id: impl Into<String>, key: SessionKey) {
        let session_id = session_id.into();
        let key_len = key.len();

        if self.keys.insert(session_id.clone(), key).is_some() {
            tracing::debug!(session = %session_id, key_len, "Session key replaced");
        } else {
            tracing::info!(session = %session_id, key_len, "Session key registered");
        }
    }

    /// Look up the key for a session
    ///
    /// `None` means "not registered yet", which callers treat as a normal
    /// outcome.
    pub fn lookup(&self, session_id: &str) -> Option<SessionKey> {
        self.keys.get(session_id).map(|entry| entry.value().clone())
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no session has a key
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

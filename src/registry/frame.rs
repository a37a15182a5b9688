//! Stream identifiers and frame snapshots

use std::sync::Arc;

use bytes::Bytes;

/// Unique identifier for a stream
///
/// The producer's username doubles as the stream id and the session id the
/// key store is indexed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey(Arc<str>);

impl StreamKey {
    /// Create a new stream key
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Stream name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StreamKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for StreamKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The most recent decoded frame of a stream
///
/// Cloning is cheap: `Bytes` is reference counted, so every viewer reading
/// the same frame shares one allocation. A snapshot is never mutated, which
/// is what keeps readers from seeing a half-written frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Frame bytes (empty until the first frame arrives)
    pub data: Bytes,
    /// Number of frames published before this one was taken
    pub sequence: u64,
}

impl FrameSnapshot {
    /// Whether a frame has been published yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_key_display() {
        let key = StreamKey::new("alice");
        assert_eq!(key.to_string(), "alice");
        assert_eq!(key, StreamKey::from(String::from("alice")));
        assert_eq!(key.as_str(), "alice");
    }

    #[test]
    fn test_snapshot_default_is_empty() {
        let snap = FrameSnapshot::default();
        assert!(snap.is_empty());
        assert_eq!(snap.sequence, 0);
    }
}

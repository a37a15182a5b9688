//! Stream registry implementation
//!
//! The central registry that holds the latest frame of every live stream.
//! Producers overwrite their slot; viewers read it whenever they tick.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::config::RegistryConfig;
use super::entry::{StreamEntry, StreamStats};
use super::error::RegistryError;
use super::frame::{FrameSnapshot, StreamKey};

/// Everything guarded by the registry lock
#[derive(Default)]
struct Streams {
    /// Active streams
    entries: HashMap<StreamKey, StreamEntry>,

    /// Attached viewers per stream id
    ///
    /// Lives outside the entries: a viewer whose producer drops and
    /// reconnects between two ticks keeps watching the new entry, and must
    /// stay counted until it detaches.
    viewers: HashMap<StreamKey, u32>,
}

impl Streams {
    fn viewer_count(&self, key: &StreamKey) -> u32 {
        self.viewers.get(key).copied().unwrap_or(0)
    }
}

/// Central registry for all active streams
///
/// Thread-safe via `RwLock`. Every operation takes the lock for a single map
/// access and never awaits anything else while holding it, so a slow viewer
/// or producer cannot stall the others.
///
/// There is no arbitration between producers: a second producer that
/// registers an existing key takes the slot over.
pub struct StreamRegistry {
    streams: RwLock<Streams>,

    /// Configuration
    config: RegistryConfig,
}

impl StreamRegistry {
    /// Create a new stream registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new stream registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            streams: RwLock::new(Streams::default()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register a producer for a stream
    ///
    /// Creates an active entry with an empty frame. An existing entry is
    /// replaced (last connect wins); attached viewers stay counted.
    pub async fn register(&self, key: &StreamKey) {
        let mut streams = self.streams.write().await;
        let viewers = streams.viewer_count(key);

        let previous = streams.entries.insert(key.clone(), StreamEntry::new());
        if previous.is_some() {
            tracing::info!(
                stream = %key,
                viewers,
                "Producer registered (replacing existing stream)"
            );
        } else {
            tracing::info!(stream = %key, viewers, "Producer registered (new stream)");
        }
    }

    /// Replace the latest frame of a stream
    ///
    /// Unknown streams are registered on the fly unless
    /// `auto_register_on_publish` is off, in which case the frame is dropped.
    /// Returns whether the frame was stored.
    pub async fn publish(&self, key: &StreamKey, data: Bytes) -> bool {
        let mut streams = self.streams.write().await;

        if let Some(entry) = streams.entries.get_mut(key) {
            entry.set_frame(data);
            return true;
        }

        if !self.config.auto_register_on_publish {
            tracing::trace!(stream = %key, "Frame for unknown stream dropped");
            return false;
        }

        tracing::debug!(stream = %key, "Publish to unknown stream, registering");
        let mut entry = StreamEntry::new();
        entry.set_frame(data);
        streams.entries.insert(key.clone(), entry);
        true
    }

    /// Latest frame of a stream
    ///
    /// `None` means there is no such stream. A registered stream that has not
    /// received a frame yet returns an empty snapshot.
    pub async fn latest(&self, key: &StreamKey) -> Option<FrameSnapshot> {
        let streams = self.streams.read().await;
        streams.entries.get(key).map(StreamEntry::latest)
    }

    /// Check if a stream has a registered producer
    pub async fn is_active(&self, key: &StreamKey) -> bool {
        self.streams.read().await.entries.contains_key(key)
    }

    /// Remove a stream entirely
    ///
    /// Returns whether an entry was removed. Viewer counts are left alone;
    /// each viewer loop detaches itself when it notices.
    pub async fn unregister(&self, key: &StreamKey) -> bool {
        let mut streams = self.streams.write().await;
        let Some(entry) = streams.entries.remove(key) else {
            return false;
        };

        let stats = entry.stats(streams.viewer_count(key));
        drop(streams);

        tracing::info!(
            stream = %key,
            frames = stats.frames_published,
            bytes = stats.bytes_published,
            fps = stats.publish_rate(),
            viewers = stats.viewer_count,
            "Stream removed"
        );
        true
    }

    /// Count a viewer against an active stream
    ///
    /// Fails with `StreamNotFound` if the stream is not active, which is the
    /// viewer's cue to answer "not found".
    pub async fn attach_viewer(&self, key: &StreamKey) -> Result<u32, RegistryError> {
        let mut streams = self.streams.write().await;

        if !streams.entries.contains_key(key) {
            return Err(RegistryError::StreamNotFound(key.clone()));
        }

        let count = streams.viewers.entry(key.clone()).or_insert(0);
        *count += 1;
        let viewers = *count;

        tracing::debug!(stream = %key, viewers, "Viewer attached");
        Ok(viewers)
    }

    /// Release a viewer previously counted by [`attach_viewer`](Self::attach_viewer)
    ///
    /// Works whether or not the stream is still active.
    pub async fn detach_viewer(&self, key: &StreamKey) {
        let mut streams = self.streams.write().await;

        let Some(count) = streams.viewers.get_mut(key) else {
            return;
        };
        *count = count.saturating_sub(1);
        let viewers = *count;
        if viewers == 0 {
            streams.viewers.remove(key);
        }

        tracing::debug!(stream = %key, viewers, "Viewer detached");
    }

    /// Get stream statistics
    pub async fn stream_stats(&self, key: &StreamKey) -> Option<StreamStats> {
        let streams = self.streams.read().await;
        streams
            .entries
            .get(key)
            .map(|entry| entry.stats(streams.viewer_count(key)))
    }

    /// Number of viewers attached to a stream id, active or not
    pub async fn viewer_count(&self, key: &StreamKey) -> u32 {
        self.streams.read().await.viewer_count(key)
    }

    /// Get total number of streams
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.entries.len()
    }
}

impl Default for StreamRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Stream entry and stats types
//!
//! This module defines the per-stream state stored in the registry. An
//! entry exists exactly while a producer is connected, so presence in the
//! registry is what "active" means. Viewer counts are kept by the registry
//! beside the entries, since viewers outlive a producer reconnect.

use std::time::{Duration, Instant};

use bytes::Bytes;

use super::frame::FrameSnapshot;

/// Entry for a single stream in the registry
#[derive(Debug)]
pub struct StreamEntry {
    /// Latest decoded frame, replaced on every publish
    latest: FrameSnapshot,

    /// Frames published since registration
    frames_published: u64,

    /// Bytes published since registration
    bytes_published: u64,

    /// When the producer registered
    created_at: Instant,

    /// When the last frame was published
    last_frame_at: Option<Instant>,
}

impl StreamEntry {
    /// Create an active entry with an empty frame
    pub(super) fn new() -> Self {
        Self {
            latest: FrameSnapshot::default(),
            frames_published: 0,
            bytes_published: 0,
            created_at: Instant::now(),
            last_frame_at: None,
        }
    }

    /// Overwrite the latest frame
    pub(super) fn set_frame(&mut self, data: Bytes) {
        self.bytes_published += data.len() as u64;
        self.latest = FrameSnapshot {
            data,
            sequence: self.frames_published,
        };
        self.frames_published += 1;
        self.last_frame_at = Some(Instant::now());
    }

    /// Snapshot of the latest frame
    pub fn latest(&self) -> FrameSnapshot {
        self.latest.clone()
    }

    /// Collect statistics for this entry
    pub(super) fn stats(&self, viewer_count: u32) -> StreamStats {
        StreamStats {
            viewer_count,
            frames_published: self.frames_published,
            bytes_published: self.bytes_published,
            latest_frame_len: self.latest.len(),
            age: self.created_at.elapsed(),
            since_last_frame: self.last_frame_at.map(|t| t.elapsed()),
        }
    }
}

/// Statistics for a stream
#[derive(Debug, Clone)]
pub struct StreamStats {
    /// Number of attached viewers
    pub viewer_count: u32,
    /// Frames published since the producer registered
    pub frames_published: u64,
    /// Bytes published since the producer registered
    pub bytes_published: u64,
    /// Size of the current frame
    pub latest_frame_len: usize,
    /// Time since the producer registered
    pub age: Duration,
    /// Time since the last frame, if any
    pub since_last_frame: Option<Duration>,
}

impl StreamStats {
    /// Average publish rate in frames per second
    pub fn publish_rate(&self) -> f64 {
        let secs = self.age.as_secs_f64();
        if secs > 0.0 {
            self.frames_published as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_is_empty() {
        let entry = StreamEntry::new();
        assert!(entry.latest().is_empty());
        assert!(entry.stats(0).since_last_frame.is_none());
    }

    #[test]
    fn test_set_frame_overwrites() {
        let mut entry = StreamEntry::new();
        entry.set_frame(Bytes::from_static(b"first"));
        entry.set_frame(Bytes::from_static(b"second!"));

        let snap = entry.latest();
        assert_eq!(&snap.data[..], b"second!");
        assert_eq!(snap.sequence, 1);

        let stats = entry.stats(3);
        assert_eq!(stats.viewer_count, 3);
        assert_eq!(stats.frames_published, 2);
        assert_eq!(stats.bytes_published, 12);
        assert_eq!(stats.latest_frame_len, 7);
    }

    #[test]
    fn test_publish_rate_zero_age() {
        let stats = StreamStats {
            viewer_count: 0,
            frames_published: 10,
            bytes_published: 0,
            latest_frame_len: 0,
            age: Duration::ZERO,
            since_last_frame: None,
        };
        assert_eq!(stats.publish_rate(), 0.0);
    }
}

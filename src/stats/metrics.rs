//! Statistics for producer and viewer connections

use std::time::{Duration, Instant};

/// Producer-side statistics for one ingest connection
#[derive(Debug, Clone)]
pub struct IngestStats {
    /// Connection start time
    pub started_at: Instant,
    /// Text messages received
    pub messages_received: u64,
    /// Envelope bytes received
    pub bytes_received: u64,
    /// Frames decrypted and published
    pub frames_published: u64,
    /// Decrypted bytes published
    pub bytes_published: u64,
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages_received: 0,
            bytes_received: 0,
            frames_published: 0,
            bytes_published: 0,
        }
    }

    /// Record an inbound envelope
    pub fn on_message(&mut self, envelope_len: usize) {
        self.messages_received += 1;
        self.bytes_received += envelope_len as u64;
    }

    /// Record a published frame
    pub fn on_frame(&mut self, frame_len: usize) {
        self.frames_published += 1;
        self.bytes_published += frame_len as u64;
    }

    /// Connection duration
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Calculate framerate over the connection lifetime
    pub fn framerate(&self) -> f64 {
        framerate(self.frames_published, self.duration())
    }
}

/// Viewer-side statistics for one relay loop
#[derive(Debug, Clone)]
pub struct ViewerStats {
    /// Loop start time
    pub started_at: Instant,
    /// Multipart parts written
    pub frames_sent: u64,
    /// Bytes written, boundaries included
    pub bytes_sent: u64,
    /// Ticks that found no frame to send
    pub empty_ticks: u64,
}

impl Default for ViewerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewerStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
            empty_ticks: 0,
        }
    }

    /// Record a written part
    pub fn on_frame(&mut self, part_len: usize) {
        self.frames_sent += 1;
        self.bytes_sent += part_len as u64;
    }

    /// Record a tick with nothing to send
    pub fn on_empty_tick(&mut self) {
        self.empty_ticks += 1;
    }

    /// Loop duration
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Calculate delivered framerate
    pub fn framerate(&self) -> f64 {
        framerate(self.frames_sent, self.duration())
    }
}

fn framerate(frames: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        frames as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_stats_new() {
        let stats = IngestStats::new();
        assert_eq!(stats.messages_received, 0);
        assert_eq!(stats.bytes_received, 0);
        assert_eq!(stats.frames_published, 0);
        assert_eq!(stats.bytes_published, 0);
    }

    #[test]
    fn test_ingest_stats_counts() {
        let mut stats = IngestStats::new();
        stats.on_message(120);
        stats.on_message(80);
        stats.on_frame(64);

        assert_eq!(stats.messages_received, 2);
        assert_eq!(stats.bytes_received, 200);
        assert_eq!(stats.frames_published, 1);
        assert_eq!(stats.bytes_published, 64);
    }

    #[test]
    fn test_viewer_stats_counts() {
        let mut stats = ViewerStats::new();
        stats.on_frame(1000);
        stats.on_empty_tick();
        stats.on_empty_tick();

        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.bytes_sent, 1000);
        assert_eq!(stats.empty_ticks, 2);
    }

    #[test]
    fn test_framerate_zero_duration() {
        assert_eq!(framerate(10, Duration::ZERO), 0.0);
        assert_eq!(framerate(10, Duration::from_secs(2)), 5.0);
    }
}

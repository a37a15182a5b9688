//! Viewer relay configuration

use std::time::Duration;

/// Default delay between viewer ticks (20 parts per second)
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Default multipart boundary token
pub const DEFAULT_BOUNDARY: &str = "frameboundary";

/// Viewer relay options
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Fixed delay after every tick, whether or not a frame was sent
    pub frame_interval: Duration,

    /// Multipart boundary token (without the leading `--`)
    pub boundary: String,

    /// Content type announced for each part
    pub part_content_type: String,

    /// Parts buffered between the relay loop and the HTTP body
    pub channel_capacity: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            frame_interval: DEFAULT_FRAME_INTERVAL,
            boundary: DEFAULT_BOUNDARY.to_string(),
            part_content_type: "image/jpeg".to_string(),
            channel_capacity: 1,
        }
    }
}

impl RelayConfig {
    /// Set the tick interval
    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// Set the boundary token
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Set the per-part content type
    pub fn part_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.part_content_type = content_type.into();
        self
    }

    /// Set the body channel capacity (at least 1)
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// `Content-Type` header of the viewer response
    pub fn response_content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary={}", self.boundary)
    }
}

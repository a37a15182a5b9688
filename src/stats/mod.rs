//! Connection statistics

pub mod metrics;

pub use metrics::{IngestStats, ViewerStats};

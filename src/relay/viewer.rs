//! Viewer pull loop
//!
//! A viewer never subscribes to anything. Every tick it reads the stream's
//! current frame from the registry, writes it as one multipart part if there
//! is one, then sleeps for the configured interval. The loop holds no lock
//! across any await, and the body channel is tiny, so a slow viewer only
//! ever lags by the frame it is currently writing.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::registry::{RegistryError, StreamKey, StreamRegistry};
use crate::stats::ViewerStats;

use super::config::RelayConfig;
use super::multipart::encode_part;

/// Log a progress line every this many parts
const PROGRESS_EVERY: u64 = 50;

/// Why a viewer loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerExit {
    /// Producer went away
    StreamEnded,
    /// Viewer stopped reading (body dropped)
    ViewerGone,
    /// Server is shutting down
    Shutdown,
}

/// Opens viewer loops against the registry
#[derive(Clone)]
pub struct ViewerRelay {
    registry: Arc<StreamRegistry>,
    config: RelayConfig,
}

impl ViewerRelay {
    /// Create a relay with the given configuration
    pub fn new(registry: Arc<StreamRegistry>, config: RelayConfig) -> Self {
        Self { registry, config }
    }

    /// Relay configuration
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Start viewing a stream
    ///
    /// Fails right away with `StreamNotFound` if the stream is not active;
    /// there is no waiting for a producer to show up.
    pub async fn open(&self, key: StreamKey) -> Result<ViewerSession, RegistryError> {
        match self.registry.attach_viewer(&key).await {
            Ok(_) => {
                tracing::info!(stream = %key, "Viewer connected");
                Ok(ViewerSession {
                    key,
                    registry: Arc::clone(&self.registry),
                    config: self.config.clone(),
                    stats: ViewerStats::new(),
                })
            }
            Err(err) => {
                tracing::info!(stream = %key, "Viewer rejected: stream not active");
                Err(err)
            }
        }
    }
}

/// One attached viewer, ready to run its pull loop
pub struct ViewerSession {
    key: StreamKey,
    registry: Arc<StreamRegistry>,
    config: RelayConfig,
    stats: ViewerStats,
}

impl ViewerSession {
    /// Stream being viewed
    pub fn stream(&self) -> &StreamKey {
        &self.key
    }

    /// Pull frames into `out` until the stream ends, the receiver is
    /// dropped or `shutdown` fires
    ///
    /// None of the exits is an error; the reason is returned for logging.
    pub async fn run(mut self, out: mpsc::Sender<Bytes>, shutdown: CancellationToken) -> ViewerExit {
        let exit = loop {
            let snapshot = match self.registry.latest(&self.key).await {
                Some(snapshot) => snapshot,
                None => break ViewerExit::StreamEnded,
            };

            if snapshot.is_empty() {
                self.stats.on_empty_tick();
                if self.stats.empty_ticks == 1 {
                    tracing::info!(stream = %self.key, "Waiting for first frame");
                }
            } else {
                let part = encode_part(
                    &self.config.boundary,
                    &self.config.part_content_type,
                    &snapshot.data,
                );
                let part_len = part.len();

                tokio::select! {
                    sent = out.send(part) => {
                        if sent.is_err() {
                            break ViewerExit::ViewerGone;
                        }
                    }
                    _ = shutdown.cancelled() => break ViewerExit::Shutdown,
                }

                self.stats.on_frame(part_len);
                if self.stats.frames_sent % PROGRESS_EVERY == 0 {
                    tracing::debug!(
                        stream = %self.key,
                        frames = self.stats.frames_sent,
                        "Viewer progress"
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.frame_interval) => {}
                _ = out.closed() => break ViewerExit::ViewerGone,
                _ = shutdown.cancelled() => break ViewerExit::Shutdown,
            }
        };

        self.registry.detach_viewer(&self.key).await;

        match exit {
            ViewerExit::ViewerGone => tracing::info!(
                stream = %self.key,
                frames = self.stats.frames_sent,
                "Viewer disconnected"
            ),
            ViewerExit::StreamEnded | ViewerExit::Shutdown => tracing::info!(
                stream = %self.key,
                frames = self.stats.frames_sent,
                bytes = self.stats.bytes_sent,
                fps = self.stats.framerate(),
                reason = ?exit,
                "Viewer stream finished"
            ),
        }

        exit
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    fn relay(registry: &Arc<StreamRegistry>) -> ViewerRelay {
        let config = RelayConfig::default().frame_interval(Duration::from_millis(5));
        ViewerRelay::new(Arc::clone(registry), config)
    }

    #[tokio::test]
    async fn test_open_unknown_stream_not_found() {
        let registry = Arc::new(StreamRegistry::new());
        let key = StreamKey::new("nobody");

        let result = relay(&registry).open(key.clone()).await;
        assert!(matches!(result, Err(RegistryError::StreamNotFound(k)) if k == key));
    }

    #[tokio::test]
    async fn test_relays_latest_frame_until_stream_ends() {
        let registry = Arc::new(StreamRegistry::new());
        let key = StreamKey::new("alice");
        registry.register(&key).await;
        registry.publish(&key, Bytes::from_static(b"0123456789")).await;

        let session = relay(&registry).open(key.clone()).await.unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(session.run(tx, CancellationToken::new()));

        let part = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert!(part.starts_with(b"\r\n--frameboundary\r\n"));
        assert!(part.ends_with(b"Content-Length: 10\r\n\r\n0123456789"));
        assert_eq!(registry.stream_stats(&key).await.unwrap().viewer_count, 1);

        registry.unregister(&key).await;
        // Drain whatever was in flight, then the loop must finish on its own
        let exit = timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
            handle.await.unwrap()
        })
        .await
        .unwrap();
        assert_eq!(exit, ViewerExit::StreamEnded);
    }

    #[tokio::test]
    async fn test_empty_stream_sends_nothing() {
        let registry = Arc::new(StreamRegistry::new());
        let key = StreamKey::new("quiet");
        registry.register(&key).await;

        let session = relay(&registry).open(key.clone()).await.unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(session.run(tx, CancellationToken::new()));

        assert!(timeout(Duration::from_millis(40), rx.recv()).await.is_err());

        registry.publish(&key, Bytes::from_static(b"late")).await;
        let part = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert!(part.ends_with(b"late"));

        drop(rx);
        let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(exit, ViewerExit::ViewerGone);
    }

    #[tokio::test]
    async fn test_dropped_viewer_detaches() {
        let registry = Arc::new(StreamRegistry::new());
        let key = StreamKey::new("alice");
        registry.register(&key).await;

        let session = relay(&registry).open(key.clone()).await.unwrap();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let exit = session.run(tx, CancellationToken::new()).await;
        assert_eq!(exit, ViewerExit::ViewerGone);
        assert_eq!(registry.stream_stats(&key).await.unwrap().viewer_count, 0);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_wait() {
        let registry = Arc::new(StreamRegistry::new());
        let key = StreamKey::new("alice");
        registry.register(&key).await;

        let config = RelayConfig::default().frame_interval(Duration::from_secs(60));
        let session = ViewerRelay::new(Arc::clone(&registry), config)
            .open(key)
            .await
            .unwrap();
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(session.run(tx, shutdown.clone()));

        shutdown.cancel();
        let exit = timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        assert_eq!(exit, ViewerExit::Shutdown);
    }
}

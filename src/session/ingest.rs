//! Producer connection handling
//!
//! One `IngestSession` per producer WebSocket. The transport feeds it the
//! query username and then each inbound message in order; the session
//! answers with `Ok` to keep going or with an [`IngestError`] whose close
//! reason the transport sends before hanging up.
//!
//! ```text
//! Connecting ──accept()──► AwaitingUsername ──valid──► Active ──┐
//!                                 │                      │ ▲    │ on_text() ok
//!                                 │ blank                │ └────┘
//!                                 ▼                      ▼ error / disconnect
//!                               Closed ◄─────────────── Closed
//! ```

use std::sync::Arc;

use crate::crypto::{FrameCipher, SessionKeyStore};
use crate::registry::{StreamKey, StreamRegistry};
use crate::stats::IngestStats;

use super::state::{IngestError, IngestPhase};

/// State of one producer connection
pub struct IngestSession {
    /// Connection id, for logs
    id: u64,
    phase: IngestPhase,
    /// Username, once established; doubles as stream id and session id
    stream: Option<StreamKey>,
    keys: Arc<SessionKeyStore>,
    registry: Arc<StreamRegistry>,
    cipher: FrameCipher,
    stats: IngestStats,
}

impl IngestSession {
    /// Create a session for a freshly upgraded connection
    pub fn new(id: u64, keys: Arc<SessionKeyStore>, registry: Arc<StreamRegistry>) -> Self {
        Self {
            id,
            phase: IngestPhase::Connecting,
            stream: None,
            keys,
            registry,
            cipher: FrameCipher::new(),
            stats: IngestStats::new(),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> IngestPhase {
        self.phase
    }

    /// Stream this connection publishes to, once accepted
    pub fn stream(&self) -> Option<&StreamKey> {
        self.stream.as_ref()
    }

    /// Connection statistics
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Validate the username and register the stream
    ///
    /// A missing or blank username closes the session without touching the
    /// registry.
    pub async fn accept(&mut self, username: Option<&str>) -> Result<StreamKey, IngestError> {
        if self.phase != IngestPhase::Connecting {
            return Err(IngestError::NotActive(self.phase));
        }
        self.phase = IngestPhase::AwaitingUsername;

        // Blank check only; the raw name is the stream id and key lookup id
        let username = match username {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                tracing::warn!(session_id = self.id, "Producer rejected: username required");
                self.phase = IngestPhase::Closed;
                return Err(IngestError::MissingUsername);
            }
        };

        let key = StreamKey::new(username);
        self.registry.register(&key).await;
        self.stream = Some(key.clone());
        self.phase = IngestPhase::Active;

        tracing::info!(session_id = self.id, stream = %key, "Stream established");
        Ok(key)
    }

    /// Decrypt one envelope and publish it as the stream's latest frame
    ///
    /// Any failure closes the session: a bad frame is a protocol violation,
    /// not something to skip.
    pub async fn on_text(&mut self, message: &str) -> Result<(), IngestError> {
        let key = match (&self.phase, &self.stream) {
            (IngestPhase::Active, Some(key)) => key.clone(),
            _ => return Err(IngestError::NotActive(self.phase)),
        };

        self.stats.on_message(message.len());

        let result = self.decrypt(&key, message);
        match result {
            Ok(frame) => {
                let len = frame.len();
                self.registry.publish(&key, frame).await;
                self.stats.on_frame(len);
                tracing::trace!(session_id = self.id, stream = %key, bytes = len, "Frame published");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    session_id = self.id,
                    stream = %key,
                    error = %err,
                    "Closing producer"
                );
                self.close().await;
                Err(err)
            }
        }
    }

    /// Binary frames are outside the protocol
    pub async fn on_binary(&mut self) -> Result<(), IngestError> {
        tracing::warn!(session_id = self.id, "Binary frame from producer");
        self.close().await;
        Err(IngestError::UnsupportedMessage)
    }

    /// Connection went away, for whatever reason
    pub async fn on_disconnect(&mut self) {
        self.close().await;
    }

    fn decrypt(&self, key: &StreamKey, message: &str) -> Result<bytes::Bytes, IngestError> {
        let session_key = self
            .keys
            .lookup(key.as_str())
            .ok_or_else(|| IngestError::MissingKey(key.clone()))?;

        Ok(self.cipher.decrypt(message, session_key.as_bytes())?)
    }

    /// Unregister the stream (if any) and enter `Closed`; idempotent
    async fn close(&mut self) {
        if self.phase == IngestPhase::Closed {
            return;
        }
        self.phase = IngestPhase::Closed;

        if let Some(key) = self.stream.take() {
            self.registry.unregister(&key).await;
            tracing::info!(
                session_id = self.id,
                stream = %key,
                messages = self.stats.messages_received,
                frames = self.stats.frames_published,
                bytes = self.stats.bytes_published,
                fps = self.stats.framerate(),
                "Stream stopped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::crypto::{CipherErrorKind, SessionKey, DEFAULT_TAG};

    const KEY: [u8; 16] = [0u8; 16];

    fn setup() -> (Arc<SessionKeyStore>, Arc<StreamRegistry>) {
        (Arc::new(SessionKeyStore::new()), Arc::new(StreamRegistry::new()))
    }

    fn envelope(frame: &[u8]) -> String {
        FrameCipher::new().encrypt(frame, &KEY, DEFAULT_TAG).unwrap()
    }

    #[tokio::test]
    async fn test_blank_username_rejected() {
        let (keys, registry) = setup();

        for name in [None, Some(""), Some("   ")] {
            let mut session = IngestSession::new(1, keys.clone(), registry.clone());
            let err = session.accept(name).await.unwrap_err();
            assert!(err.is_bad_request());
            assert_eq!(err.close_reason().code, 1007);
            assert_eq!(session.phase(), IngestPhase::Closed);
        }
        assert_eq!(registry.stream_count().await, 0);
    }

    #[tokio::test]
    async fn test_accept_registers_stream() {
        let (keys, registry) = setup();
        let mut session = IngestSession::new(1, keys, registry.clone());

        let key = session.accept(Some("alice")).await.unwrap();
        assert_eq!(key.as_str(), "alice");
        assert_eq!(session.phase(), IngestPhase::Active);
        assert!(registry.is_active(&key).await);
        assert!(registry.latest(&key).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_frame_published() {
        let (keys, registry) = setup();
        keys.register("alice", SessionKey::new(KEY.to_vec()));
        let mut session = IngestSession::new(1, keys, registry.clone());
        let key = session.accept(Some("alice")).await.unwrap();

        session.on_text(&envelope(b"frame-1")).await.unwrap();
        session.on_text(&envelope(b"frame-2")).await.unwrap();

        assert_eq!(session.phase(), IngestPhase::Active);
        assert_eq!(
            registry.latest(&key).await.unwrap().data,
            Bytes::from_static(b"frame-2")
        );
        assert_eq!(session.stats().frames_published, 2);
    }

    #[tokio::test]
    async fn test_missing_key_closes() {
        let (keys, registry) = setup();
        let mut session = IngestSession::new(1, keys, registry.clone());
        let key = session.accept(Some("alice")).await.unwrap();

        let err = session.on_text(&envelope(b"frame")).await.unwrap_err();
        assert!(matches!(err, IngestError::MissingKey(_)));
        assert_eq!(err.close_reason().reason, "Missing key");
        assert_eq!(session.phase(), IngestPhase::Closed);
        assert!(!registry.is_active(&key).await);
    }

    #[tokio::test]
    async fn test_bad_envelope_closes() {
        let (keys, registry) = setup();
        keys.register("alice", SessionKey::new(KEY.to_vec()));
        let mut session = IngestSession::new(1, keys, registry.clone());
        let key = session.accept(Some("alice")).await.unwrap();

        session.on_text(&envelope(b"good")).await.unwrap();
        let err = session.on_text("plain text, no prefix").await.unwrap_err();

        match &err {
            IngestError::Decryption(cipher) => {
                assert_eq!(cipher.kind(), CipherErrorKind::EnvelopeMalformed)
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.close_reason().code, 1002);
        assert!(!registry.is_active(&key).await);

        // Nothing more is accepted once closed
        let err = session.on_text(&envelope(b"late")).await.unwrap_err();
        assert!(matches!(err, IngestError::NotActive(IngestPhase::Closed)));
    }

    #[tokio::test]
    async fn test_binary_closes() {
        let (keys, registry) = setup();
        let mut session = IngestSession::new(1, keys, registry.clone());
        let key = session.accept(Some("alice")).await.unwrap();

        let err = session.on_binary().await.unwrap_err();
        assert_eq!(err.close_reason().code, 1003);
        assert!(!registry.is_active(&key).await);
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_once() {
        let (keys, registry) = setup();
        let mut session = IngestSession::new(1, keys, registry.clone());
        let key = session.accept(Some("alice")).await.unwrap();

        session.on_disconnect().await;
        assert_eq!(session.phase(), IngestPhase::Closed);
        assert!(!registry.is_active(&key).await);

        // A newer producer for the same name is not touched by a second close
        registry.register(&key).await;
        session.on_disconnect().await;
        assert!(registry.is_active(&key).await);
    }

    #[tokio::test]
    async fn test_padded_username_kept_verbatim() {
        let (keys, registry) = setup();
        keys.register(" u1", SessionKey::new(KEY.to_vec()));
        let mut session = IngestSession::new(1, keys, registry.clone());

        let key = session.accept(Some(" u1")).await.unwrap();
        assert_eq!(key.as_str(), " u1");

        session.on_text(&envelope(b"frame")).await.unwrap();
        assert!(registry.is_active(&StreamKey::new(" u1")).await);
        assert!(!registry.is_active(&StreamKey::new("u1")).await);
    }

    #[tokio::test]
    async fn test_accept_twice_rejected() {
        let (keys, registry) = setup();
        let mut session = IngestSession::new(1, keys, registry);
        session.accept(Some("alice")).await.unwrap();

        let err = session.accept(Some("bob")).await.unwrap_err();
        assert!(matches!(err, IngestError::NotActive(IngestPhase::Active)));
    }
}

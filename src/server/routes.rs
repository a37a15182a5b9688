//! HTTP and WebSocket routes
//!
//! | Route                              | Kind      | Handler                  |
//! |------------------------------------|-----------|--------------------------|
//! | `GET /stream?username=`            | WebSocket | producer ingest          |
//! | `GET /view/{username}`             | HTTP      | MJPEG viewer             |
//! | `GET /chat?roomId=&username=`      | WebSocket | room chat                |
//! | `POST /api/session`                | JSON      | register a session key   |
//! | `GET /api/session/{sessionId}/key` | JSON      | fetch a session key      |

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::crypto::SessionKey;
use crate::registry::StreamKey;
use crate::session::{close_code, CloseReason, IngestSession};

use super::state::AppState;

const SHUTTING_DOWN: CloseReason = CloseReason::new(close_code::GOING_AWAY, "Server shutting down");

/// Build the application router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/stream", get(ingest_upgrade))
        .route("/view/{username}", get(view_stream))
        .route("/chat", get(chat_upgrade))
        .route("/api/session", post(register_session_key))
        .route("/api/session/{session_id}/key", get(session_key))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(AllowOrigin::any());
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn send_close<S>(sink: &mut S, reason: CloseReason)
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let frame = CloseFrame {
        code: reason.code,
        reason: Utf8Bytes::from_static(reason.reason),
    };
    if let Err(err) = sink.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %err, code = reason.code, "Failed to send close frame");
    }
}

/// Raw query pairs in request order
///
/// Extracted as a list rather than a struct so a repeated key does not fail
/// the request; handlers take the first value.
type QueryPairs = Vec<(String, String)>;

fn first_param(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

// Producer ingest

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestQuery {
    pub username: Option<String>,
}

impl IngestQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            username: first_param(pairs, "username"),
        }
    }
}

async fn ingest_upgrade(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    ws: WebSocketUpgrade,
) -> Response {
    let query = IngestQuery::from_pairs(&pairs);
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| ingest_socket(socket, state, query.username))
}

async fn ingest_socket(mut socket: WebSocket, state: AppState, username: Option<String>) {
    let id = state.next_connection_id();
    let mut session = IngestSession::new(id, Arc::clone(&state.keys), Arc::clone(&state.registry));

    if let Err(err) = session.accept(username.as_deref()).await {
        send_close(&mut socket, err.close_reason()).await;
        return;
    }

    loop {
        let next = tokio::select! {
            next = socket.recv() => Some(next),
            _ = state.shutdown.cancelled() => None,
        };
        let Some(next) = next else {
            send_close(&mut socket, SHUTTING_DOWN).await;
            break;
        };

        let result = match next {
            Some(Ok(Message::Text(text))) => session.on_text(text.as_str()).await,
            Some(Ok(Message::Binary(_))) => session.on_binary().await,
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(()),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(err)) => {
                tracing::debug!(session_id = id, error = %err, "Producer socket error");
                break;
            }
        };

        if let Err(err) = result {
            send_close(&mut socket, err.close_reason()).await;
            break;
        }
    }

    session.on_disconnect().await;
}

// Viewer

async fn view_stream(State(state): State<AppState>, Path(username): Path<String>) -> Response {
    let session = match state.viewers.open(StreamKey::new(&username)).await {
        Ok(session) => session,
        Err(err) => return (StatusCode::NOT_FOUND, err.to_string()).into_response(),
    };

    let config = state.viewers.config();
    let (tx, rx) = mpsc::channel::<Bytes>(config.channel_capacity);
    tokio::spawn(session.run(tx, state.shutdown.clone()));

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, config.response_content_type())
        .header(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .body(body)
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "Failed to build viewer response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })
}

// Chat

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatQuery {
    pub room_id: Option<String>,
    pub username: Option<String>,
}

impl ChatQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            room_id: first_param(pairs, "roomId"),
            username: first_param(pairs, "username"),
        }
    }
}

async fn chat_upgrade(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    ws: WebSocketUpgrade,
) -> Response {
    let query = ChatQuery::from_pairs(&pairs);
    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| chat_socket(socket, state, query))
}

async fn chat_socket(mut socket: WebSocket, state: AppState, query: ChatQuery) {
    let joined = state
        .chat
        .join(query.room_id.as_deref(), query.username.as_deref());
    let (membership, mut outbound) = match joined {
        Ok(joined) => joined,
        Err(err) => {
            tracing::warn!(error = %err, "Chat join rejected");
            send_close(&mut socket, err.close_reason()).await;
            return;
        }
    };

    let (mut sink, mut stream) = socket.split();

    let close = loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    state.chat.publish(&membership, text.as_str());
                }
                Some(Ok(Message::Binary(_))) => {
                    break Some(CloseReason::new(
                        close_code::UNSUPPORTED,
                        "Binary messages not supported",
                    ));
                }
                Some(Ok(Message::Close(_))) | None => break None,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(room = membership.room(), error = %err, "Chat socket error");
                    break None;
                }
            },
            outgoing = outbound.recv() => match outgoing {
                Some(message) => {
                    if let Err(err) = sink.send(Message::Text(message.into())).await {
                        tracing::debug!(
                            room = membership.room(),
                            username = membership.username(),
                            error = %err,
                            "Chat write failed"
                        );
                        break None;
                    }
                }
                None => break None,
            },
            _ = state.shutdown.cancelled() => break Some(SHUTTING_DOWN),
        }
    };

    state.chat.leave(&membership);

    if let Some(reason) = close {
        send_close(&mut sink, reason).await;
    }
}

// Session key exchange

/// Key registration body, and the shape of the lookup response
///
/// `aesKey` is the raw key with each byte carried as one Latin-1 character.
/// The key travels in plain text: acceptable for a local demo, anything
/// else needs TLS and authentication in front of these routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKeyPayload {
    pub session_id: String,
    pub aes_key: String,
}

async fn register_session_key(
    State(state): State<AppState>,
    Json(payload): Json<SessionKeyPayload>,
) -> Response {
    if payload.session_id.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "sessionId required").into_response();
    }

    let Some(key) = SessionKey::from_latin1(&payload.aes_key) else {
        tracing::warn!(session = %payload.session_id, "Rejected key: not a Latin-1 string");
        return (StatusCode::BAD_REQUEST, "aesKey must be a Latin-1 string").into_response();
    };

    state.keys.register(payload.session_id, key);
    StatusCode::OK.into_response()
}

async fn session_key(State(state): State<AppState>, Path(session_id): Path<String>) -> Response {
    match state.keys.lookup(&session_id) {
        Some(key) => Json(SessionKeyPayload {
            session_id,
            aes_key: key.to_latin1(),
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

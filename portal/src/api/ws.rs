//! WebSocket endpoint for live registration counts.
//!
//! Clients open one socket per event they are displaying:
//!
//! ```text
//! ws://localhost:8080/api/ws/events/:id/registrations
//! ```
//!
//! The server pushes the current count immediately on connect and again on
//! every change of the event's registration set — counts are push-driven,
//! never polled.
//!
//! **Server → Client:**
//! ```json
//! {"type":"registration_count","event_id":"…","count":12}
//! ```
//!
//! ## Connection limits
//!
//! - Connection cap per server instance (configurable)
//! - Keep-alive ping on a fixed interval
//! - Idle sockets are dropped after the configured timeout

use crate::server::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

/// Global live-count connection counter.
static ACTIVE_CONNECTIONS: AtomicUsize = AtomicUsize::new(0);

/// WebSocket message from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountMessage {
    /// Current registration count for the watched event.
    RegistrationCount {
        /// Event id.
        event_id: String,
        /// Cardinality of the registration set.
        count: usize,
    },
    /// Something went wrong; the socket closes after this.
    Error {
        /// Error description.
        message: String,
    },
    /// Keep-alive ping.
    Ping,
}

/// Upgrade handler for `/api/ws/events/:id/registrations`.
///
/// Returns 503 when the connection cap is reached.
#[allow(clippy::unused_async)] // Axum handler signature requires async
pub async fn registration_counts(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let current = ACTIVE_CONNECTIONS.load(Ordering::Relaxed);
    if current >= state.config.websocket.max_connections {
        warn!(current_connections = current, "live-count connection limit exceeded");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "Too many concurrent connections. Please try again later.",
        )
            .into_response();
    }

    info!(event = %id, "live-count socket requested");
    ws.on_upgrade(move |socket| handle_count_socket(socket, id, state))
}

async fn handle_count_socket(mut socket: WebSocket, event_id: String, state: AppState) {
    ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
    let event = crate::types::EventId::new(event_id.clone());

    let mut counts = match state.registrations.subscribe_count(&event).await {
        Ok(counts) => counts,
        Err(err) => {
            let message = CountMessage::Error {
                message: err.to_string(),
            };
            let _ = send(&mut socket, &message).await;
            let _ = socket.close().await;
            ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
            return;
        }
    };

    // Push the current count before any change arrives.
    let initial = CountMessage::RegistrationCount {
        event_id: event_id.clone(),
        count: *counts.borrow_and_update(),
    };
    if send(&mut socket, &initial).await.is_err() {
        ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    let mut ping = interval(Duration::from_secs(state.config.websocket.ping_interval));
    ping.tick().await; // first tick fires immediately; skip it
    let idle_limit = Duration::from_secs(state.config.websocket.idle_timeout);
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            changed = counts.changed() => {
                if changed.is_err() {
                    // Observer released; nothing more will ever arrive.
                    break;
                }
                let update = CountMessage::RegistrationCount {
                    event_id: event_id.clone(),
                    count: *counts.borrow_and_update(),
                };
                if send(&mut socket, &update).await.is_err() {
                    break;
                }
            }
            _ = ping.tick() => {
                if last_activity.elapsed() > idle_limit {
                    debug!(event = %event_id, "dropping idle live-count socket");
                    break;
                }
                if send(&mut socket, &CountMessage::Ping).await.is_err() {
                    break;
                }
            }
            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => last_activity = Instant::now(),
                }
            }
        }
    }

    let _ = socket.close().await;
    ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
    debug!(event = %event_id, "live-count socket closed");
}

async fn send(socket: &mut WebSocket, message: &CountMessage) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(payload)).await
}

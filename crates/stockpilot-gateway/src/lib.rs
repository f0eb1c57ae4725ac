//! # stockpilot-gateway
//!
//! Presence over WebSocket: who is online and which page they are on.
//!
//! Protocol (`{"op": ..., "d": ...}` frames):
//! - Server sends `Hello` on connect
//! - Client `Identify { token }` with the auth provider's JWT; server answers
//!   `Ready` or `InvalidSession`
//! - Client `Track { full_name, avatar_url, current_page }` / `Untrack`
//! - Client `Heartbeat`; server `HeartbeatAck`
//! - Every membership change pushes `Sync { state }` to identified clients

pub mod session;

use axum::{
    Json, Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use session::{PresenceRegistry, TrackInfo};
use std::sync::Arc;
use std::time::Duration;
use stockpilot_common::presence::{PresencePayload, PresenceState};
use tokio::sync::{RwLock, broadcast, mpsc};
use uuid::Uuid;

/// Interval clients are asked to heartbeat at.
pub const HEARTBEAT_INTERVAL_MS: u64 = 30_000;

#[derive(Clone)]
pub struct GatewayState {
    pub presence: Arc<PresenceRegistry>,
    /// Membership snapshots fanned out to every connection.
    pub broadcast: broadcast::Sender<PresenceState>,
}

impl GatewayState {
    pub fn new() -> Self {
        let (broadcast, _) = broadcast::channel(1_024);
        Self {
            presence: Arc::new(PresenceRegistry::new()),
            broadcast,
        }
    }

    /// Push the current membership to every connected client.
    async fn publish(&self) {
        let snapshot = self.presence.snapshot().await;
        // No receivers just means nobody is connected.
        let _ = self.broadcast.send(snapshot);
    }

    /// Register `session_id` for `user_id`. A re-identify drops whatever the
    /// session tracked, so the others are told.
    async fn identify_session(&self, session_id: &str, user_id: Uuid) {
        if self.presence.identify(session_id, user_id).await {
            self.publish().await;
        }
    }

    /// Track a payload for an identified connection, re-registering the
    /// session first if the sweeper dropped it. Returns whether it was tracked.
    async fn track_session(&self, session_id: &str, user_id: Uuid, info: TrackInfo) -> bool {
        if self.presence.resume(session_id, user_id).await {
            tracing::debug!(session = %session_id, "Resumed swept presence session");
        }
        let tracked = self.presence.track(session_id, info, chrono::Utc::now()).await;
        if tracked {
            self.publish().await;
        }
        tracked
    }

    async fn heartbeat_session(&self, session_id: &str, user_id: Option<Uuid>) {
        if let Some(uid) = user_id {
            if self.presence.resume(session_id, uid).await {
                tracing::debug!(session = %session_id, "Resumed swept presence session");
            }
        }
        self.presence.heartbeat(session_id).await;
    }

    /// Drop sessions that missed heartbeats for longer than `max_idle`.
    /// Returns how many were removed.
    pub async fn sweep_stale(&self, max_idle: Duration) -> usize {
        let max_idle =
            chrono::Duration::from_std(max_idle).unwrap_or_else(|_| chrono::Duration::days(365));
        let cutoff = chrono::Utc::now() - max_idle;

        let stale = self.presence.stale_sessions(cutoff).await;
        let mut changed = false;
        for session_id in &stale {
            changed |= self.presence.remove(session_id).await;
        }
        if changed {
            self.publish().await;
        }
        if !stale.is_empty() {
            tracing::info!(count = stale.len(), "Removed stale presence sessions");
        }
        stale.len()
    }
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Frames sent by clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    Identify {
        token: String,
    },
    Track {
        #[serde(default)]
        full_name: Option<String>,
        #[serde(default)]
        avatar_url: Option<String>,
        #[serde(default)]
        current_page: Option<String>,
    },
    Untrack,
    Heartbeat,
}

/// Frames sent by the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    Hello { heartbeat_interval: u64 },
    Ready { session_id: String, user_id: Uuid },
    InvalidSession,
    HeartbeatAck { timestamp: i64 },
    Sync { state: PresenceState },
}

impl ServerMessage {
    fn to_frame(&self) -> Option<Message> {
        match serde_json::to_string(self) {
            Ok(text) => Some(Message::Text(text.into())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode presence frame");
                None
            }
        }
    }
}

/// Build the presence router: the WebSocket endpoint and the online list.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/presence", get(ws_handler))
        .route("/presence/online", get(online_users))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn online_users(State(state): State<Arc<GatewayState>>) -> Json<Vec<PresencePayload>> {
    Json(state.presence.online().await)
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<GatewayState>>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut sender, mut receiver) = socket.split();
    let session_id = Uuid::new_v4().to_string();

    // Replies from the receive loop go through the sender task.
    let (direct_tx, mut direct_rx) = mpsc::channel::<ServerMessage>(32);
    let identified: Arc<RwLock<Option<Uuid>>> = Arc::new(RwLock::new(None));

    // Subscribe before anything can change so no snapshot is missed.
    let mut snapshots = state.broadcast.subscribe();

    let hello = ServerMessage::Hello {
        heartbeat_interval: HEARTBEAT_INTERVAL_MS,
    };
    let Some(frame) = hello.to_frame() else { return };
    if sender.send(frame).await.is_err() {
        return;
    }

    let identified_clone = identified.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                snapshot = snapshots.recv() => match snapshot {
                    Ok(state) => {
                        if identified_clone.read().await.is_none() {
                            continue;
                        }
                        ServerMessage::Sync { state }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // A newer snapshot follows; older ones are obsolete anyway.
                        tracing::debug!(skipped, "Presence receiver lagged");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                direct = direct_rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let Some(frame) = outgoing.to_frame() else { continue };
            if sender.send(frame).await.is_err() {
                break;
            }
        }
    });

    let mut user_id: Option<Uuid> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
            tracing::debug!(session = %session_id, "Ignoring malformed presence frame");
            continue;
        };

        match client_msg {
            ClientMessage::Identify { token } => {
                let config = stockpilot_common::config::get();
                let uid = stockpilot_common::auth::validate_token(&token, &config.auth.jwt_secret)
                    .ok()
                    .and_then(|claims| claims.user_id());

                let Some(uid) = uid else {
                    let _ = direct_tx.send(ServerMessage::InvalidSession).await;
                    continue;
                };

                user_id = Some(uid);
                state.identify_session(&session_id, uid).await;
                *identified.write().await = Some(uid);

                let _ = direct_tx
                    .send(ServerMessage::Ready {
                        session_id: session_id.clone(),
                        user_id: uid,
                    })
                    .await;
                let _ = direct_tx
                    .send(ServerMessage::Sync {
                        state: state.presence.snapshot().await,
                    })
                    .await;
                tracing::info!(session = %session_id, user = %uid, "Presence session identified");
            }

            ClientMessage::Track {
                full_name,
                avatar_url,
                current_page,
            } => {
                let Some(uid) = user_id else { continue };
                let info = TrackInfo {
                    full_name,
                    avatar_url,
                    current_page,
                };
                state.track_session(&session_id, uid, info).await;
            }

            ClientMessage::Untrack => {
                if state.presence.untrack(&session_id).await {
                    state.publish().await;
                }
            }

            ClientMessage::Heartbeat => {
                state.heartbeat_session(&session_id, user_id).await;
                let _ = direct_tx
                    .send(ServerMessage::HeartbeatAck {
                        timestamp: chrono::Utc::now().timestamp_millis(),
                    })
                    .await;
            }
        }
    }

    if state.presence.remove(&session_id).await {
        state.publish().await;
    }
    send_task.abort();
    tracing::info!(session = %session_id, user = ?user_id, "Presence session closed");
}

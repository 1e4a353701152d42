//! WebSocket endpoint for order notifications.
//!
//! `GET /ws`, authenticated by the session cookie sent with the upgrade.
//!
//! Protocol (JSON text frames):
//! - Client → server: `{"type": "admin:subscribe"}`, `{"type": "admin:unsubscribe"}`,
//!   `{"type": "customer:subscribe", "userId": 42}`,
//!   `{"type": "customer:unsubscribe", "userId": 42}`
//! - Server → client: [`OrderEvent`]s, plus `subscribed` / `unsubscribed`
//!   acknowledgements and `error` replies to rejected signals.
//!
//! A connection receives nothing until it subscribes. Each subscription gets
//! a forwarder task that copies events from the notifier into this
//! connection's outbound queue.
//!
//! The session is re-read from the store on every signal and on every
//! keepalive tick. After a logout or expiry, new subscriptions are refused
//! and held ones the session no longer permits are dropped within one
//! [`PING_INTERVAL`].

use std::collections::HashMap;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};
use tower_sessions::session::Id;
use tower_sessions::{Session, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use fastlanche_core::UserId;

use super::{Channel, Notifier, OrderEvent};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Outbound queue depth per connection.
const OUTBOUND_BUFFER: usize = 64;

/// Keepalive ping interval.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// A subscribe/unsubscribe signal from the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientSignal {
    #[serde(rename = "admin:subscribe")]
    AdminSubscribe,
    #[serde(rename = "admin:unsubscribe")]
    AdminUnsubscribe,
    #[serde(rename = "customer:subscribe", rename_all = "camelCase")]
    CustomerSubscribe { user_id: UserId },
    #[serde(rename = "customer:unsubscribe", rename_all = "camelCase")]
    CustomerUnsubscribe { user_id: UserId },
}

impl ClientSignal {
    /// The channel this signal targets and whether it joins or leaves it.
    #[must_use]
    pub const fn target(self) -> (Channel, bool) {
        match self {
            Self::AdminSubscribe => (Channel::Admin, true),
            Self::AdminUnsubscribe => (Channel::Admin, false),
            Self::CustomerSubscribe { user_id } => (Channel::Customer(user_id), true),
            Self::CustomerUnsubscribe { user_id } => (Channel::Customer(user_id), false),
        }
    }
}

/// Control replies sent alongside order events.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data")]
enum ControlMessage {
    #[serde(rename = "subscribed")]
    Subscribed { channel: String },
    #[serde(rename = "unsubscribed")]
    Unsubscribed { channel: String },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Whether `user` may listen on `channel`.
///
/// Admins may join any channel; customers only their own.
#[must_use]
pub fn may_subscribe(user: Option<&CurrentUser>, channel: Channel) -> bool {
    match (user, channel) {
        (None, _) => false,
        (Some(user), Channel::Admin) => user.is_admin(),
        (Some(user), Channel::Customer(owner)) => user.can_access(owner),
    }
}

/// The user behind a connection's session, read fresh from the store.
#[derive(Debug, Clone)]
pub struct SessionUser<S> {
    store: S,
    id: Option<Id>,
}

impl<S: SessionStore> SessionUser<S> {
    #[must_use]
    pub const fn new(store: S, id: Option<Id>) -> Self {
        Self { store, id }
    }

    /// The logged-in user, or `None` once the session is gone or expired.
    pub async fn load(&self) -> Option<CurrentUser> {
        let id = self.id?;
        match self.store.load(&id).await {
            Ok(record) => record?
                .data
                .get(session_keys::CURRENT_USER)
                .cloned()
                .and_then(|value| serde_json::from_value(value).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to reload WebSocket session");
                None
            }
        }
    }
}

/// GET /ws
pub async fn handle_ws(
    State(state): State<AppState>,
    session: Session,
    ws: WebSocketUpgrade,
) -> Response {
    let notifier = state.notifier().clone();
    let session = SessionUser::new(PostgresStore::new(state.pool().clone()), session.id());
    ws.on_upgrade(move |socket| run_session(socket, notifier, session))
}

async fn run_session<S: SessionStore>(
    socket: WebSocket,
    notifier: Notifier,
    session: SessionUser<S>,
) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<OrderEvent>(OUTBOUND_BUFFER);
    let mut subscriptions: HashMap<Channel, JoinHandle<()>> = HashMap::new();

    let user_id = session.load().await.map(|u| u.id);
    tracing::info!(user_id = ?user_id, "WebSocket connected");

    let mut ping = interval(PING_INTERVAL);
    ping.tick().await; // skip immediate

    'session: loop {
        tokio::select! {
            _ = ping.tick() => {
                if !subscriptions.is_empty() {
                    let user = session.load().await;
                    for channel in revoke_lapsed(user.as_ref(), &notifier, &mut subscriptions).await {
                        let reply = ControlMessage::Unsubscribed { channel: channel.to_string() };
                        if send_json(&mut sink, &reply).await.is_err() {
                            break 'session;
                        }
                    }
                }
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            Some(event) = out_rx.recv() => {
                if send_json(&mut sink, &event).await.is_err() {
                    break;
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientSignal>(&text) {
                            Ok(signal) => {
                                let user = session.load().await;
                                apply_signal(
                                    signal,
                                    user.as_ref(),
                                    &notifier,
                                    &out_tx,
                                    &mut subscriptions,
                                )
                                .await
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Unrecognized WebSocket signal");
                                ControlMessage::Error {
                                    message: "unrecognized signal".to_string(),
                                }
                            }
                        };
                        if send_json(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    for (channel, handle) in subscriptions {
        stop_forwarder(&notifier, channel, handle).await;
    }

    tracing::info!(user_id = ?user_id, "WebSocket disconnected");
}

async fn apply_signal(
    signal: ClientSignal,
    user: Option<&CurrentUser>,
    notifier: &Notifier,
    out_tx: &mpsc::Sender<OrderEvent>,
    subscriptions: &mut HashMap<Channel, JoinHandle<()>>,
) -> ControlMessage {
    let (channel, join) = signal.target();

    if !join {
        if let Some(handle) = subscriptions.remove(&channel) {
            stop_forwarder(notifier, channel, handle).await;
        }
        return ControlMessage::Unsubscribed {
            channel: channel.to_string(),
        };
    }

    if !may_subscribe(user, channel) {
        tracing::warn!(
            user_id = ?user.map(|u| u.id),
            %channel,
            "Rejected WebSocket subscription"
        );
        return ControlMessage::Error {
            message: format!("not allowed to subscribe to {channel}"),
        };
    }

    subscriptions
        .entry(channel)
        .or_insert_with(|| spawn_forwarder(notifier, channel, out_tx.clone()));

    ControlMessage::Subscribed {
        channel: channel.to_string(),
    }
}

/// Stop every subscription `user` is no longer allowed to hold.
///
/// Returns the channels that were dropped.
async fn revoke_lapsed(
    user: Option<&CurrentUser>,
    notifier: &Notifier,
    subscriptions: &mut HashMap<Channel, JoinHandle<()>>,
) -> Vec<Channel> {
    let lapsed: Vec<Channel> = subscriptions
        .keys()
        .copied()
        .filter(|channel| !may_subscribe(user, *channel))
        .collect();

    for channel in &lapsed {
        if let Some(handle) = subscriptions.remove(channel) {
            stop_forwarder(notifier, *channel, handle).await;
        }
        tracing::info!(
            user_id = ?user.map(|u| u.id),
            %channel,
            "Dropped WebSocket subscription after session change"
        );
    }
    lapsed
}

fn spawn_forwarder(
    notifier: &Notifier,
    channel: Channel,
    out_tx: mpsc::Sender<OrderEvent>,
) -> JoinHandle<()> {
    // Subscribe before spawning so nothing published after the ack is missed
    let mut rx = notifier.subscribe(channel);

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if out_tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(%channel, skipped, "WebSocket subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn stop_forwarder(notifier: &Notifier, channel: Channel, handle: JoinHandle<()>) {
    handle.abort();
    // Wait for the task to drop its receiver before pruning the channel
    let _ = handle.await;
    notifier.release(channel);
}

async fn send_json<S, T>(sink: &mut S, value: &T) -> Result<(), axum::Error>
where
    S: SinkExt<Message, Error = axum::Error> + Unpin,
    T: Serialize,
{
    match serde_json::to_string(value) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WebSocket message");
            Ok(())
        }
    }
}

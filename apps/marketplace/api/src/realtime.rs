//! Realtime push over WebSocket.
//!
//! Every [`RealtimeEvent`] published by the effect dispatcher goes through one
//! `tokio::sync::broadcast` channel. Each socket owns a [`Session`] that
//! remembers which rooms it joined and forwards only matching events as
//! `{topic, event, payload}` frames. Delivery is best effort: a socket that
//! falls behind skips events and relies on the stored notifications.

use async_trait::async_trait;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use domain_messages::{MessageRepository, MessageService};
use domain_notifications::{RealtimeEvent, RealtimePublisher, Room, ServerEvent};
use domain_users::Actor;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out point between the effect dispatcher and connected sockets.
pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.tx.subscribe()
    }

    pub fn connections(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimePublisher for RealtimeHub {
    fn publish(&self, event: RealtimeEvent) {
        // Err only means nobody is connected
        if self.tx.send(event).is_err() {
            debug!("No realtime subscribers");
        }
    }
}

/// Decides whether an actor may listen to a task room.
#[async_trait]
pub trait RoomGuard: Send + Sync {
    async fn authorize_task_room(&self, actor: &Actor, task_id: Uuid) -> Result<(), String>;
}

#[async_trait]
impl<R: MessageRepository + 'static> RoomGuard for MessageService<R> {
    async fn authorize_task_room(&self, actor: &Actor, task_id: Uuid) -> Result<(), String> {
        self.authorize_room(actor, task_id)
            .await
            .map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom,
    LeaveRoom,
    TypingStart,
    TypingStop,
}

/// Frame sent by the browser. `topic` is a room such as `task:{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub topic: String,
    pub event: ClientEvent,
    #[serde(default)]
    pub payload: Value,
}

/// Frame sent to the browser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerFrame {
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

impl ServerFrame {
    fn reply(topic: impl Into<String>, event: &str) -> Self {
        Self {
            topic: topic.into(),
            event: event.to_string(),
            payload: json!({}),
        }
    }

    fn error(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            event: "error".to_string(),
            payload: json!({ "message": message.into() }),
        }
    }
}

impl From<&RealtimeEvent> for ServerFrame {
    fn from(event: &RealtimeEvent) -> Self {
        Self {
            topic: event.room.to_string(),
            event: event.event.to_string(),
            payload: event.payload.clone(),
        }
    }
}

/// Room membership of one socket.
#[derive(Debug)]
pub struct Session {
    actor: Actor,
    rooms: HashSet<Room>,
}

impl Session {
    /// A new session already listens to the actor's own user room.
    pub fn new(actor: Actor) -> Self {
        Self {
            actor,
            rooms: HashSet::from([Room::User(actor.id)]),
        }
    }

    pub fn is_joined(&self, room: &Room) -> bool {
        self.rooms.contains(room)
    }

    /// Whether `event` should be forwarded to this socket. The sender's own
    /// typing indicators are not echoed back.
    pub fn wants(&self, event: &RealtimeEvent) -> bool {
        if !self.rooms.contains(&event.room) {
            return false;
        }
        match event.event {
            ServerEvent::TypingStart | ServerEvent::TypingStop => {
                event.payload.get("user_id").and_then(Value::as_str)
                    != Some(self.actor.id.to_string().as_str())
            }
            _ => true,
        }
    }

    /// Apply a client frame. Returns the reply to send back, if any.
    pub async fn handle(
        &mut self,
        frame: ClientFrame,
        guard: &dyn RoomGuard,
        publisher: &dyn RealtimePublisher,
    ) -> Option<ServerFrame> {
        let room = match frame.topic.parse::<Room>() {
            Ok(room) => room,
            Err(e) => return Some(ServerFrame::error(frame.topic, e)),
        };

        match frame.event {
            ClientEvent::JoinRoom => Some(self.join(room, &frame.topic, guard).await),
            ClientEvent::LeaveRoom => {
                if room == Room::User(self.actor.id) {
                    return Some(ServerFrame::error(frame.topic, "Cannot leave your own room"));
                }
                self.rooms.remove(&room);
                Some(ServerFrame::reply(frame.topic, "left"))
            }
            ClientEvent::TypingStart | ClientEvent::TypingStop => {
                if !matches!(room, Room::Task(_)) || !self.is_joined(&room) {
                    return Some(ServerFrame::error(
                        frame.topic,
                        "Join the task room before sending typing events",
                    ));
                }
                let event = if frame.event == ClientEvent::TypingStart {
                    ServerEvent::TypingStart
                } else {
                    ServerEvent::TypingStop
                };
                publisher.publish(RealtimeEvent::new(
                    room,
                    event,
                    json!({ "user_id": self.actor.id }),
                ));
                None
            }
        }
    }

    async fn join(&mut self, room: Room, topic: &str, guard: &dyn RoomGuard) -> ServerFrame {
        match room {
            Room::User(id) if id != self.actor.id => {
                ServerFrame::error(topic, "Cannot join another user's room")
            }
            Room::User(_) => ServerFrame::reply(topic, "joined"),
            Room::Task(task_id) => match guard.authorize_task_room(&self.actor, task_id).await {
                Ok(()) => {
                    self.rooms.insert(room);
                    ServerFrame::reply(topic, "joined")
                }
                Err(reason) => ServerFrame::error(topic, reason),
            },
        }
    }
}

struct RealtimeState {
    hub: Arc<RealtimeHub>,
    guard: Arc<dyn RoomGuard>,
}

/// `GET /ws?token=<jwt>`
pub fn router(hub: Arc<RealtimeHub>, guard: Arc<dyn RoomGuard>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(Arc::new(RealtimeState { hub, guard }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    actor: Actor,
    State(state): State<Arc<RealtimeState>>,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, actor, state))
}

async fn run_session(socket: WebSocket, actor: Actor, state: Arc<RealtimeState>) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.hub.subscribe();
    let mut session = Session::new(actor);
    info!(user_id = %actor.id, "Realtime session opened");

    loop {
        let outgoing = tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientFrame>(text.as_str()) {
                        Ok(frame) => {
                            session
                                .handle(frame, state.guard.as_ref(), state.hub.as_ref())
                                .await
                        }
                        Err(e) => Some(ServerFrame::error("", format!("Invalid frame: {}", e))),
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket read failed");
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) if session.wants(&event) => Some(ServerFrame::from(&event)),
                Ok(_) => None,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %actor.id, skipped, "Realtime session lagged");
                    None
                }
                Err(RecvError::Closed) => break,
            },
        };

        if let Some(frame) = outgoing {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode realtime frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    }

    info!(user_id = %actor.id, "Realtime session closed");
}

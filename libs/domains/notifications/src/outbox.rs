//! Side effects produced by domain services.
//!
//! Services never send email, write notification rows or push realtime
//! frames themselves. They return an [`Outcome`] whose [`Outbox`] lists what
//! should happen once the primary change has committed, and the HTTP layer
//! hands that outbox to an [`EffectHandler`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{NewNotification, NotificationType};

/// Realtime room. Task rooms carry chat, user rooms carry notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    Task(Uuid),
    User(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::Task(id) => write!(f, "task:{}", id),
            Room::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid room '{}'", s))?;
        let id = Uuid::parse_str(id).map_err(|_| format!("invalid room id in '{}'", s))?;
        match kind {
            "task" => Ok(Room::Task(id)),
            "user" => Ok(Room::User(id)),
            other => Err(format!("unknown room kind '{}'", other)),
        }
    }
}

/// Events the server pushes to connected sockets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ServerEvent {
    ReceiveMessage,
    NewNotification,
    TypingStart,
    TypingStop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub room: Room,
    pub event: ServerEvent,
    pub payload: serde_json::Value,
}

impl RealtimeEvent {
    pub fn new(room: Room, event: ServerEvent, payload: serde_json::Value) -> Self {
        Self {
            room,
            event,
            payload,
        }
    }

    /// Event carrying `value` as its JSON payload. A value that cannot be
    /// represented as JSON is logged and yields `None` so nothing half-formed
    /// reaches the room.
    pub fn serialize<T: Serialize>(room: Room, event: ServerEvent, value: &T) -> Option<Self> {
        match serde_json::to_value(value) {
            Ok(payload) => Some(Self::new(room, event, payload)),
            Err(e) => {
                tracing::warn!(error = %e, room = %room, event = %event, "Dropping realtime event with unserializable payload");
                None
            }
        }
    }
}

/// Transactional email to render and send.
#[derive(Clone, PartialEq, Eq)]
pub enum EmailJob {
    VerifyEmail {
        to: String,
        name: String,
        otp: String,
        expires_in_minutes: i64,
    },
    PasswordReset {
        to: String,
        name: String,
        otp: String,
        expires_in_minutes: i64,
    },
}

impl EmailJob {
    pub fn recipient(&self) -> &str {
        match self {
            EmailJob::VerifyEmail { to, .. } | EmailJob::PasswordReset { to, .. } => to,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EmailJob::VerifyEmail { .. } => "verify_email",
            EmailJob::PasswordReset { .. } => "password_reset",
        }
    }
}

// OTPs stay out of logs
impl fmt::Debug for EmailJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailJob")
            .field("kind", &self.kind())
            .field("to", &self.recipient())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(NewNotification),
    Email(EmailJob),
    Broadcast(RealtimeEvent),
}

/// Ordered list of effects collected while handling one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outbox {
    effects: Vec<Effect>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification row for `user_id`.
    pub fn notify(
        &mut self,
        user_id: Uuid,
        notification_type: NotificationType,
        message: impl Into<String>,
        url: impl Into<String>,
        task_id: Option<Uuid>,
    ) -> &mut Self {
        self.effects.push(Effect::Notify(NewNotification::new(
            user_id,
            notification_type,
            message,
            url,
            task_id,
        )));
        self
    }

    pub fn email(&mut self, job: EmailJob) -> &mut Self {
        self.effects.push(Effect::Email(job));
        self
    }

    pub fn broadcast(&mut self, event: RealtimeEvent) -> &mut Self {
        self.effects.push(Effect::Broadcast(event));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Notifications queued so far, in order.
    pub fn notifications(&self) -> impl Iterator<Item = &NewNotification> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
    }

    pub fn emails(&self) -> impl Iterator<Item = &EmailJob> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Email(job) => Some(job),
            _ => None,
        })
    }
}

impl IntoIterator for Outbox {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}

/// Result of a mutating service call plus the effects it wants delivered.
#[derive(Debug)]
#[must_use = "the outbox must be handed to an EffectHandler"]
pub struct Outcome<T> {
    pub value: T,
    pub outbox: Outbox,
}

impl<T> Outcome<T> {
    /// Outcome with nothing to deliver.
    pub fn new(value: T) -> Self {
        Self {
            value,
            outbox: Outbox::new(),
        }
    }

    pub fn with_outbox(value: T, outbox: Outbox) -> Self {
        Self { value, outbox }
    }

    pub fn into_parts(self) -> (T, Outbox) {
        (self.value, self.outbox)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            outbox: self.outbox,
        }
    }

    /// Dispatch the outbox and return the value.
    pub async fn deliver(self, handler: &dyn EffectHandler) -> T {
        if !self.outbox.is_empty() {
            handler.dispatch(self.outbox).await;
        }
        self.value
    }
}

/// Executes effects after the primary change has committed.
///
/// Implementations log failures and carry on; nothing is reported back to the
/// caller whose request produced the effects.
#[async_trait]
pub trait EffectHandler: Send + Sync {
    async fn dispatch(&self, outbox: Outbox);
}

/// Keeps every dispatched effect in memory. Used by handler tests.
#[derive(Debug, Default)]
pub struct RecordingEffectHandler {
    effects: Mutex<Vec<Effect>>,
}

impl RecordingEffectHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Effect> {
        match self.effects.lock() {
            Ok(mut effects) => std::mem::take(&mut *effects),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl EffectHandler for RecordingEffectHandler {
    async fn dispatch(&self, outbox: Outbox) {
        match self.effects.lock() {
            Ok(mut effects) => effects.extend(outbox),
            Err(poisoned) => poisoned.into_inner().extend(outbox),
        }
    }
}

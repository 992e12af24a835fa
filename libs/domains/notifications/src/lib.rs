//! Notifications Domain
//!
//! In-app notifications, transactional email and the effect outbox every
//! other domain uses to request side effects.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ Domain Service  │  ← returns Outcome<T> { value, outbox }
//! └────────┬────────┘
//!          │ after commit
//! ┌────────▼────────┐
//! │ EffectDispatcher│  ← EffectHandler implementation
//! └──┬──────┬────┬──┘
//!    │      │    │
//!    ▼      ▼    ▼
//!  rows   email  realtime push
//! (repo) (Mailer) (RealtimePublisher)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{
//!     EffectDispatcher, InMemoryNotificationRepository, LogEmailProvider, Mailer,
//!     NotificationService,
//! };
//!
//! let service = NotificationService::new(InMemoryNotificationRepository::new());
//! let mailer = Mailer::new(Arc::new(LogEmailProvider::new()))?;
//! let dispatcher = EffectDispatcher::new(service.clone(), mailer, hub);
//!
//! let task = tasks.accept_bid(&actor, bid_id).await?.deliver(&dispatcher).await;
//! ```

pub mod dispatcher;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod outbox;
pub mod postgres;
pub mod providers;
pub mod repository;
pub mod service;
pub mod templates;

pub use dispatcher::{EffectDispatcher, RealtimePublisher};
pub use error::{NotificationError, NotificationResult};
pub use mailer::Mailer;
pub use models::{MarkedRead, NewNotification, Notification, NotificationQuery, NotificationType, UnreadCount};
pub use outbox::{
    Effect, EffectHandler, EmailJob, Outbox, Outcome, RealtimeEvent, RecordingEffectHandler, Room,
    ServerEvent,
};
pub use postgres::PgNotificationRepository;
pub use providers::{EmailProvider, LogEmailProvider, SmtpConfig, SmtpProvider};
pub use repository::{InMemoryNotificationRepository, NotificationRepository};
pub use service::NotificationService;
pub use templates::TemplateEngine;

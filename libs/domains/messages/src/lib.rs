//! Messages Domain
//!
//! Per-task conversation between the client and the assigned freelancer.
//! Sending a message notifies the other party and pushes the message to the
//! task's realtime room.

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{MessageError, MessageResult};
pub use models::{CreateMessage, Message, TaskThread};
pub use postgres::PgMessageRepository;
pub use repository::{InMemoryMessageRepository, MessageRepository};
pub use service::MessageService;

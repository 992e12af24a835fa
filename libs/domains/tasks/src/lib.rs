//! Tasks Domain
//!
//! Tasks, bids, milestones and the escrow ledger of the marketplace.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP, audit, effect delivery
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  Services   │  ← Authorization, state rules, Outbox
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Conditional writes, one DB transaction per transition
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs, state machines
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tasks::{
//!     BidService, InProcessGateway, MilestoneService, PgTaskRepository, TaskService,
//! };
//! use std::sync::Arc;
//! use sea_orm::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("postgres://...").await?;
//!
//! let repository = Arc::new(PgTaskRepository::new(db));
//! let tasks = TaskService::from_shared(repository.clone());
//! let bids = BidService::from_shared(repository.clone());
//! let milestones = MilestoneService::from_shared(repository, Arc::new(InProcessGateway::new()));
//! # Ok(())
//! # }
//! ```

pub mod entity;
pub mod error;
pub mod fees;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{TaskError, TaskResult};
pub use fees::{DEFAULT_PLATFORM_FEE_BPS, FeePolicy};
pub use handlers::{ApiDoc, TasksState, router};
pub use models::{
    AcceptBidResponse, AcceptedBid, Bid, BidStatus, CreateBid, CreateMilestones, CreateTask,
    FundingIntent, ListTasksParams, Milestone, MilestoneStatus, NewMilestone, PaymentWebhook,
    RevisionRequest, Task, TaskFilter, TaskQuery, TaskStatus, Transaction, TransactionStatus,
    TransactionType, UpdateTask,
};
pub use payment::{
    InProcessGateway, IntentRequest, PaymentGateway, PaymentIntent, SIGNATURE_HEADER,
    WebhookVerifier,
};
pub use postgres::PgTaskRepository;
pub use repository::{InMemoryTaskRepository, TaskRepository};
pub use service::{BidService, MilestoneService, TaskService};

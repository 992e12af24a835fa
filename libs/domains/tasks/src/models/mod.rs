//! Data models for the tasks domain.

mod bid;
mod ledger;
mod milestone;
mod task;

pub use bid::{AcceptBidResponse, AcceptedBid, Bid, BidStatus, CreateBid};
pub use ledger::{FundingIntent, PaymentWebhook, Transaction, TransactionStatus, TransactionType};
pub use milestone::{
    CreateMilestones, Milestone, MilestoneStatus, MilestoneTransition, NewMilestone,
    RevisionRequest,
};
pub use task::{CreateTask, ListTasksParams, Task, TaskFilter, TaskQuery, TaskStatus, UpdateTask};

use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::task::Task;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "bid_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BidStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCEPTED")]
    Accepted,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// A freelancer's offer on an open task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Bid {
    pub id: Uuid,
    pub task_id: Uuid,
    pub freelancer_id: Uuid,
    /// Minor currency units
    pub amount: i64,
    pub proposal: String,
    pub status: BidStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bid {
    pub fn new(task_id: Uuid, freelancer_id: Uuid, input: CreateBid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            task_id,
            freelancer_id,
            amount: input.amount,
            proposal: input.proposal.trim().to_string(),
            status: BidStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBid {
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    #[validate(length(min = 1, max = 5000))]
    pub proposal: String,
}

/// Everything an accepted bid changed, as committed.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedBid {
    pub task: Task,
    pub accepted: Bid,
    /// Sibling bids flipped from PENDING to REJECTED
    pub rejected: Vec<Bid>,
}

/// Response for `POST /bids/{id}/accept`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AcceptBidResponse {
    pub task: Task,
    pub bid: Bid,
    pub rejected_bids: usize,
}

impl From<AcceptedBid> for AcceptBidResponse {
    fn from(accepted: AcceptedBid) -> Self {
        Self {
            task: accepted.task,
            bid: accepted.accepted,
            rejected_bids: accepted.rejected.len(),
        }
    }
}

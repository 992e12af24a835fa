use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

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
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Client money held for a milestone
    #[sea_orm(string_value = "ESCROW_FUNDING")]
    EscrowFunding,
    /// Milestone amount released to the freelancer on approval
    #[sea_orm(string_value = "ESCROW_RELEASE")]
    EscrowRelease,
    #[sea_orm(string_value = "PLATFORM_FEE")]
    PlatformFee,
    #[sea_orm(string_value = "PAYOUT")]
    Payout,
}

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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SUCCEEDED")]
    Succeeded,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

/// Ledger row. Append-only apart from the one PENDING settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Party the money moves for
    pub user_id: Uuid,
    pub milestone_id: Option<Uuid>,
    /// Minor currency units
    pub amount: i64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub provider_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        task_id: Uuid,
        user_id: Uuid,
        milestone_id: Option<Uuid>,
        amount: i64,
        transaction_type: TransactionType,
        status: TransactionStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            task_id,
            user_id,
            milestone_id,
            amount,
            transaction_type,
            status,
            provider_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.provider_reference = Some(reference.into());
        self
    }

    /// Funding rows that block another funding attempt
    pub fn holds_funds(&self) -> bool {
        self.transaction_type == TransactionType::EscrowFunding
            && self.status != TransactionStatus::Failed
    }
}

/// Returned by `POST /milestones/{id}/fund`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FundingIntent {
    pub transaction: Transaction,
    /// Handed to the payment widget to finish the payment client-side
    pub client_secret: String,
}

/// Payment provider callback
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PaymentWebhook {
    #[validate(length(min = 1, max = 255))]
    pub provider_reference: String,
    pub succeeded: bool,
}

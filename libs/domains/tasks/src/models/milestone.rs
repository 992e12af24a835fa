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
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "milestone_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "SUBMITTED")]
    Submitted,
    #[sea_orm(string_value = "REVISION_REQUESTED")]
    RevisionRequested,
    /// Terminal; the escrow has been released
    #[sea_orm(string_value = "APPROVED")]
    Approved,
}

impl MilestoneStatus {
    pub fn can_transition_to(self, next: MilestoneStatus) -> bool {
        use MilestoneStatus::*;
        matches!(
            (self, next),
            (Pending, Submitted)
                | (RevisionRequested, Submitted)
                | (Submitted, RevisionRequested)
                | (Submitted, Approved)
        )
    }

    /// States `next` may be entered from.
    pub fn sources(next: MilestoneStatus) -> Vec<MilestoneStatus> {
        use strum::IntoEnumIterator;
        MilestoneStatus::iter()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

/// A payable slice of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Milestone {
    pub id: Uuid,
    pub task_id: Uuid,
    pub description: String,
    /// Minor currency units
    pub amount: i64,
    pub due_date: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
    /// Set by the most recent revision request
    pub revision_comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new(task_id: Uuid, input: NewMilestone) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            task_id,
            description: input.description.trim().to_string(),
            amount: input.amount,
            due_date: input.due_date,
            status: MilestoneStatus::Pending,
            revision_comments: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewMilestone {
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 1, message = "amount must be positive"))]
    pub amount: i64,
    pub due_date: Option<DateTime<Utc>>,
}

/// Body for `POST /tasks/{id}/milestones`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMilestones {
    #[validate(length(min = 1, max = 50), nested)]
    pub milestones: Vec<NewMilestone>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RevisionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub comments: String,
}

/// A conditional status change. Applied only while the milestone is in one
/// of `from`.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneTransition {
    pub milestone_id: Uuid,
    pub from: Vec<MilestoneStatus>,
    pub to: MilestoneStatus,
    /// Replaces the stored comments when set
    pub revision_comments: Option<String>,
}

impl MilestoneTransition {
    pub fn to(milestone_id: Uuid, to: MilestoneStatus) -> Self {
        Self {
            milestone_id,
            from: MilestoneStatus::sources(to),
            to,
            revision_comments: None,
        }
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.revision_comments = Some(comments.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MilestoneStatus::*;

    #[test]
    fn test_submit_sources() {
        assert_eq!(MilestoneStatus::sources(Submitted), vec![Pending, RevisionRequested]);
        assert_eq!(MilestoneStatus::sources(Approved), vec![Submitted]);
        assert_eq!(MilestoneStatus::sources(RevisionRequested), vec![Submitted]);
        assert!(MilestoneStatus::sources(Pending).is_empty());
    }

    #[test]
    fn test_approved_is_terminal() {
        for next in [Pending, Submitted, RevisionRequested, Approved] {
            assert!(!Approved.can_transition_to(next));
        }
    }
}

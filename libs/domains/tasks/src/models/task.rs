use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Task status
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
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "task_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepting bids
    #[default]
    #[sea_orm(string_value = "OPEN")]
    Open,
    /// A bid was accepted and work is under way
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    /// The freelancer handed the work over
    #[sea_orm(string_value = "IN_REVIEW")]
    InReview,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl TaskStatus {
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Open, InProgress)
                | (InProgress, InReview)
                | (InReview, Completed)
                | (Open, Cancelled)
                | (InProgress, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Task entity - a unit of work posted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Minor currency units
    pub budget: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub client_id: Uuid,
    /// Set once, when a bid is accepted
    pub freelancer_id: Option<Uuid>,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(client_id: Uuid, input: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title.trim().to_string(),
            description: input.description,
            budget: input.budget,
            deadline: input.deadline,
            status: TaskStatus::Open,
            client_id,
            freelancer_id: None,
            category_id: input.category_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_client(&self, user_id: Uuid) -> bool {
        self.client_id == user_id
    }

    pub fn is_freelancer(&self, user_id: Uuid) -> bool {
        self.freelancer_id == Some(user_id)
    }

    /// Client or assigned freelancer
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.is_client(user_id) || self.is_freelancer(user_id)
    }

    /// The other side of the conversation from `user_id`, if any.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.is_client(user_id) {
            self.freelancer_id
        } else if self.is_freelancer(user_id) {
            Some(self.client_id)
        } else {
            None
        }
    }

    pub fn apply_update(&mut self, update: UpdateTask) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(budget) = update.budget {
            self.budget = budget;
        }
        if let Some(deadline) = update.deadline {
            self.deadline = Some(deadline);
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        self.updated_at = Utc::now();
    }
}

/// DTO for posting a task
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    /// Minor currency units
    #[validate(range(min = 1, message = "budget must be positive"))]
    pub budget: i64,
    pub deadline: Option<DateTime<Utc>>,
    pub category_id: Uuid,
}

/// DTO for editing an open task
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "budget must be positive"))]
    pub budget: Option<i64>,
    pub deadline: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
}

/// One condition on the task listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    Status(TaskStatus),
    Category(Uuid),
    Client(Uuid),
    Freelancer(Uuid),
    MinBudget(i64),
    MaxBudget(i64),
    /// Case-insensitive substring of title or description
    Search(String),
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::Status(status) => task.status == *status,
            TaskFilter::Category(id) => task.category_id == *id,
            TaskFilter::Client(id) => task.client_id == *id,
            TaskFilter::Freelancer(id) => task.freelancer_id == Some(*id),
            TaskFilter::MinBudget(min) => task.budget >= *min,
            TaskFilter::MaxBudget(max) => task.budget <= *max,
            TaskFilter::Search(needle) => {
                let needle = needle.to_lowercase();
                task.title.to_lowercase().contains(&needle)
                    || task.description.to_lowercase().contains(&needle)
            }
        }
    }
}

/// All filters must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filters: Vec<TaskFilter>,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: TaskFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.filters.iter().all(|f| f.matches(task))
    }
}

/// Query string for `GET /tasks`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksParams {
    pub status: Option<TaskStatus>,
    pub category_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub freelancer_id: Option<Uuid>,
    #[validate(range(min = 0))]
    pub min_budget: Option<i64>,
    #[validate(range(min = 0))]
    pub max_budget: Option<i64>,
    /// Substring of the title or description
    #[validate(length(min = 1, max = 200))]
    pub search: Option<String>,
}

impl From<ListTasksParams> for TaskQuery {
    fn from(params: ListTasksParams) -> Self {
        let mut query = TaskQuery::new();
        if let Some(status) = params.status {
            query = query.with(TaskFilter::Status(status));
        }
        if let Some(id) = params.category_id {
            query = query.with(TaskFilter::Category(id));
        }
        if let Some(id) = params.client_id {
            query = query.with(TaskFilter::Client(id));
        }
        if let Some(id) = params.freelancer_id {
            query = query.with(TaskFilter::Freelancer(id));
        }
        if let Some(min) = params.min_budget {
            query = query.with(TaskFilter::MinBudget(min));
        }
        if let Some(max) = params.max_budget {
            query = query.with(TaskFilter::MaxBudget(max));
        }
        if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
            query = query.with(TaskFilter::Search(search.trim().to_string()));
        }
        query
    }
}

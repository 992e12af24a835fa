use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Task category (reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    /// Unique, case-insensitive
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// DTO for renaming a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

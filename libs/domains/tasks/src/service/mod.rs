//! Business rules for tasks, bids and milestones.
//!
//! Every mutating operation authorizes against the caller's [`Actor`], checks
//! the current state for a readable error, then lets the repository perform
//! the conditional write that actually decides the race.

pub mod bids;
pub mod milestones;
pub mod tasks;

pub use bids::BidService;
pub use milestones::MilestoneService;
pub use tasks::TaskService;

use domain_users::Actor;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{Task, TaskStatus};
use crate::repository::TaskRepository;

pub(crate) async fn load_task<R: TaskRepository + ?Sized>(
    repository: &R,
    id: Uuid,
) -> TaskResult<Task> {
    repository.get_task(id).await?.ok_or(TaskError::NotFound(id))
}

pub(crate) fn require_client_of(actor: &Actor, task: &Task, action: &str) -> TaskResult<()> {
    if task.is_client(actor.id) {
        Ok(())
    } else {
        Err(TaskError::Forbidden(format!("Only the task owner can {}", action)))
    }
}

pub(crate) fn require_freelancer_of(actor: &Actor, task: &Task, action: &str) -> TaskResult<()> {
    if task.is_freelancer(actor.id) {
        Ok(())
    } else {
        Err(TaskError::Forbidden(format!(
            "Only the assigned freelancer can {}",
            action
        )))
    }
}

/// Participants and admins may read a task's private records.
pub(crate) fn require_participant(actor: &Actor, task: &Task) -> TaskResult<()> {
    if actor.is_admin() || task.is_participant(actor.id) {
        Ok(())
    } else {
        Err(TaskError::forbidden("You are not a participant of this task"))
    }
}

pub(crate) fn expect_status(task: &Task, expected: TaskStatus) -> TaskResult<()> {
    if task.status == expected {
        Ok(())
    } else {
        Err(TaskError::invalid_state(format!(
            "Task must be {} but is {}",
            expected, task.status
        )))
    }
}

pub(crate) fn task_url(task_id: Uuid) -> String {
    format!("/tasks/{}", task_id)
}

/// Minor units rendered as `units.cents`
pub(crate) fn money(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::models::CreateTask;
    use crate::repository::InMemoryTaskRepository;
    use domain_users::Role;

    pub fn client() -> Actor {
        Actor::new(Uuid::now_v7(), Role::Client)
    }

    pub fn freelancer() -> Actor {
        Actor::new(Uuid::now_v7(), Role::Freelancer)
    }

    pub fn admin() -> Actor {
        Actor::new(Uuid::now_v7(), Role::Admin)
    }

    pub async fn repository_with_category() -> (InMemoryTaskRepository, Uuid) {
        let repository = InMemoryTaskRepository::new();
        let category = Uuid::now_v7();
        repository.add_category(category).await;
        (repository, category)
    }

    pub fn new_task(category_id: Uuid, budget: i64) -> CreateTask {
        CreateTask {
            title: "Build a landing page".into(),
            description: "Static site with a contact form".into(),
            budget,
            deadline: None,
            category_id,
        }
    }
}

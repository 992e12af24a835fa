use axum_helpers::{PageParams, Paginated};
use chrono::Utc;
use domain_notifications::{NotificationType, Outbox, Outcome};
use domain_users::Actor;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{expect_status, load_task, require_client_of, require_freelancer_of, task_url};
use crate::error::{TaskError, TaskResult};
use crate::models::{CreateTask, MilestoneStatus, Task, TaskQuery, TaskStatus, UpdateTask};
use crate::repository::TaskRepository;

/// Task lifecycle: posting, editing and the status machine outside bidding.
pub struct TaskService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> Clone for TaskService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create_task(&self, actor: &Actor, input: CreateTask) -> TaskResult<Task> {
        if !actor.is_client() {
            return Err(TaskError::forbidden("Only clients can post tasks"));
        }
        validate_budget(input.budget)?;
        validate_deadline(input.deadline)?;
        if !self.repository.category_exists(input.category_id).await? {
            return Err(TaskError::CategoryNotFound(input.category_id));
        }

        self.repository.create_task(Task::new(actor.id, input)).await
    }

    #[instrument(skip(self))]
    pub async fn get_task(&self, id: Uuid) -> TaskResult<Task> {
        load_task(self.repository.as_ref(), id).await
    }

    #[instrument(skip(self, query))]
    pub async fn list_tasks(
        &self,
        query: TaskQuery,
        page: PageParams,
    ) -> TaskResult<Paginated<Task>> {
        let (tasks, total) = self.repository.list_tasks(query, page).await?;
        Ok(Paginated::new(tasks, page, total))
    }

    #[instrument(skip(self, changes), fields(actor = %actor.id))]
    pub async fn update_task(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UpdateTask,
    ) -> TaskResult<Task> {
        let mut task = load_task(self.repository.as_ref(), id).await?;
        require_client_of(actor, &task, "edit this task")?;
        expect_status(&task, TaskStatus::Open)?;

        if let Some(budget) = changes.budget {
            validate_budget(budget)?;
        }
        validate_deadline(changes.deadline)?;
        if let Some(category_id) = changes.category_id
            && category_id != task.category_id
            && !self.repository.category_exists(category_id).await?
        {
            return Err(TaskError::CategoryNotFound(category_id));
        }

        task.apply_update(changes);
        self.repository.update_task(task).await
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn delete_task(&self, actor: &Actor, id: Uuid) -> TaskResult<()> {
        let task = load_task(self.repository.as_ref(), id).await?;
        require_client_of(actor, &task, "delete this task")?;
        expect_status(&task, TaskStatus::Open)?;

        if !self.repository.delete_task(id).await? {
            return Err(TaskError::NotFound(id));
        }
        Ok(())
    }

    /// Cancel an OPEN or IN_PROGRESS task. Pending bids on an OPEN task are
    /// rejected along with it.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn cancel_task(&self, actor: &Actor, id: Uuid) -> TaskResult<Outcome<Task>> {
        let task = load_task(self.repository.as_ref(), id).await?;
        require_client_of(actor, &task, "cancel this task")?;
        if !task.status.can_transition_to(TaskStatus::Cancelled) {
            return Err(TaskError::invalid_state(format!(
                "Only open or in-progress tasks can be cancelled; this one is {}",
                task.status
            )));
        }

        let (cancelled, rejected) = self.repository.cancel_task(id, task.status).await?;

        let mut outbox = Outbox::new();
        let url = task_url(id);
        if let Some(freelancer_id) = cancelled.freelancer_id {
            outbox.notify(
                freelancer_id,
                NotificationType::TaskCancelled,
                format!("The client cancelled '{}'", cancelled.title),
                &url,
                Some(id),
            );
        }
        for bid in &rejected {
            outbox.notify(
                bid.freelancer_id,
                NotificationType::BidRejected,
                format!("'{}' was cancelled, so your bid was declined", cancelled.title),
                &url,
                Some(id),
            );
        }

        Ok(Outcome::with_outbox(cancelled, outbox))
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn submit_for_review(&self, actor: &Actor, id: Uuid) -> TaskResult<Outcome<Task>> {
        let task = load_task(self.repository.as_ref(), id).await?;
        require_freelancer_of(actor, &task, "submit this task for review")?;
        expect_status(&task, TaskStatus::InProgress)?;

        let updated = self
            .repository
            .transition_task(id, TaskStatus::InProgress, TaskStatus::InReview)
            .await?;

        let mut outbox = Outbox::new();
        outbox.notify(
            updated.client_id,
            NotificationType::TaskInReview,
            format!("'{}' is ready for your review", updated.title),
            task_url(id),
            Some(id),
        );
        Ok(Outcome::with_outbox(updated, outbox))
    }

    /// IN_REVIEW → COMPLETED once every milestone is approved.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn complete_task(&self, actor: &Actor, id: Uuid) -> TaskResult<Outcome<Task>> {
        let task = load_task(self.repository.as_ref(), id).await?;
        require_client_of(actor, &task, "complete this task")?;
        expect_status(&task, TaskStatus::InReview)?;

        let open = self
            .repository
            .list_milestones(id)
            .await?
            .iter()
            .filter(|m| m.status != MilestoneStatus::Approved)
            .count();
        if open > 0 {
            return Err(TaskError::invalid_state(format!(
                "{} milestone(s) still awaiting approval",
                open
            )));
        }

        let updated = self
            .repository
            .transition_task(id, TaskStatus::InReview, TaskStatus::Completed)
            .await?;

        let mut outbox = Outbox::new();
        if let Some(freelancer_id) = updated.freelancer_id {
            outbox.notify(
                freelancer_id,
                NotificationType::TaskCompleted,
                format!("'{}' has been marked as completed", updated.title),
                task_url(id),
                Some(id),
            );
        }
        Ok(Outcome::with_outbox(updated, outbox))
    }
}

fn validate_budget(budget: i64) -> TaskResult<()> {
    if budget <= 0 {
        return Err(TaskError::Validation("Budget must be positive".to_string()));
    }
    Ok(())
}

fn validate_deadline(deadline: Option<chrono::DateTime<Utc>>) -> TaskResult<()> {
    match deadline {
        Some(at) if at <= Utc::now() => Err(TaskError::Validation(
            "Deadline must be in the future".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bid, CreateBid, Milestone, NewMilestone};
    use crate::repository::{InMemoryTaskRepository, MockTaskRepository};
    use crate::service::fixtures::*;

    type Setup = (
        TaskService<InMemoryTaskRepository>,
        Arc<InMemoryTaskRepository>,
        Uuid,
    );

    async fn setup() -> Setup {
        let (repository, category) = repository_with_category().await;
        let repository = Arc::new(repository);
        (TaskService::from_shared(repository.clone()), repository, category)
    }

    async fn assign(repository: &InMemoryTaskRepository, task: &Task) -> Uuid {
        let freelancer = Uuid::now_v7();
        let bid = repository
            .create_bid(Bid::new(
                task.id,
                freelancer,
                CreateBid {
                    amount: task.budget,
                    proposal: "Happy to help".into(),
                },
            ))
            .await
            .unwrap();
        repository.accept_bid(bid.id).await.unwrap();
        freelancer
    }

    #[tokio::test]
    async fn test_only_clients_post_tasks() {
        let (service, _, category) = setup().await;

        let err = service
            .create_task(&freelancer(), new_task(category, 100))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));

        let task = service.create_task(&client(), new_task(category, 100)).await.unwrap();
        assert_eq!(task.status, TaskStatus::Open);
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let mut mock = MockTaskRepository::new();
        mock.expect_category_exists().returning(|_| Ok(false));
        mock.expect_create_task().never();
        let service = TaskService::new(mock);

        let err = service
            .create_task(&client(), new_task(Uuid::now_v7(), 100))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn test_past_deadline_is_rejected() {
        let (service, _, category) = setup().await;
        let mut input = new_task(category, 100);
        input.deadline = Some(Utc::now() - chrono::Duration::days(1));

        let err = service.create_task(&client(), input).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[tokio::test]
    async fn test_edit_only_by_owner_while_open() {
        let (service, repository, category) = setup().await;
        let owner = client();
        let task = service.create_task(&owner, new_task(category, 100)).await.unwrap();

        let err = service
            .update_task(&client(), task.id, UpdateTask::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));

        let updated = service
            .update_task(
                &owner,
                task.id,
                UpdateTask {
                    budget: Some(250),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.budget, 250);

        assign(&repository, &task).await;
        let err = service
            .update_task(&owner, task.id, UpdateTask::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidState(_)));

        let err = service.delete_task(&owner, task.id).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cancel_open_task_notifies_bidders() {
        let (service, repository, category) = setup().await;
        let owner = client();
        let task = service.create_task(&owner, new_task(category, 100)).await.unwrap();
        let bidder = Uuid::now_v7();
        repository
            .create_bid(Bid::new(
                task.id,
                bidder,
                CreateBid {
                    amount: 90,
                    proposal: "p".into(),
                },
            ))
            .await
            .unwrap();

        let (cancelled, outbox) = service.cancel_task(&owner, task.id).await.unwrap().into_parts();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
        assert_eq!(cancelled.freelancer_id, None);

        let notes: Vec<_> = outbox.notifications().collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, bidder);
        assert_eq!(notes[0].notification_type, NotificationType::BidRejected);

        let err = service.cancel_task(&owner, task.id).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_cancel_in_progress_keeps_freelancer() {
        let (service, repository, category) = setup().await;
        let owner = client();
        let task = service.create_task(&owner, new_task(category, 100)).await.unwrap();
        let freelancer = assign(&repository, &task).await;

        let (cancelled, outbox) = service.cancel_task(&owner, task.id).await.unwrap().into_parts();
        assert_eq!(cancelled.freelancer_id, Some(freelancer));
        let note = outbox.notifications().next().unwrap();
        assert_eq!(note.user_id, freelancer);
        assert_eq!(note.notification_type, NotificationType::TaskCancelled);
    }

    #[tokio::test]
    async fn test_review_and_complete() {
        let (service, repository, category) = setup().await;
        let owner = client();
        let task = service.create_task(&owner, new_task(category, 500)).await.unwrap();
        let freelancer_id = assign(&repository, &task).await;
        let freelancer = Actor::new(freelancer_id, domain_users::Role::Freelancer);

        let err = service.submit_for_review(&owner, task.id).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));

        let milestone = repository
            .create_milestones(
                task.id,
                task.budget,
                vec![Milestone::new(
                    task.id,
                    NewMilestone {
                        description: "All of it".into(),
                        amount: 500,
                        due_date: None,
                    },
                )],
            )
            .await
            .unwrap()
            .remove(0);

        let outcome = service.submit_for_review(&freelancer, task.id).await.unwrap();
        assert_eq!(outcome.value.status, TaskStatus::InReview);
        assert_eq!(
            outcome.outbox.notifications().next().unwrap().user_id,
            owner.id
        );

        let err = service.complete_task(&owner, task.id).await.unwrap_err();
        assert!(err.to_string().contains("1 milestone(s)"));

        repository
            .transition_milestone(crate::models::MilestoneTransition::to(
                milestone.id,
                MilestoneStatus::Submitted,
            ))
            .await
            .unwrap();
        repository.approve_milestone(milestone.id, vec![]).await.unwrap();

        let (done, outbox) = service.complete_task(&owner, task.id).await.unwrap().into_parts();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(
            outbox.notifications().next().unwrap().notification_type,
            NotificationType::TaskCompleted
        );
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let (service, _, category) = setup().await;
        let owner = client();
        for budget in [100, 200, 300] {
            service.create_task(&owner, new_task(category, budget)).await.unwrap();
        }

        let page = service
            .list_tasks(
                TaskQuery::new().with(crate::models::TaskFilter::MinBudget(150)),
                PageParams::new(1, 1),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].budget, 300);
    }
}

use domain_notifications::{NotificationType, Outbox, Outcome};
use domain_users::Actor;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{expect_status, load_task, money, task_url};
use crate::error::{TaskError, TaskResult};
use crate::models::{AcceptedBid, Bid, BidStatus, CreateBid, TaskStatus};
use crate::repository::TaskRepository;

pub struct BidService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> Clone for BidService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: TaskRepository> BidService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    pub fn from_shared(repository: Arc<R>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, input), fields(actor = %actor.id))]
    pub async fn create_bid(
        &self,
        actor: &Actor,
        task_id: Uuid,
        input: CreateBid,
    ) -> TaskResult<Outcome<Bid>> {
        if !actor.is_freelancer() {
            return Err(TaskError::forbidden("Only freelancers can bid on tasks"));
        }
        if input.amount <= 0 {
            return Err(TaskError::Validation("Bid amount must be positive".to_string()));
        }

        let task = load_task(self.repository.as_ref(), task_id).await?;
        if task.status != TaskStatus::Open {
            return Err(TaskError::invalid_state("Task is not open for bidding"));
        }
        if task.is_client(actor.id) {
            return Err(TaskError::forbidden("You cannot bid on your own task"));
        }

        let bid = self
            .repository
            .create_bid(Bid::new(task_id, actor.id, input))
            .await?;

        let mut outbox = Outbox::new();
        outbox.notify(
            task.client_id,
            NotificationType::NewBid,
            format!("New bid of {} on '{}'", money(bid.amount), task.title),
            task_url(task_id),
            Some(task_id),
        );
        Ok(Outcome::with_outbox(bid, outbox))
    }

    /// The client and admins see every bid; a freelancer sees only their own.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn list_bids(&self, actor: &Actor, task_id: Uuid) -> TaskResult<Vec<Bid>> {
        let task = load_task(self.repository.as_ref(), task_id).await?;
        let bids = self.repository.list_bids_for_task(task_id).await?;

        if actor.is_admin() || task.is_client(actor.id) {
            Ok(bids)
        } else if actor.is_freelancer() {
            Ok(bids
                .into_iter()
                .filter(|b| b.freelancer_id == actor.id)
                .collect())
        } else {
            Err(TaskError::forbidden("Only the task owner can view its bids"))
        }
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn list_my_bids(&self, actor: &Actor) -> TaskResult<Vec<Bid>> {
        if !actor.is_freelancer() {
            return Err(TaskError::forbidden("Only freelancers have bids"));
        }
        self.repository.list_bids_by_freelancer(actor.id).await
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn withdraw_bid(&self, actor: &Actor, bid_id: Uuid) -> TaskResult<()> {
        let bid = self.load_bid(bid_id).await?;
        if bid.freelancer_id != actor.id {
            return Err(TaskError::forbidden("You can only withdraw your own bids"));
        }
        if bid.status != BidStatus::Pending {
            return Err(TaskError::invalid_state(format!(
                "Only pending bids can be withdrawn; this one is {}",
                bid.status
            )));
        }
        let task = load_task(self.repository.as_ref(), bid.task_id).await?;
        expect_status(&task, TaskStatus::Open)?;

        if !self.repository.withdraw_bid(bid_id).await? {
            return Err(TaskError::BidNotFound(bid_id));
        }
        tracing::info!(bid_id = %bid_id, task_id = %bid.task_id, "Bid withdrawn");
        Ok(())
    }

    /// Accept one bid. Its siblings are rejected and the task moves to
    /// IN_PROGRESS in the same transaction.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn accept_bid(
        &self,
        actor: &Actor,
        bid_id: Uuid,
    ) -> TaskResult<Outcome<AcceptedBid>> {
        let bid = self.load_bid(bid_id).await?;
        let task = load_task(self.repository.as_ref(), bid.task_id).await?;
        if !task.is_client(actor.id) {
            return Err(TaskError::forbidden("Only the task owner can accept bids"));
        }
        if task.status != TaskStatus::Open {
            return Err(TaskError::invalid_state("Task is not open for bidding"));
        }
        if bid.status != BidStatus::Pending {
            return Err(TaskError::invalid_state(format!(
                "Bid must be PENDING but is {}",
                bid.status
            )));
        }

        let accepted = self.repository.accept_bid(bid_id).await?;

        let url = task_url(task.id);
        let mut outbox = Outbox::new();
        outbox.notify(
            accepted.accepted.freelancer_id,
            NotificationType::BidAccepted,
            format!("Your bid on '{}' was accepted", task.title),
            &url,
            Some(task.id),
        );
        for rejected in &accepted.rejected {
            outbox.notify(
                rejected.freelancer_id,
                NotificationType::BidRejected,
                format!("Your bid on '{}' was not selected", task.title),
                &url,
                Some(task.id),
            );
        }

        Ok(Outcome::with_outbox(accepted, outbox))
    }

    async fn load_bid(&self, id: Uuid) -> TaskResult<Bid> {
        self.repository
            .get_bid(id)
            .await?
            .ok_or(TaskError::BidNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Task;
    use crate::repository::InMemoryTaskRepository;
    use crate::service::TaskService;
    use crate::service::fixtures::*;

    struct Market {
        tasks: TaskService<InMemoryTaskRepository>,
        bids: BidService<InMemoryTaskRepository>,
        client: Actor,
        task: Task,
    }

    async fn market(budget: i64) -> Market {
        let (repository, category) = repository_with_category().await;
        let repository = Arc::new(repository);
        let tasks = TaskService::from_shared(repository.clone());
        let bids = BidService::from_shared(repository);
        let client = client();
        let task = tasks.create_task(&client, new_task(category, budget)).await.unwrap();
        Market {
            tasks,
            bids,
            client,
            task,
        }
    }

    fn offer(amount: i64) -> CreateBid {
        CreateBid {
            amount,
            proposal: "I have done this before".into(),
        }
    }

    #[tokio::test]
    async fn test_accept_scenario() {
        let m = market(500).await;
        let (a, b) = (freelancer(), freelancer());

        let bid_a = m.bids.create_bid(&a, m.task.id, offer(450)).await.unwrap();
        assert_eq!(
            bid_a.outbox.notifications().next().unwrap().user_id,
            m.client.id
        );
        let bid_a = bid_a.value;
        m.bids.create_bid(&b, m.task.id, offer(400)).await.unwrap();

        let (accepted, outbox) = m
            .bids
            .accept_bid(&m.client, bid_a.id)
            .await
            .unwrap()
            .into_parts();
        assert_eq!(accepted.task.status, TaskStatus::InProgress);
        assert_eq!(accepted.task.freelancer_id, Some(a.id));

        let kinds: Vec<_> = outbox
            .notifications()
            .map(|n| (n.user_id, n.notification_type))
            .collect();
        assert_eq!(
            kinds,
            [
                (a.id, NotificationType::BidAccepted),
                (b.id, NotificationType::BidRejected)
            ]
        );

        let all = m.bids.list_bids(&m.client, m.task.id).await.unwrap();
        let accepted_count = all.iter().filter(|b| b.status == BidStatus::Accepted).count();
        assert_eq!(accepted_count, 1);
        assert!(all
            .iter()
            .filter(|b| b.id != bid_a.id)
            .all(|b| b.status == BidStatus::Rejected));

        let task = m.tasks.get_task(m.task.id).await.unwrap();
        assert_eq!(task.freelancer_id, Some(a.id));
    }

    #[tokio::test]
    async fn test_bid_rules() {
        let m = market(500).await;
        let f = freelancer();

        let err = m.bids.create_bid(&m.client, m.task.id, offer(10)).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));

        let err = m.bids.create_bid(&f, m.task.id, offer(0)).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));

        m.bids.create_bid(&f, m.task.id, offer(300)).await.unwrap();
        let err = m.bids.create_bid(&f, m.task.id, offer(250)).await.unwrap_err();
        assert!(matches!(err, TaskError::DuplicateBid));

        let err = m.bids.create_bid(&f, Uuid::now_v7(), offer(250)).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bidding_closes_after_accept() {
        let m = market(500).await;
        let f = freelancer();
        let bid = m.bids.create_bid(&f, m.task.id, offer(300)).await.unwrap().value;
        m.bids.accept_bid(&m.client, bid.id).await.unwrap();

        let err = m
            .bids
            .create_bid(&freelancer(), m.task.id, offer(200))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not open for bidding"));

        let err = m.bids.accept_bid(&m.client, bid.id).await.unwrap_err();
        assert!(matches!(err, TaskError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_only_owner_accepts() {
        let m = market(500).await;
        let f = freelancer();
        let bid = m.bids.create_bid(&f, m.task.id, offer(300)).await.unwrap().value;

        let err = m.bids.accept_bid(&f, bid.id).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));
        let err = m.bids.accept_bid(&client(), bid.id).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_visibility_and_withdraw() {
        let m = market(500).await;
        let (a, b) = (freelancer(), freelancer());
        let bid_a = m.bids.create_bid(&a, m.task.id, offer(300)).await.unwrap().value;
        m.bids.create_bid(&b, m.task.id, offer(200)).await.unwrap();

        assert_eq!(m.bids.list_bids(&m.client, m.task.id).await.unwrap().len(), 2);
        assert_eq!(m.bids.list_bids(&admin(), m.task.id).await.unwrap().len(), 2);
        let own = m.bids.list_bids(&a, m.task.id).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].freelancer_id, a.id);
        assert!(matches!(
            m.bids.list_bids(&client(), m.task.id).await,
            Err(TaskError::Forbidden(_))
        ));

        let err = m.bids.withdraw_bid(&b, bid_a.id).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));
        m.bids.withdraw_bid(&a, bid_a.id).await.unwrap();
        assert!(m.bids.list_my_bids(&a).await.unwrap().is_empty());

        // A withdrawn bid frees the slot for a new one
        m.bids.create_bid(&a, m.task.id, offer(280)).await.unwrap();
        assert_eq!(m.bids.list_my_bids(&a).await.unwrap().len(), 1);
    }
}

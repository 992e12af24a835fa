use async_trait::async_trait;
use axum_helpers::PageParams;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TaskError, TaskResult};
use crate::models::{
    AcceptedBid, Bid, BidStatus, Milestone, MilestoneStatus, MilestoneTransition, Task,
    TaskQuery, TaskStatus, Transaction, TransactionStatus, TransactionType,
};

/// Persistence for tasks and everything hanging off them: bids, milestones
/// and ledger rows.
///
/// Methods that change more than one row are atomic, and their decisive
/// update is conditional on the expected status. Losing that race yields
/// `TaskError::InvalidState`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn category_exists(&self, category_id: Uuid) -> TaskResult<bool>;

    async fn create_task(&self, task: Task) -> TaskResult<Task>;

    async fn get_task(&self, id: Uuid) -> TaskResult<Option<Task>>;

    /// Newest first
    async fn list_tasks(
        &self,
        query: TaskQuery,
        page: PageParams,
    ) -> TaskResult<(Vec<Task>, u64)>;

    /// Save edits to a task that is still OPEN
    async fn update_task(&self, task: Task) -> TaskResult<Task>;

    /// Delete an OPEN task with its bids
    async fn delete_task(&self, id: Uuid) -> TaskResult<bool>;

    /// `from` → `to`, only while the task is still in `from`
    async fn transition_task(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> TaskResult<Task>;

    /// Cancel a task in status `from`. Cancelling an OPEN task also rejects its
    /// pending bids; the rejected bids are returned.
    async fn cancel_task(&self, id: Uuid, from: TaskStatus) -> TaskResult<(Task, Vec<Bid>)>;

    /// Fails with `DuplicateBid` if the freelancer already has a pending bid
    async fn create_bid(&self, bid: Bid) -> TaskResult<Bid>;

    async fn get_bid(&self, id: Uuid) -> TaskResult<Option<Bid>>;

    /// Oldest first
    async fn list_bids_for_task(&self, task_id: Uuid) -> TaskResult<Vec<Bid>>;

    /// Newest first
    async fn list_bids_by_freelancer(&self, freelancer_id: Uuid) -> TaskResult<Vec<Bid>>;

    /// Remove a bid that is still PENDING
    async fn withdraw_bid(&self, id: Uuid) -> TaskResult<bool>;

    /// Accept the bid, reject its siblings and assign the task, all or nothing
    async fn accept_bid(&self, bid_id: Uuid) -> TaskResult<AcceptedBid>;

    /// Insert milestones for an IN_PROGRESS task, keeping the task's total
    /// within `budget`
    async fn create_milestones(
        &self,
        task_id: Uuid,
        budget: i64,
        milestones: Vec<Milestone>,
    ) -> TaskResult<Vec<Milestone>>;

    async fn get_milestone(&self, id: Uuid) -> TaskResult<Option<Milestone>>;

    /// Oldest first
    async fn list_milestones(&self, task_id: Uuid) -> TaskResult<Vec<Milestone>>;

    async fn transition_milestone(&self, change: MilestoneTransition) -> TaskResult<Milestone>;

    /// SUBMITTED → APPROVED plus the given ledger rows, all or nothing
    async fn approve_milestone(
        &self,
        milestone_id: Uuid,
        ledger: Vec<Transaction>,
    ) -> TaskResult<Milestone>;

    async fn create_transaction(&self, transaction: Transaction) -> TaskResult<Transaction>;

    /// Oldest first
    async fn list_transactions(&self, task_id: Uuid) -> TaskResult<Vec<Transaction>>;

    /// ESCROW_FUNDING rows for the milestone that are not FAILED
    async fn active_funding(&self, milestone_id: Uuid) -> TaskResult<Option<Transaction>>;

    /// PENDING → `status` for the row with this provider reference
    async fn settle_transaction(
        &self,
        provider_reference: String,
        status: TransactionStatus,
    ) -> TaskResult<Transaction>;
}

#[derive(Debug, Default)]
struct Store {
    categories: HashSet<Uuid>,
    tasks: HashMap<Uuid, Task>,
    bids: HashMap<Uuid, Bid>,
    milestones: HashMap<Uuid, Milestone>,
    transactions: HashMap<Uuid, Transaction>,
}

impl Store {
    fn task_mut(&mut self, id: Uuid) -> TaskResult<&mut Task> {
        self.tasks.get_mut(&id).ok_or(TaskError::NotFound(id))
    }

    fn check_milestone_work(&self, milestone_id: Uuid) -> TaskResult<()> {
        let milestone = self
            .milestones
            .get(&milestone_id)
            .ok_or(TaskError::MilestoneNotFound(milestone_id))?;
        let task = self
            .tasks
            .get(&milestone.task_id)
            .ok_or(TaskError::NotFound(milestone.task_id))?;
        check_milestone_work(task.status)
    }
}

fn oldest_first<T>(
    items: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (DateTime<Utc>, Uuid),
) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

/// In-memory implementation of TaskRepository (for development/testing).
///
/// Every multi-row operation runs under one write guard.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTaskRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a category id so tasks can reference it
    pub async fn add_category(&self, category_id: Uuid) {
        self.store.write().await.categories.insert(category_id);
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn category_exists(&self, category_id: Uuid) -> TaskResult<bool> {
        Ok(self.store.read().await.categories.contains(&category_id))
    }

    async fn create_task(&self, task: Task) -> TaskResult<Task> {
        let mut store = self.store.write().await;
        if !store.categories.contains(&task.category_id) {
            return Err(TaskError::CategoryNotFound(task.category_id));
        }
        store.tasks.insert(task.id, task.clone());
        tracing::info!(task_id = %task.id, client_id = %task.client_id, "Created task");
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> TaskResult<Option<Task>> {
        Ok(self.store.read().await.tasks.get(&id).cloned())
    }

    async fn list_tasks(
        &self,
        query: TaskQuery,
        page: PageParams,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let store = self.store.read().await;

        let mut matching: Vec<Task> = store
            .tasks
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();

        Ok((items, total))
    }

    async fn update_task(&self, task: Task) -> TaskResult<Task> {
        let mut store = self.store.write().await;
        if !store.categories.contains(&task.category_id) {
            return Err(TaskError::CategoryNotFound(task.category_id));
        }
        let current = store.task_mut(task.id)?;
        if current.status != TaskStatus::Open {
            return Err(TaskError::invalid_state("Only open tasks can be edited"));
        }
        *current = task.clone();
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> TaskResult<bool> {
        let mut store = self.store.write().await;
        match store.tasks.get(&id) {
            None => return Ok(false),
            Some(task) if task.status != TaskStatus::Open => {
                return Err(TaskError::invalid_state("Only open tasks can be deleted"));
            }
            Some(_) => {}
        }

        store.tasks.remove(&id);
        store.bids.retain(|_, b| b.task_id != id);
        store.milestones.retain(|_, m| m.task_id != id);
        store.transactions.retain(|_, t| t.task_id != id);
        Ok(true)
    }

    async fn transition_task(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> TaskResult<Task> {
        let mut store = self.store.write().await;
        let task = store.task_mut(id)?;
        if task.status != from {
            return Err(TaskError::invalid_state(format!(
                "Task must be {} but is {}",
                from, task.status
            )));
        }
        task.status = to;
        task.updated_at = Utc::now();
        Ok(task.clone())
    }

    async fn cancel_task(&self, id: Uuid, from: TaskStatus) -> TaskResult<(Task, Vec<Bid>)> {
        let mut store = self.store.write().await;
        let task = store.task_mut(id)?;
        if task.status != from {
            return Err(TaskError::invalid_state(format!(
                "Task must be {} but is {}",
                from, task.status
            )));
        }
        task.status = TaskStatus::Cancelled;
        task.updated_at = Utc::now();
        let task = task.clone();

        let mut rejected = Vec::new();
        if from == TaskStatus::Open {
            let now = Utc::now();
            for bid in store.bids.values_mut() {
                if bid.task_id == id && bid.status == BidStatus::Pending {
                    bid.status = BidStatus::Rejected;
                    bid.updated_at = now;
                    rejected.push(bid.clone());
                }
            }
        }

        Ok((task, rejected))
    }

    async fn create_bid(&self, bid: Bid) -> TaskResult<Bid> {
        let mut store = self.store.write().await;
        if !store.tasks.contains_key(&bid.task_id) {
            return Err(TaskError::NotFound(bid.task_id));
        }
        let duplicate = store.bids.values().any(|b| {
            b.task_id == bid.task_id
                && b.freelancer_id == bid.freelancer_id
                && b.status == BidStatus::Pending
        });
        if duplicate {
            return Err(TaskError::DuplicateBid);
        }
        store.bids.insert(bid.id, bid.clone());
        Ok(bid)
    }

    async fn get_bid(&self, id: Uuid) -> TaskResult<Option<Bid>> {
        Ok(self.store.read().await.bids.get(&id).cloned())
    }

    async fn list_bids_for_task(&self, task_id: Uuid) -> TaskResult<Vec<Bid>> {
        let store = self.store.read().await;
        Ok(oldest_first(
            store.bids.values().filter(|b| b.task_id == task_id).cloned(),
            |b| (b.created_at, b.id),
        ))
    }

    async fn list_bids_by_freelancer(&self, freelancer_id: Uuid) -> TaskResult<Vec<Bid>> {
        let store = self.store.read().await;
        let mut bids = oldest_first(
            store
                .bids
                .values()
                .filter(|b| b.freelancer_id == freelancer_id)
                .cloned(),
            |b| (b.created_at, b.id),
        );
        bids.reverse();
        Ok(bids)
    }

    async fn withdraw_bid(&self, id: Uuid) -> TaskResult<bool> {
        let mut store = self.store.write().await;
        match store.bids.get(&id) {
            None => Ok(false),
            Some(bid) if bid.status != BidStatus::Pending => Err(TaskError::invalid_state(
                "Only pending bids can be withdrawn",
            )),
            Some(_) => Ok(store.bids.remove(&id).is_some()),
        }
    }

    async fn accept_bid(&self, bid_id: Uuid) -> TaskResult<AcceptedBid> {
        let mut store = self.store.write().await;
        let bid = store
            .bids
            .get(&bid_id)
            .cloned()
            .ok_or(TaskError::BidNotFound(bid_id))?;
        if bid.status != BidStatus::Pending {
            return Err(TaskError::invalid_state("Bid is no longer pending"));
        }

        let now = Utc::now();
        let task = store.task_mut(bid.task_id)?;
        if task.status != TaskStatus::Open {
            return Err(TaskError::invalid_state("Task is not open for bidding"));
        }
        task.status = TaskStatus::InProgress;
        task.freelancer_id = Some(bid.freelancer_id);
        task.updated_at = now;
        let task = task.clone();

        let mut accepted = None;
        let mut rejected = Vec::new();
        for other in store.bids.values_mut().filter(|b| b.task_id == task.id) {
            if other.id == bid_id {
                other.status = BidStatus::Accepted;
                other.updated_at = now;
                accepted = Some(other.clone());
            } else if other.status == BidStatus::Pending {
                other.status = BidStatus::Rejected;
                other.updated_at = now;
                rejected.push(other.clone());
            }
        }

        Ok(AcceptedBid {
            task,
            accepted: accepted.ok_or(TaskError::BidNotFound(bid_id))?,
            rejected,
        })
    }

    async fn create_milestones(
        &self,
        task_id: Uuid,
        budget: i64,
        milestones: Vec<Milestone>,
    ) -> TaskResult<Vec<Milestone>> {
        let mut store = self.store.write().await;
        let task = store.tasks.get(&task_id).ok_or(TaskError::NotFound(task_id))?;
        if task.status != TaskStatus::InProgress {
            return Err(TaskError::invalid_state(
                "Milestones can only be added to tasks in progress",
            ));
        }

        let existing: i64 = store
            .milestones
            .values()
            .filter(|m| m.task_id == task_id)
            .map(|m| m.amount)
            .fold(0i64, i64::saturating_add);
        check_budget(existing, &milestones, budget)?;

        for milestone in &milestones {
            store.milestones.insert(milestone.id, milestone.clone());
        }
        Ok(milestones)
    }

    async fn get_milestone(&self, id: Uuid) -> TaskResult<Option<Milestone>> {
        Ok(self.store.read().await.milestones.get(&id).cloned())
    }

    async fn list_milestones(&self, task_id: Uuid) -> TaskResult<Vec<Milestone>> {
        let store = self.store.read().await;
        Ok(oldest_first(
            store
                .milestones
                .values()
                .filter(|m| m.task_id == task_id)
                .cloned(),
            |m| (m.created_at, m.id),
        ))
    }

    async fn transition_milestone(&self, change: MilestoneTransition) -> TaskResult<Milestone> {
        let mut store = self.store.write().await;
        store.check_milestone_work(change.milestone_id)?;
        let milestone = store
            .milestones
            .get_mut(&change.milestone_id)
            .ok_or(TaskError::MilestoneNotFound(change.milestone_id))?;
        if !change.from.contains(&milestone.status) {
            return Err(milestone_state_error(&change.from, milestone.status));
        }

        milestone.status = change.to;
        if let Some(comments) = change.revision_comments {
            milestone.revision_comments = Some(comments);
        }
        milestone.updated_at = Utc::now();
        Ok(milestone.clone())
    }

    async fn approve_milestone(
        &self,
        milestone_id: Uuid,
        ledger: Vec<Transaction>,
    ) -> TaskResult<Milestone> {
        let mut store = self.store.write().await;
        store.check_milestone_work(milestone_id)?;
        let milestone = store
            .milestones
            .get_mut(&milestone_id)
            .ok_or(TaskError::MilestoneNotFound(milestone_id))?;
        if milestone.status != MilestoneStatus::Submitted {
            return Err(milestone_state_error(
                &[MilestoneStatus::Submitted],
                milestone.status,
            ));
        }
        milestone.status = MilestoneStatus::Approved;
        milestone.updated_at = Utc::now();
        let milestone = milestone.clone();

        for row in ledger {
            store.transactions.insert(row.id, row);
        }
        Ok(milestone)
    }

    async fn create_transaction(&self, transaction: Transaction) -> TaskResult<Transaction> {
        let mut store = self.store.write().await;
        if transaction.transaction_type == TransactionType::EscrowFunding
            && let Some(milestone_id) = transaction.milestone_id
            && store
                .transactions
                .values()
                .any(|t| t.milestone_id == Some(milestone_id) && t.holds_funds())
        {
            return Err(TaskError::invalid_state("Milestone is already funded"));
        }
        store.transactions.insert(transaction.id, transaction.clone());
        Ok(transaction)
    }

    async fn list_transactions(&self, task_id: Uuid) -> TaskResult<Vec<Transaction>> {
        let store = self.store.read().await;
        Ok(oldest_first(
            store
                .transactions
                .values()
                .filter(|t| t.task_id == task_id)
                .cloned(),
            |t| (t.created_at, t.id),
        ))
    }

    async fn active_funding(&self, milestone_id: Uuid) -> TaskResult<Option<Transaction>> {
        let store = self.store.read().await;
        Ok(store
            .transactions
            .values()
            .find(|t| t.milestone_id == Some(milestone_id) && t.holds_funds())
            .cloned())
    }

    async fn settle_transaction(
        &self,
        provider_reference: String,
        status: TransactionStatus,
    ) -> TaskResult<Transaction> {
        let mut store = self.store.write().await;
        let transaction = store
            .transactions
            .values_mut()
            .find(|t| t.provider_reference.as_deref() == Some(provider_reference.as_str()))
            .ok_or_else(|| TaskError::TransactionNotFound(provider_reference.clone()))?;
        if transaction.status != TransactionStatus::Pending {
            return Err(TaskError::invalid_state(format!(
                "Transaction is already {}",
                transaction.status
            )));
        }
        transaction.status = status;
        transaction.updated_at = Utc::now();
        Ok(transaction.clone())
    }
}

/// Rejects a batch that would push the task's milestone total past its budget.
pub(crate) fn check_budget(existing: i64, batch: &[Milestone], budget: i64) -> TaskResult<()> {
    let total = batch
        .iter()
        .try_fold(existing, |acc, m| acc.checked_add(m.amount))
        .ok_or_else(|| TaskError::Validation("Milestone amounts are too large".to_string()))?;
    if total > budget {
        return Err(TaskError::Validation(format!(
            "Milestone total {} exceeds the task budget of {}",
            total, budget
        )));
    }
    Ok(())
}

/// Milestones only move while work on the task is under way. Cancelling a
/// task freezes whatever it has not approved yet.
pub(crate) fn check_milestone_work(task_status: TaskStatus) -> TaskResult<()> {
    match task_status {
        TaskStatus::InProgress | TaskStatus::InReview => Ok(()),
        other => Err(TaskError::invalid_state(format!(
            "Milestones cannot change while the task is {}",
            other
        ))),
    }
}

pub(crate) fn milestone_state_error(
    expected: &[MilestoneStatus],
    actual: MilestoneStatus,
) -> TaskError {
    let expected: Vec<String> = expected.iter().map(ToString::to_string).collect();
    TaskError::invalid_state(format!(
        "Milestone must be {} but is {}",
        expected.join(" or "),
        actual
    ))
}

use async_trait::async_trait;
use axum_helpers::PageParams;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    SqlErr, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity::{bid, milestone, task, transaction},
    error::{TaskError, TaskResult},
    models::{
        AcceptedBid, Bid, BidStatus, Milestone, MilestoneStatus, MilestoneTransition, Task,
        TaskFilter, TaskQuery, TaskStatus, Transaction, TransactionStatus, TransactionType,
    },
    repository::{TaskRepository, check_budget, check_milestone_work, milestone_state_error},
};

#[derive(Clone)]
pub struct PgTaskRepository {
    db: DatabaseConnection,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn apply_query(mut select: Select<task::Entity>, query: &TaskQuery) -> Select<task::Entity> {
    for filter in &query.filters {
        select = match filter {
            TaskFilter::Status(status) => select.filter(task::Column::Status.eq(*status)),
            TaskFilter::Category(id) => select.filter(task::Column::CategoryId.eq(*id)),
            TaskFilter::Client(id) => select.filter(task::Column::ClientId.eq(*id)),
            TaskFilter::Freelancer(id) => select.filter(task::Column::FreelancerId.eq(*id)),
            TaskFilter::MinBudget(min) => select.filter(task::Column::Budget.gte(*min)),
            TaskFilter::MaxBudget(max) => select.filter(task::Column::Budget.lte(*max)),
            TaskFilter::Search(needle) => {
                let pattern = format!("%{}%", needle);
                select.filter(Expr::cust_with_values(
                    "(title ILIKE $1 OR description ILIKE $2)",
                    [pattern.clone(), pattern],
                ))
            }
        };
    }
    select
}

/// Names the missing row behind a foreign key violation on `tasks` by the
/// constraint that fired.
fn task_reference_error(err: DbErr, task: &Task) -> TaskError {
    let Some(SqlErr::ForeignKeyConstraintViolation(detail)) = err.sql_err() else {
        return err.into();
    };
    if detail.contains("fk_tasks_category_id") {
        TaskError::CategoryNotFound(task.category_id)
    } else if detail.contains("fk_tasks_client_id") {
        TaskError::UserNotFound(task.client_id)
    } else if detail.contains("fk_tasks_freelancer_id")
        && let Some(freelancer_id) = task.freelancer_id
    {
        TaskError::UserNotFound(freelancer_id)
    } else {
        err.into()
    }
}

/// Explains why a conditional task update touched no rows.
async fn task_state_error(
    txn: &DatabaseTransaction,
    id: Uuid,
    expected: TaskStatus,
) -> TaskResult<TaskError> {
    let current = task::Entity::find_by_id(id).one(txn).await?;
    Ok(match current {
        None => TaskError::NotFound(id),
        Some(task) => TaskError::invalid_state(format!(
            "Task must be {} but is {}",
            expected, task.status
        )),
    })
}

async fn milestone_miss(
    txn: &DatabaseTransaction,
    id: Uuid,
    expected: &[MilestoneStatus],
) -> TaskResult<TaskError> {
    let current = milestone::Entity::find_by_id(id).one(txn).await?;
    Ok(match current {
        None => TaskError::MilestoneNotFound(id),
        Some(m) => milestone_state_error(expected, m.status),
    })
}

/// Holds the parent task row for the rest of the transaction so a
/// concurrent cancel cannot slip between the check and the milestone update.
async fn lock_milestone_task(txn: &DatabaseTransaction, milestone_id: Uuid) -> TaskResult<()> {
    let milestone = milestone::Entity::find_by_id(milestone_id)
        .one(txn)
        .await?
        .ok_or(TaskError::MilestoneNotFound(milestone_id))?;
    let task = task::Entity::find_by_id(milestone.task_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(TaskError::NotFound(milestone.task_id))?;
    check_milestone_work(task.status)
}

fn status_in(column: milestone::Column, statuses: &[MilestoneStatus]) -> Condition {
    statuses
        .iter()
        .fold(Condition::any(), |cond, status| cond.add(column.eq(*status)))
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn category_exists(&self, category_id: Uuid) -> TaskResult<bool> {
        let row = self
            .db
            .query_one_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT 1 AS one FROM categories WHERE id = $1",
                [category_id.into()],
            ))
            .await?;
        Ok(row.is_some())
    }

    async fn create_task(&self, task: Task) -> TaskResult<Task> {
        let model = task::Entity::insert(task::ActiveModel::from(task.clone()))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| task_reference_error(e, &task))?;

        tracing::info!(task_id = %model.id, client_id = %model.client_id, "Created task");
        Ok(model.into())
    }

    async fn get_task(&self, id: Uuid) -> TaskResult<Option<Task>> {
        let model = task::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list_tasks(
        &self,
        query: TaskQuery,
        page: PageParams,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let select = apply_query(task::Entity::find(), &query);
        let total = select.clone().count(&self.db).await?;

        let models = select
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .limit(page.limit)
            .offset(page.offset())
            .all(&self.db)
            .await?;

        Ok((models.into_iter().map(Into::into).collect(), total))
    }

    async fn update_task(&self, task: Task) -> TaskResult<Task> {
        let id = task.id;
        let txn = self.db.begin().await?;

        let updated = task::Entity::update_many()
            .set(task::ActiveModel::from(task.clone()))
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::Open))
            .exec_with_returning(&txn)
            .await
            .map_err(|e| task_reference_error(e, &task))?;

        let Some(model) = updated.into_iter().next() else {
            return Err(task_state_error(&txn, id, TaskStatus::Open).await?);
        };
        txn.commit().await?;
        Ok(model.into())
    }

    async fn delete_task(&self, id: Uuid) -> TaskResult<bool> {
        let txn = self.db.begin().await?;

        // Bids, milestones and ledger rows go with the task (ON DELETE CASCADE)
        let result = task::Entity::delete_many()
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::Open))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return match task_state_error(&txn, id, TaskStatus::Open).await? {
                TaskError::NotFound(_) => Ok(false),
                err => Err(err),
            };
        }

        txn.commit().await?;
        tracing::info!(task_id = %id, "Deleted task");
        Ok(true)
    }

    async fn transition_task(
        &self,
        id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
    ) -> TaskResult<Task> {
        let txn = self.db.begin().await?;

        let updated = task::Entity::update_many()
            .col_expr(task::Column::Status, to.as_enum())
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(from))
            .exec_with_returning(&txn)
            .await?;

        let Some(model) = updated.into_iter().next() else {
            return Err(task_state_error(&txn, id, from).await?);
        };
        txn.commit().await?;

        tracing::info!(task_id = %id, from = %from, to = %to, "Task status changed");
        Ok(model.into())
    }

    async fn cancel_task(&self, id: Uuid, from: TaskStatus) -> TaskResult<(Task, Vec<Bid>)> {
        let txn = self.db.begin().await?;

        let updated = task::Entity::update_many()
            .col_expr(task::Column::Status, TaskStatus::Cancelled.as_enum())
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(from))
            .exec_with_returning(&txn)
            .await?;

        let Some(model) = updated.into_iter().next() else {
            return Err(task_state_error(&txn, id, from).await?);
        };

        let rejected = if from == TaskStatus::Open {
            bid::Entity::update_many()
                .col_expr(bid::Column::Status, BidStatus::Rejected.as_enum())
                .filter(bid::Column::TaskId.eq(id))
                .filter(bid::Column::Status.eq(BidStatus::Pending))
                .exec_with_returning(&txn)
                .await?
        } else {
            Vec::new()
        };

        txn.commit().await?;
        tracing::info!(task_id = %id, from = %from, rejected = rejected.len(), "Task cancelled");

        Ok((
            model.into(),
            rejected.into_iter().map(Into::into).collect(),
        ))
    }

    async fn create_bid(&self, bid: Bid) -> TaskResult<Bid> {
        let task_id = bid.task_id;
        let model = bid::Entity::insert(bid::ActiveModel::from(bid))
            .exec_with_returning(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => TaskError::DuplicateBid,
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => TaskError::NotFound(task_id),
                _ => e.into(),
            })?;

        tracing::info!(bid_id = %model.id, task_id = %model.task_id, "Created bid");
        Ok(model.into())
    }

    async fn get_bid(&self, id: Uuid) -> TaskResult<Option<Bid>> {
        let model = bid::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list_bids_for_task(&self, task_id: Uuid) -> TaskResult<Vec<Bid>> {
        let models = bid::Entity::find()
            .filter(bid::Column::TaskId.eq(task_id))
            .order_by_asc(bid::Column::CreatedAt)
            .order_by_asc(bid::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_bids_by_freelancer(&self, freelancer_id: Uuid) -> TaskResult<Vec<Bid>> {
        let models = bid::Entity::find()
            .filter(bid::Column::FreelancerId.eq(freelancer_id))
            .order_by_desc(bid::Column::CreatedAt)
            .order_by_desc(bid::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn withdraw_bid(&self, id: Uuid) -> TaskResult<bool> {
        let result = bid::Entity::delete_many()
            .filter(bid::Column::Id.eq(id))
            .filter(bid::Column::Status.eq(BidStatus::Pending))
            .exec(&self.db)
            .await?;
        if result.rows_affected > 0 {
            return Ok(true);
        }

        match bid::Entity::find_by_id(id).one(&self.db).await? {
            None => Ok(false),
            Some(_) => Err(TaskError::invalid_state("Only pending bids can be withdrawn")),
        }
    }

    async fn accept_bid(&self, bid_id: Uuid) -> TaskResult<AcceptedBid> {
        let txn = self.db.begin().await?;

        let bid = bid::Entity::find_by_id(bid_id)
            .one(&txn)
            .await?
            .ok_or(TaskError::BidNotFound(bid_id))?;
        if bid.status != BidStatus::Pending {
            return Err(TaskError::invalid_state("Bid is no longer pending"));
        }

        // Decisive step: only one accept can move the task out of OPEN
        let task = task::Entity::update_many()
            .col_expr(task::Column::Status, TaskStatus::InProgress.as_enum())
            .col_expr(task::Column::FreelancerId, Expr::value(bid.freelancer_id))
            .filter(task::Column::Id.eq(bid.task_id))
            .filter(task::Column::Status.eq(TaskStatus::Open))
            .exec_with_returning(&txn)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::invalid_state("Task is not open for bidding"))?;

        let accepted = bid::Entity::update_many()
            .col_expr(bid::Column::Status, BidStatus::Accepted.as_enum())
            .filter(bid::Column::Id.eq(bid_id))
            .filter(bid::Column::Status.eq(BidStatus::Pending))
            .exec_with_returning(&txn)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TaskError::invalid_state("Bid is no longer pending"))?;

        let rejected = bid::Entity::update_many()
            .col_expr(bid::Column::Status, BidStatus::Rejected.as_enum())
            .filter(bid::Column::TaskId.eq(task.id))
            .filter(bid::Column::Id.ne(bid_id))
            .filter(bid::Column::Status.eq(BidStatus::Pending))
            .exec_with_returning(&txn)
            .await?;

        txn.commit().await?;

        tracing::info!(
            bid_id = %bid_id,
            task_id = %task.id,
            freelancer_id = %accepted.freelancer_id,
            rejected = rejected.len(),
            "Bid accepted"
        );

        Ok(AcceptedBid {
            task: task.into(),
            accepted: accepted.into(),
            rejected: rejected.into_iter().map(Into::into).collect(),
        })
    }

    async fn create_milestones(
        &self,
        task_id: Uuid,
        budget: i64,
        milestones: Vec<Milestone>,
    ) -> TaskResult<Vec<Milestone>> {
        let txn = self.db.begin().await?;

        // Row lock serializes concurrent batches for the same task
        let task = task::Entity::find_by_id(task_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(TaskError::NotFound(task_id))?;
        if task.status != TaskStatus::InProgress {
            return Err(TaskError::invalid_state(
                "Milestones can only be added to tasks in progress",
            ));
        }

        let amounts: Vec<i64> = milestone::Entity::find()
            .select_only()
            .column(milestone::Column::Amount)
            .filter(milestone::Column::TaskId.eq(task_id))
            .into_tuple()
            .all(&txn)
            .await?;
        let existing = amounts.iter().fold(0i64, |acc, a| acc.saturating_add(*a));
        check_budget(existing, &milestones, budget)?;

        milestone::Entity::insert_many(milestones.iter().cloned().map(milestone::ActiveModel::from))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        tracing::info!(task_id = %task_id, count = milestones.len(), "Created milestones");
        Ok(milestones)
    }

    async fn get_milestone(&self, id: Uuid) -> TaskResult<Option<Milestone>> {
        let model = milestone::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list_milestones(&self, task_id: Uuid) -> TaskResult<Vec<Milestone>> {
        let models = milestone::Entity::find()
            .filter(milestone::Column::TaskId.eq(task_id))
            .order_by_asc(milestone::Column::CreatedAt)
            .order_by_asc(milestone::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn transition_milestone(&self, change: MilestoneTransition) -> TaskResult<Milestone> {
        let txn = self.db.begin().await?;
        lock_milestone_task(&txn, change.milestone_id).await?;

        let mut update = milestone::Entity::update_many()
            .col_expr(milestone::Column::Status, change.to.as_enum())
            .filter(milestone::Column::Id.eq(change.milestone_id))
            .filter(status_in(milestone::Column::Status, &change.from));
        if let Some(comments) = change.revision_comments {
            update = update.col_expr(milestone::Column::RevisionComments, Expr::value(comments));
        }

        let Some(model) = update.exec_with_returning(&txn).await?.into_iter().next() else {
            return Err(milestone_miss(&txn, change.milestone_id, &change.from).await?);
        };
        txn.commit().await?;

        tracing::info!(milestone_id = %model.id, status = %model.status, "Milestone status changed");
        Ok(model.into())
    }

    async fn approve_milestone(
        &self,
        milestone_id: Uuid,
        ledger: Vec<Transaction>,
    ) -> TaskResult<Milestone> {
        let txn = self.db.begin().await?;
        lock_milestone_task(&txn, milestone_id).await?;

        let Some(model) = milestone::Entity::update_many()
            .col_expr(milestone::Column::Status, MilestoneStatus::Approved.as_enum())
            .filter(milestone::Column::Id.eq(milestone_id))
            .filter(milestone::Column::Status.eq(MilestoneStatus::Submitted))
            .exec_with_returning(&txn)
            .await?
            .into_iter()
            .next()
        else {
            return Err(milestone_miss(&txn, milestone_id, &[MilestoneStatus::Submitted]).await?);
        };

        if !ledger.is_empty() {
            transaction::Entity::insert_many(ledger.into_iter().map(transaction::ActiveModel::from))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        tracing::info!(milestone_id = %milestone_id, amount = model.amount, "Milestone approved");
        Ok(model.into())
    }

    async fn create_transaction(&self, row: Transaction) -> TaskResult<Transaction> {
        let txn = self.db.begin().await?;

        if row.transaction_type == TransactionType::EscrowFunding
            && let Some(milestone_id) = row.milestone_id
        {
            milestone::Entity::find_by_id(milestone_id)
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or(TaskError::MilestoneNotFound(milestone_id))?;
            if find_active_funding(&txn, milestone_id).await?.is_some() {
                return Err(TaskError::invalid_state("Milestone is already funded"));
            }
        }

        let model = transaction::Entity::insert(transaction::ActiveModel::from(row))
            .exec_with_returning(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(
            transaction_id = %model.id,
            kind = %model.transaction_type,
            amount = model.amount,
            "Recorded transaction"
        );
        Ok(model.into())
    }

    async fn list_transactions(&self, task_id: Uuid) -> TaskResult<Vec<Transaction>> {
        let models = transaction::Entity::find()
            .filter(transaction::Column::TaskId.eq(task_id))
            .order_by_asc(transaction::Column::CreatedAt)
            .order_by_asc(transaction::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn active_funding(&self, milestone_id: Uuid) -> TaskResult<Option<Transaction>> {
        let txn = self.db.begin().await?;
        let found = find_active_funding(&txn, milestone_id).await?;
        txn.commit().await?;
        Ok(found)
    }

    async fn settle_transaction(
        &self,
        provider_reference: String,
        status: TransactionStatus,
    ) -> TaskResult<Transaction> {
        let txn = self.db.begin().await?;

        let updated = transaction::Entity::update_many()
            .col_expr(transaction::Column::Status, status.as_enum())
            .filter(transaction::Column::ProviderReference.eq(provider_reference.as_str()))
            .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
            .exec_with_returning(&txn)
            .await?;

        let Some(model) = updated.into_iter().next() else {
            let current = transaction::Entity::find()
                .filter(transaction::Column::ProviderReference.eq(provider_reference.as_str()))
                .one(&txn)
                .await?;
            return Err(match current {
                None => TaskError::TransactionNotFound(provider_reference),
                Some(row) => {
                    TaskError::invalid_state(format!("Transaction is already {}", row.status))
                }
            });
        };

        txn.commit().await?;
        tracing::info!(
            transaction_id = %model.id,
            reference = %provider_reference,
            status = %model.status,
            "Transaction settled"
        );
        Ok(model.into())
    }
}

async fn find_active_funding(
    txn: &DatabaseTransaction,
    milestone_id: Uuid,
) -> TaskResult<Option<Transaction>> {
    let model = transaction::Entity::find()
        .filter(transaction::Column::MilestoneId.eq(milestone_id))
        .filter(transaction::Column::TransactionType.eq(TransactionType::EscrowFunding))
        .filter(transaction::Column::Status.ne(TransactionStatus::Failed))
        .one(txn)
        .await?;
    Ok(model.map(Into::into))
}

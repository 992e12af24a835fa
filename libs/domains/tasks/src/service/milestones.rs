use domain_notifications::{NotificationType, Outbox, Outcome};
use domain_users::Actor;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{
    expect_status, load_task, money, require_client_of, require_freelancer_of,
    require_participant, task_url,
};
use crate::error::{TaskError, TaskResult};
use crate::fees::FeePolicy;
use crate::models::{
    CreateMilestones, FundingIntent, Milestone, MilestoneStatus, MilestoneTransition, Task,
    TaskStatus, Transaction, TransactionStatus, TransactionType,
};
use crate::payment::{IntentRequest, PaymentGateway};
use crate::repository::{
    TaskRepository, check_budget, check_milestone_work, milestone_state_error,
};

/// Milestones, escrow funding and the payment ledger.
pub struct MilestoneService<R: TaskRepository> {
    repository: Arc<R>,
    gateway: Arc<dyn PaymentGateway>,
    fees: FeePolicy,
}

impl<R: TaskRepository> Clone for MilestoneService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            gateway: Arc::clone(&self.gateway),
            fees: self.fees,
        }
    }
}

impl<R: TaskRepository> MilestoneService<R> {
    pub fn new(repository: R, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::from_shared(Arc::new(repository), gateway)
    }

    pub fn from_shared(repository: Arc<R>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            repository,
            gateway,
            fees: FeePolicy::default(),
        }
    }

    pub fn with_fee_policy(mut self, fees: FeePolicy) -> Self {
        self.fees = fees;
        self
    }

    pub fn fee_policy(&self) -> FeePolicy {
        self.fees
    }

    #[instrument(skip(self, input), fields(actor = %actor.id, count = input.milestones.len()))]
    pub async fn create_milestones(
        &self,
        actor: &Actor,
        task_id: Uuid,
        input: CreateMilestones,
    ) -> TaskResult<Outcome<Vec<Milestone>>> {
        let task = load_task(self.repository.as_ref(), task_id).await?;
        require_client_of(actor, &task, "add milestones")?;
        expect_status(&task, TaskStatus::InProgress)?;

        if input.milestones.is_empty() {
            return Err(TaskError::Validation(
                "At least one milestone is required".to_string(),
            ));
        }
        if input.milestones.iter().any(|m| m.amount <= 0) {
            return Err(TaskError::Validation(
                "Milestone amounts must be positive".to_string(),
            ));
        }

        let batch: Vec<Milestone> = input
            .milestones
            .into_iter()
            .map(|m| Milestone::new(task_id, m))
            .collect();
        let existing: i64 = self
            .repository
            .list_milestones(task_id)
            .await?
            .iter()
            .fold(0i64, |acc, m| acc.saturating_add(m.amount));
        check_budget(existing, &batch, task.budget)?;

        let created = self
            .repository
            .create_milestones(task_id, task.budget, batch)
            .await?;

        let mut outbox = Outbox::new();
        if let Some(freelancer_id) = task.freelancer_id {
            outbox.notify(
                freelancer_id,
                NotificationType::MilestonesCreated,
                format!("{} milestone(s) were added to '{}'", created.len(), task.title),
                task_url(task_id),
                Some(task_id),
            );
        }
        Ok(Outcome::with_outbox(created, outbox))
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn list_milestones(
        &self,
        actor: &Actor,
        task_id: Uuid,
    ) -> TaskResult<Vec<Milestone>> {
        let task = load_task(self.repository.as_ref(), task_id).await?;
        require_participant(actor, &task)?;
        self.repository.list_milestones(task_id).await
    }

    /// PENDING or REVISION_REQUESTED → SUBMITTED
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn submit_milestone(
        &self,
        actor: &Actor,
        milestone_id: Uuid,
    ) -> TaskResult<Outcome<Milestone>> {
        let (milestone, task) = self.load(milestone_id).await?;
        require_freelancer_of(actor, &task, "submit milestones")?;
        check_milestone_work(task.status)?;
        expect_transition(&milestone, MilestoneStatus::Submitted)?;

        let updated = self
            .repository
            .transition_milestone(MilestoneTransition::to(
                milestone_id,
                MilestoneStatus::Submitted,
            ))
            .await?;

        let mut outbox = Outbox::new();
        outbox.notify(
            task.client_id,
            NotificationType::MilestoneSubmitted,
            format!(
                "Milestone '{}' on '{}' was submitted for approval",
                updated.description, task.title
            ),
            task_url(task.id),
            Some(task.id),
        );
        Ok(Outcome::with_outbox(updated, outbox))
    }

    #[instrument(skip(self, comments), fields(actor = %actor.id))]
    pub async fn request_revision(
        &self,
        actor: &Actor,
        milestone_id: Uuid,
        comments: &str,
    ) -> TaskResult<Outcome<Milestone>> {
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(TaskError::Validation(
                "Revision comments are required".to_string(),
            ));
        }

        let (milestone, task) = self.load(milestone_id).await?;
        require_client_of(actor, &task, "request revisions")?;
        check_milestone_work(task.status)?;
        expect_transition(&milestone, MilestoneStatus::RevisionRequested)?;

        let updated = self
            .repository
            .transition_milestone(
                MilestoneTransition::to(milestone_id, MilestoneStatus::RevisionRequested)
                    .with_comments(comments),
            )
            .await?;

        let mut outbox = Outbox::new();
        if let Some(freelancer_id) = task.freelancer_id {
            outbox.notify(
                freelancer_id,
                NotificationType::RevisionRequested,
                format!("Revision requested on '{}': {}", updated.description, comments),
                task_url(task.id),
                Some(task.id),
            );
        }
        Ok(Outcome::with_outbox(updated, outbox))
    }

    /// SUBMITTED → APPROVED, releasing the escrow to the freelancer and
    /// booking the platform fee in the same transaction.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn approve_milestone(
        &self,
        actor: &Actor,
        milestone_id: Uuid,
    ) -> TaskResult<Outcome<Milestone>> {
        let (milestone, task) = self.load(milestone_id).await?;
        require_client_of(actor, &task, "approve milestones")?;
        check_milestone_work(task.status)?;
        expect_transition(&milestone, MilestoneStatus::Approved)?;
        let freelancer_id = task
            .freelancer_id
            .ok_or_else(|| TaskError::invalid_state("Task has no assigned freelancer"))?;

        let fee = self.fees.fee_for(milestone.amount);
        let ledger = vec![
            Transaction::new(
                task.id,
                freelancer_id,
                Some(milestone_id),
                milestone.amount,
                TransactionType::EscrowRelease,
                TransactionStatus::Succeeded,
            ),
            Transaction::new(
                task.id,
                freelancer_id,
                Some(milestone_id),
                fee,
                TransactionType::PlatformFee,
                TransactionStatus::Succeeded,
            ),
        ];

        let approved = self
            .repository
            .approve_milestone(milestone_id, ledger)
            .await?;

        let mut outbox = Outbox::new();
        outbox.notify(
            freelancer_id,
            NotificationType::PaymentReleased,
            format!(
                "Payment of {} released for '{}' (platform fee {})",
                money(approved.amount),
                approved.description,
                money(fee)
            ),
            task_url(task.id),
            Some(task.id),
        );
        Ok(Outcome::with_outbox(approved, outbox))
    }

    /// Start escrow funding with the payment provider. The returned client
    /// secret completes the payment client-side; the webhook settles it.
    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn fund_milestone(
        &self,
        actor: &Actor,
        milestone_id: Uuid,
    ) -> TaskResult<FundingIntent> {
        let (milestone, task) = self.load(milestone_id).await?;
        require_client_of(actor, &task, "fund milestones")?;
        check_milestone_work(task.status)?;
        if milestone.status == MilestoneStatus::Approved {
            return Err(TaskError::invalid_state("Milestone is already approved"));
        }
        if self.repository.active_funding(milestone_id).await?.is_some() {
            return Err(TaskError::invalid_state("Milestone is already funded"));
        }

        let intent = self
            .gateway
            .create_intent(IntentRequest {
                task_id: task.id,
                milestone_id,
                payer_id: actor.id,
                amount: milestone.amount,
            })
            .await?;

        let transaction = self
            .repository
            .create_transaction(
                Transaction::new(
                    task.id,
                    actor.id,
                    Some(milestone_id),
                    milestone.amount,
                    TransactionType::EscrowFunding,
                    TransactionStatus::Pending,
                )
                .with_reference(intent.reference),
            )
            .await?;

        Ok(FundingIntent {
            transaction,
            client_secret: intent.client_secret,
        })
    }

    /// Payment provider callback. Settles a PENDING row exactly once.
    #[instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        provider_reference: &str,
        succeeded: bool,
    ) -> TaskResult<Outcome<Transaction>> {
        let status = if succeeded {
            TransactionStatus::Succeeded
        } else {
            TransactionStatus::Failed
        };
        let settled = self
            .repository
            .settle_transaction(provider_reference.to_string(), status)
            .await?;

        let (kind, message) = if succeeded {
            (
                NotificationType::PaymentConfirmed,
                format!("Your payment of {} was confirmed", money(settled.amount)),
            )
        } else {
            (
                NotificationType::PaymentFailed,
                format!("Your payment of {} failed", money(settled.amount)),
            )
        };

        let mut outbox = Outbox::new();
        outbox.notify(
            settled.user_id,
            kind,
            message,
            task_url(settled.task_id),
            Some(settled.task_id),
        );
        Ok(Outcome::with_outbox(settled, outbox))
    }

    #[instrument(skip(self), fields(actor = %actor.id))]
    pub async fn transactions_for_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
    ) -> TaskResult<Vec<Transaction>> {
        let task = load_task(self.repository.as_ref(), task_id).await?;
        require_participant(actor, &task)?;
        self.repository.list_transactions(task_id).await
    }

    async fn load(&self, milestone_id: Uuid) -> TaskResult<(Milestone, Task)> {
        let milestone = self
            .repository
            .get_milestone(milestone_id)
            .await?
            .ok_or(TaskError::MilestoneNotFound(milestone_id))?;
        let task = load_task(self.repository.as_ref(), milestone.task_id).await?;
        Ok((milestone, task))
    }
}

fn expect_transition(milestone: &Milestone, next: MilestoneStatus) -> TaskResult<()> {
    if milestone.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(milestone_state_error(
            &MilestoneStatus::sources(next),
            milestone.status,
        ))
    }
}

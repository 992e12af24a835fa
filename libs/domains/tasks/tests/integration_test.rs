//! PostgreSQL integration tests for the tasks repository.
//!
//! Requires Docker (testcontainers).

use domain_tasks::models::MilestoneTransition;
use domain_tasks::*;
use domain_users::{Actor, Role};
use std::sync::Arc;
use test_utils::TestDatabase;
use uuid::Uuid;

struct Fixture {
    db: TestDatabase,
    repository: Arc<PgTaskRepository>,
    client: Actor,
    category: Uuid,
}

async fn fixture() -> Fixture {
    let db = TestDatabase::new().await;
    let client = Actor::new(db.seed_user(Uuid::now_v7(), "CLIENT").await, Role::Client);
    let category = db.seed_category(Uuid::now_v7(), "Web").await;
    let repository = Arc::new(PgTaskRepository::new(db.connection()));
    Fixture {
        db,
        repository,
        client,
        category,
    }
}

impl Fixture {
    async fn freelancer(&self) -> Actor {
        Actor::new(
            self.db.seed_user(Uuid::now_v7(), "FREELANCER").await,
            Role::Freelancer,
        )
    }

    async fn open_task(&self, budget: i64) -> Task {
        TaskService::from_shared(self.repository.clone())
            .create_task(
                &self.client,
                CreateTask {
                    title: "Checkout flow".into(),
                    description: "Cart, payment and receipt pages".into(),
                    budget,
                    deadline: None,
                    category_id: self.category,
                },
            )
            .await
            .unwrap()
    }

    async fn bid(&self, task: &Task, freelancer: &Actor, amount: i64) -> Bid {
        BidService::from_shared(self.repository.clone())
            .create_bid(
                freelancer,
                task.id,
                CreateBid {
                    amount,
                    proposal: "Shipped three of these".into(),
                },
            )
            .await
            .unwrap()
            .value
    }
}

#[tokio::test]
async fn test_accept_bid_is_atomic() {
    let f = fixture().await;
    let alice = f.freelancer().await;
    let bob = f.freelancer().await;
    let task = f.open_task(500).await;
    let a = f.bid(&task, &alice, 450).await;
    let b = f.bid(&task, &bob, 400).await;

    let bids = BidService::from_shared(f.repository.clone());
    let accepted = bids.accept_bid(&f.client, a.id).await.unwrap().value;
    assert_eq!(accepted.task.status, TaskStatus::InProgress);
    assert_eq!(accepted.task.freelancer_id, Some(alice.id));
    assert_eq!(accepted.rejected.len(), 1);

    let stored = f.repository.list_bids_for_task(task.id).await.unwrap();
    let accepted_count = stored
        .iter()
        .filter(|bid| bid.status == BidStatus::Accepted)
        .count();
    assert_eq!(accepted_count, 1);
    let loser = stored.iter().find(|bid| bid.id == b.id).unwrap();
    assert_eq!(loser.status, BidStatus::Rejected);

    // The task is no longer OPEN so the losing bid cannot win a second race
    let err = f.repository.accept_bid(b.id).await.unwrap_err();
    assert!(matches!(err, TaskError::InvalidState(_)));
}

#[tokio::test]
async fn test_duplicate_pending_bid_hits_unique_index() {
    let f = fixture().await;
    let freelancer = f.freelancer().await;
    let task = f.open_task(300).await;
    f.bid(&task, &freelancer, 200).await;

    let err = f
        .repository
        .create_bid(Bid::new(
            task.id,
            freelancer.id,
            CreateBid {
                amount: 150,
                proposal: "Again".into(),
            },
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::DuplicateBid));
}

#[tokio::test]
async fn test_approve_writes_ledger_once() {
    let f = fixture().await;
    let freelancer = f.freelancer().await;
    let task = f.open_task(500).await;
    let bid = f.bid(&task, &freelancer, 500).await;
    BidService::from_shared(f.repository.clone())
        .accept_bid(&f.client, bid.id)
        .await
        .unwrap();

    let milestones =
        MilestoneService::from_shared(f.repository.clone(), Arc::new(InProcessGateway::new()));
    let created = milestones
        .create_milestones(
            &f.client,
            task.id,
            CreateMilestones {
                milestones: vec![NewMilestone {
                    description: "Cart".into(),
                    amount: 200,
                    due_date: None,
                }],
            },
        )
        .await
        .unwrap()
        .value;
    let milestone = &created[0];

    milestones
        .submit_milestone(&freelancer, milestone.id)
        .await
        .unwrap();
    milestones
        .request_revision(&f.client, milestone.id, "add tests")
        .await
        .unwrap();
    milestones
        .submit_milestone(&freelancer, milestone.id)
        .await
        .unwrap();
    let approved = milestones
        .approve_milestone(&f.client, milestone.id)
        .await
        .unwrap()
        .value;
    assert_eq!(approved.status, MilestoneStatus::Approved);

    assert!(milestones
        .approve_milestone(&f.client, milestone.id)
        .await
        .is_err());

    let ledger = f.repository.list_transactions(task.id).await.unwrap();
    let releases: Vec<_> = ledger
        .iter()
        .filter(|t| t.transaction_type == TransactionType::EscrowRelease)
        .collect();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].amount, 200);
    assert!(ledger
        .iter()
        .any(|t| t.transaction_type == TransactionType::PlatformFee && t.amount == 20));
}

#[tokio::test]
async fn test_milestones_cannot_exceed_budget() {
    let f = fixture().await;
    let freelancer = f.freelancer().await;
    let task = f.open_task(300).await;
    let bid = f.bid(&task, &freelancer, 300).await;
    f.repository.accept_bid(bid.id).await.unwrap();

    let batch = |amount| {
        vec![Milestone::new(
            task.id,
            NewMilestone {
                description: "Part".into(),
                amount,
                due_date: None,
            },
        )]
    };
    f.repository
        .create_milestones(task.id, 300, batch(250))
        .await
        .unwrap();
    let err = f
        .repository
        .create_milestones(task.id, 300, batch(100))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));
    assert_eq!(f.repository.list_milestones(task.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancelled_task_blocks_milestone_approval() {
    let f = fixture().await;
    let freelancer = f.freelancer().await;
    let task = f.open_task(300).await;
    let bid = f.bid(&task, &freelancer, 300).await;
    f.repository.accept_bid(bid.id).await.unwrap();

    let milestone = Milestone::new(
        task.id,
        NewMilestone {
            description: "Part".into(),
            amount: 100,
            due_date: None,
        },
    );
    f.repository
        .create_milestones(task.id, 300, vec![milestone.clone()])
        .await
        .unwrap();
    f.repository
        .transition_milestone(MilestoneTransition::to(
            milestone.id,
            MilestoneStatus::Submitted,
        ))
        .await
        .unwrap();
    f.repository
        .cancel_task(task.id, TaskStatus::InProgress)
        .await
        .unwrap();

    let release = Transaction::new(
        task.id,
        freelancer.id,
        Some(milestone.id),
        100,
        TransactionType::EscrowRelease,
        TransactionStatus::Succeeded,
    );
    let err = f
        .repository
        .approve_milestone(milestone.id, vec![release])
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::InvalidState(_)));
    assert!(f.repository.list_transactions(task.id).await.unwrap().is_empty());

    let stored = f.repository.get_milestone(milestone.id).await.unwrap().unwrap();
    assert_eq!(stored.status, MilestoneStatus::Submitted);
}

#[tokio::test]
async fn test_missing_references_are_named() {
    let f = fixture().await;
    let input = |category_id| CreateTask {
        title: "Landing page".into(),
        description: "One page with a signup form".into(),
        budget: 100,
        deadline: None,
        category_id,
    };

    let ghost = Uuid::now_v7();
    let err = f
        .repository
        .create_task(Task::new(ghost, input(f.category)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::UserNotFound(id) if id == ghost));

    let missing_category = Uuid::now_v7();
    let err = f
        .repository
        .create_task(Task::new(f.client.id, input(missing_category)))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::CategoryNotFound(id) if id == missing_category));
}

#[tokio::test]
async fn test_cancel_open_task_rejects_pending_bids() {
    let f = fixture().await;
    let freelancer = f.freelancer().await;
    let task = f.open_task(300).await;
    let bid = f.bid(&task, &freelancer, 250).await;

    let cancelled = TaskService::from_shared(f.repository.clone())
        .cancel_task(&f.client, task.id)
        .await
        .unwrap()
        .value;
    assert_eq!(cancelled.status, TaskStatus::Cancelled);
    assert_eq!(cancelled.freelancer_id, None);

    let stored = f.repository.get_bid(bid.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BidStatus::Rejected);
}

#[tokio::test]
async fn test_filters_translate_to_sql() {
    let f = fixture().await;
    f.open_task(100).await;
    let big = f.open_task(900).await;

    let query = TaskQuery::new()
        .with(TaskFilter::MinBudget(500))
        .with(TaskFilter::Search("checkout".into()))
        .with(TaskFilter::Status(TaskStatus::Open));
    let (tasks, total) = f
        .repository
        .list_tasks(query, axum_helpers::PageParams::new(1, 10))
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(tasks[0].id, big.id);
}

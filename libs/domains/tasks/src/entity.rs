//! SeaORM entities for `tasks`, `bids`, `milestones` and `transactions`.

pub mod task {
    use crate::models::{Task, TaskStatus};
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "tasks")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub budget: i64,
        pub deadline: Option<DateTimeWithTimeZone>,
        pub status: TaskStatus,
        pub client_id: Uuid,
        pub freelancer_id: Option<Uuid>,
        pub category_id: Uuid,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::bid::Entity")]
        Bid,
        #[sea_orm(has_many = "super::milestone::Entity")]
        Milestone,
    }

    impl Related<super::bid::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Bid.def()
        }
    }

    impl Related<super::milestone::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Milestone.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Task {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                title: model.title,
                description: model.description,
                budget: model.budget,
                deadline: model.deadline.map(Into::into),
                status: model.status,
                client_id: model.client_id,
                freelancer_id: model.freelancer_id,
                category_id: model.category_id,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Task> for ActiveModel {
        fn from(task: Task) -> Self {
            ActiveModel {
                id: Set(task.id),
                title: Set(task.title),
                description: Set(task.description),
                budget: Set(task.budget),
                deadline: Set(task.deadline.map(Into::into)),
                status: Set(task.status),
                client_id: Set(task.client_id),
                freelancer_id: Set(task.freelancer_id),
                category_id: Set(task.category_id),
                created_at: Set(task.created_at.into()),
                updated_at: Set(task.updated_at.into()),
            }
        }
    }
}

pub mod bid {
    use crate::models::{Bid, BidStatus};
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "bids")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub task_id: Uuid,
        pub freelancer_id: Uuid,
        pub amount: i64,
        #[sea_orm(column_type = "Text")]
        pub proposal: String,
        pub status: BidStatus,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::task::Entity",
            from = "Column::TaskId",
            to = "super::task::Column::Id"
        )]
        Task,
    }

    impl Related<super::task::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Task.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Bid {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                task_id: model.task_id,
                freelancer_id: model.freelancer_id,
                amount: model.amount,
                proposal: model.proposal,
                status: model.status,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Bid> for ActiveModel {
        fn from(bid: Bid) -> Self {
            ActiveModel {
                id: Set(bid.id),
                task_id: Set(bid.task_id),
                freelancer_id: Set(bid.freelancer_id),
                amount: Set(bid.amount),
                proposal: Set(bid.proposal),
                status: Set(bid.status),
                created_at: Set(bid.created_at.into()),
                updated_at: Set(bid.updated_at.into()),
            }
        }
    }
}

pub mod milestone {
    use crate::models::{Milestone, MilestoneStatus};
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "milestones")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub task_id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub amount: i64,
        pub due_date: Option<DateTimeWithTimeZone>,
        pub status: MilestoneStatus,
        #[sea_orm(column_type = "Text", nullable)]
        pub revision_comments: Option<String>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::task::Entity",
            from = "Column::TaskId",
            to = "super::task::Column::Id"
        )]
        Task,
    }

    impl Related<super::task::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Task.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Milestone {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                task_id: model.task_id,
                description: model.description,
                amount: model.amount,
                due_date: model.due_date.map(Into::into),
                status: model.status,
                revision_comments: model.revision_comments,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Milestone> for ActiveModel {
        fn from(milestone: Milestone) -> Self {
            ActiveModel {
                id: Set(milestone.id),
                task_id: Set(milestone.task_id),
                description: Set(milestone.description),
                amount: Set(milestone.amount),
                due_date: Set(milestone.due_date.map(Into::into)),
                status: Set(milestone.status),
                revision_comments: Set(milestone.revision_comments),
                created_at: Set(milestone.created_at.into()),
                updated_at: Set(milestone.updated_at.into()),
            }
        }
    }
}

pub mod transaction {
    use crate::models::{Transaction, TransactionStatus, TransactionType};
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "transactions")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub task_id: Uuid,
        pub user_id: Uuid,
        pub milestone_id: Option<Uuid>,
        pub amount: i64,
        pub transaction_type: TransactionType,
        pub status: TransactionStatus,
        #[sea_orm(unique)]
        pub provider_reference: Option<String>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Transaction {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                task_id: model.task_id,
                user_id: model.user_id,
                milestone_id: model.milestone_id,
                amount: model.amount,
                transaction_type: model.transaction_type,
                status: model.status,
                provider_reference: model.provider_reference,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Transaction> for ActiveModel {
        fn from(transaction: Transaction) -> Self {
            ActiveModel {
                id: Set(transaction.id),
                task_id: Set(transaction.task_id),
                user_id: Set(transaction.user_id),
                milestone_id: Set(transaction.milestone_id),
                amount: Set(transaction.amount),
                transaction_type: Set(transaction.transaction_type),
                status: Set(transaction.status),
                provider_reference: Set(transaction.provider_reference),
                created_at: Set(transaction.created_at.into()),
                updated_at: Set(transaction.updated_at.into()),
            }
        }
    }
}

use crate::m20250301_000000_bootstrap::{drop_touch_trigger, touch_trigger};
use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(TaskStatus::Enum)
                    .values(task_statuses())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(BidStatus::Enum)
                    .values(bid_statuses())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(pk_uuid(Tasks::Id))
                    .col(string(Tasks::Title))
                    .col(text(Tasks::Description))
                    .col(big_integer(Tasks::Budget).check(Expr::col(Tasks::Budget).gt(0)))
                    .col(timestamp_with_time_zone_null(Tasks::Deadline))
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .enumeration(TaskStatus::Enum, task_statuses())
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(uuid(Tasks::ClientId))
                    .col(uuid_null(Tasks::FreelancerId))
                    .col(uuid(Tasks::CategoryId))
                    .col(
                        timestamp_with_time_zone(Tasks::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Tasks::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_client_id")
                            .from(Tasks::Table, Tasks::ClientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_freelancer_id")
                            .from(Tasks::Table, Tasks::FreelancerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_category_id")
                            .from(Tasks::Table, Tasks::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_tasks_status", Tasks::Status),
            ("idx_tasks_client_id", Tasks::ClientId),
            ("idx_tasks_freelancer_id", Tasks::FreelancerId),
            ("idx_tasks_category_id", Tasks::CategoryId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Tasks::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(pk_uuid(Bids::Id))
                    .col(uuid(Bids::TaskId))
                    .col(uuid(Bids::FreelancerId))
                    .col(big_integer(Bids::Amount).check(Expr::col(Bids::Amount).gt(0)))
                    .col(text(Bids::Proposal))
                    .col(
                        ColumnDef::new(Bids::Status)
                            .enumeration(BidStatus::Enum, bid_statuses())
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        timestamp_with_time_zone(Bids::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Bids::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_task_id")
                            .from(Bids::Table, Bids::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_freelancer_id")
                            .from(Bids::Table, Bids::FreelancerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bids_task_id")
                    .table(Bids::Table)
                    .col(Bids::TaskId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        // At most one accepted bid per task, and one pending bid per freelancer per task
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_bids_one_accepted ON bids (task_id) WHERE status = 'ACCEPTED'",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_bids_pending_per_freelancer ON bids (task_id, freelancer_id) WHERE status = 'PENDING'",
        )
        .await?;

        db.execute_unprepared(&touch_trigger("tasks")).await?;
        db.execute_unprepared(&touch_trigger("bids")).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(&drop_touch_trigger("bids")).await?;
        db.execute_unprepared(&drop_touch_trigger("tasks")).await?;

        manager
            .drop_table(Table::drop().table(Bids::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(BidStatus::Enum).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(TaskStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

fn task_statuses() -> [TaskStatus; 5] {
    [
        TaskStatus::Open,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ]
}

fn bid_statuses() -> [BidStatus; 3] {
    [BidStatus::Pending, BidStatus::Accepted, BidStatus::Rejected]
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    Title,
    Description,
    Budget,
    Deadline,
    Status,
    ClientId,
    FreelancerId,
    CategoryId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    Id,
    TaskId,
    FreelancerId,
    Amount,
    Proposal,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TaskStatus {
    #[sea_orm(iden = "task_status")]
    Enum,
    #[sea_orm(iden = "OPEN")]
    Open,
    #[sea_orm(iden = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(iden = "IN_REVIEW")]
    InReview,
    #[sea_orm(iden = "COMPLETED")]
    Completed,
    #[sea_orm(iden = "CANCELLED")]
    Cancelled,
}

#[derive(DeriveIden)]
enum BidStatus {
    #[sea_orm(iden = "bid_status")]
    Enum,
    #[sea_orm(iden = "PENDING")]
    Pending,
    #[sea_orm(iden = "ACCEPTED")]
    Accepted,
    #[sea_orm(iden = "REJECTED")]
    Rejected,
}

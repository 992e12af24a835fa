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
                    .as_enum(MilestoneStatus::Enum)
                    .values(milestone_statuses())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(TransactionType::Enum)
                    .values(transaction_types())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(TransactionStatus::Enum)
                    .values(transaction_statuses())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Milestones::Table)
                    .if_not_exists()
                    .col(pk_uuid(Milestones::Id))
                    .col(uuid(Milestones::TaskId))
                    .col(text(Milestones::Description))
                    .col(
                        big_integer(Milestones::Amount)
                            .check(Expr::col(Milestones::Amount).gt(0)),
                    )
                    .col(timestamp_with_time_zone_null(Milestones::DueDate))
                    .col(
                        ColumnDef::new(Milestones::Status)
                            .enumeration(MilestoneStatus::Enum, milestone_statuses())
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(text_null(Milestones::RevisionComments))
                    .col(
                        timestamp_with_time_zone(Milestones::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Milestones::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_milestones_task_id")
                            .from(Milestones::Table, Milestones::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_milestones_task_id")
                    .table(Milestones::Table)
                    .col(Milestones::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_uuid(Transactions::Id))
                    .col(uuid(Transactions::TaskId))
                    .col(uuid(Transactions::UserId))
                    .col(uuid_null(Transactions::MilestoneId))
                    .col(big_integer(Transactions::Amount))
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .enumeration(TransactionType::Enum, transaction_types())
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .enumeration(TransactionStatus::Enum, transaction_statuses())
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(string_null(Transactions::ProviderReference).unique_key())
                    .col(
                        timestamp_with_time_zone(Transactions::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Transactions::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_task_id")
                            .from(Transactions::Table, Transactions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_user_id")
                            .from(Transactions::Table, Transactions::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_milestone_id")
                            .from(Transactions::Table, Transactions::MilestoneId)
                            .to(Milestones::Table, Milestones::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_task_id")
                    .table(Transactions::Table)
                    .col(Transactions::TaskId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared(&touch_trigger("milestones")).await?;
        db.execute_unprepared(&touch_trigger("transactions")).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(&drop_touch_trigger("transactions"))
            .await?;
        db.execute_unprepared(&drop_touch_trigger("milestones"))
            .await?;

        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Milestones::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(TransactionStatus::Enum).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(TransactionType::Enum).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(MilestoneStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

fn milestone_statuses() -> [MilestoneStatus; 4] {
    [
        MilestoneStatus::Pending,
        MilestoneStatus::Submitted,
        MilestoneStatus::RevisionRequested,
        MilestoneStatus::Approved,
    ]
}

fn transaction_types() -> [TransactionType; 4] {
    [
        TransactionType::EscrowFunding,
        TransactionType::EscrowRelease,
        TransactionType::PlatformFee,
        TransactionType::Payout,
    ]
}

fn transaction_statuses() -> [TransactionStatus; 3] {
    [
        TransactionStatus::Pending,
        TransactionStatus::Succeeded,
        TransactionStatus::Failed,
    ]
}

#[derive(DeriveIden)]
enum Milestones {
    Table,
    Id,
    TaskId,
    Description,
    Amount,
    DueDate,
    Status,
    RevisionComments,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TaskId,
    UserId,
    MilestoneId,
    Amount,
    TransactionType,
    Status,
    ProviderReference,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum MilestoneStatus {
    #[sea_orm(iden = "milestone_status")]
    Enum,
    #[sea_orm(iden = "PENDING")]
    Pending,
    #[sea_orm(iden = "SUBMITTED")]
    Submitted,
    #[sea_orm(iden = "REVISION_REQUESTED")]
    RevisionRequested,
    #[sea_orm(iden = "APPROVED")]
    Approved,
}

#[derive(DeriveIden)]
enum TransactionType {
    #[sea_orm(iden = "transaction_type")]
    Enum,
    #[sea_orm(iden = "ESCROW_FUNDING")]
    EscrowFunding,
    #[sea_orm(iden = "ESCROW_RELEASE")]
    EscrowRelease,
    #[sea_orm(iden = "PLATFORM_FEE")]
    PlatformFee,
    #[sea_orm(iden = "PAYOUT")]
    Payout,
}

#[derive(DeriveIden)]
enum TransactionStatus {
    #[sea_orm(iden = "transaction_status")]
    Enum,
    #[sea_orm(iden = "PENDING")]
    Pending,
    #[sea_orm(iden = "SUCCEEDED")]
    Succeeded,
    #[sea_orm(iden = "FAILED")]
    Failed,
}

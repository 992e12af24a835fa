use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Messages::Table)
                    .if_not_exists()
                    .col(pk_uuid(Messages::Id))
                    .col(uuid(Messages::TaskId))
                    .col(uuid(Messages::SenderId))
                    .col(text(Messages::Content))
                    .col(
                        timestamp_with_time_zone(Messages::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_task_id")
                            .from(Messages::Table, Messages::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_messages_sender_id")
                            .from(Messages::Table, Messages::SenderId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_messages_task_created")
                    .table(Messages::Table)
                    .col(Messages::TaskId)
                    .col(Messages::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(NotificationType::Enum)
                    .values(notification_types())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(pk_uuid(Notifications::Id))
                    .col(uuid(Notifications::UserId))
                    .col(
                        ColumnDef::new(Notifications::NotificationType)
                            .enumeration(NotificationType::Enum, notification_types())
                            .not_null(),
                    )
                    .col(text(Notifications::Message))
                    .col(string(Notifications::Url))
                    .col(uuid_null(Notifications::TaskId))
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(
                        timestamp_with_time_zone(Notifications::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_task_id")
                            .from(Notifications::Table, Notifications::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_unread")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::IsRead)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(NotificationType::Enum).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Messages::Table).to_owned())
            .await?;

        Ok(())
    }
}

fn notification_types() -> [NotificationType; 15] {
    [
        NotificationType::EmailVerified,
        NotificationType::NewBid,
        NotificationType::BidAccepted,
        NotificationType::BidRejected,
        NotificationType::TaskCancelled,
        NotificationType::TaskInReview,
        NotificationType::TaskCompleted,
        NotificationType::MilestonesCreated,
        NotificationType::MilestoneSubmitted,
        NotificationType::RevisionRequested,
        NotificationType::PaymentReleased,
        NotificationType::PaymentConfirmed,
        NotificationType::PaymentFailed,
        NotificationType::NewMessage,
        NotificationType::AccountStatusChanged,
    ]
}

#[derive(DeriveIden)]
enum Messages {
    Table,
    Id,
    TaskId,
    SenderId,
    Content,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    NotificationType,
    Message,
    Url,
    TaskId,
    IsRead,
    CreatedAt,
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
enum NotificationType {
    #[sea_orm(iden = "notification_type")]
    Enum,
    #[sea_orm(iden = "EMAIL_VERIFIED")]
    EmailVerified,
    #[sea_orm(iden = "NEW_BID")]
    NewBid,
    #[sea_orm(iden = "BID_ACCEPTED")]
    BidAccepted,
    #[sea_orm(iden = "BID_REJECTED")]
    BidRejected,
    #[sea_orm(iden = "TASK_CANCELLED")]
    TaskCancelled,
    #[sea_orm(iden = "TASK_IN_REVIEW")]
    TaskInReview,
    #[sea_orm(iden = "TASK_COMPLETED")]
    TaskCompleted,
    #[sea_orm(iden = "MILESTONES_CREATED")]
    MilestonesCreated,
    #[sea_orm(iden = "MILESTONE_SUBMITTED")]
    MilestoneSubmitted,
    #[sea_orm(iden = "REVISION_REQUESTED")]
    RevisionRequested,
    #[sea_orm(iden = "PAYMENT_RELEASED")]
    PaymentReleased,
    #[sea_orm(iden = "PAYMENT_CONFIRMED")]
    PaymentConfirmed,
    #[sea_orm(iden = "PAYMENT_FAILED")]
    PaymentFailed,
    #[sea_orm(iden = "NEW_MESSAGE")]
    NewMessage,
    #[sea_orm(iden = "ACCOUNT_STATUS_CHANGED")]
    AccountStatusChanged,
}

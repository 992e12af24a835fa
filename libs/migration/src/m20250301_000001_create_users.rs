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
                    .as_enum(UserRole::Enum)
                    .values([UserRole::Client, UserRole::Freelancer, UserRole::Admin])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(OtpPurpose::Enum)
                    .values([OtpPurpose::EmailVerification, OtpPurpose::PasswordReset])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_uuid(Users::Id))
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(
                        ColumnDef::new(Users::Role)
                            .enumeration(
                                UserRole::Enum,
                                [UserRole::Client, UserRole::Freelancer, UserRole::Admin],
                            )
                            .not_null(),
                    )
                    .col(boolean(Users::EmailVerified).default(false))
                    .col(boolean(Users::IsSuspended).default(false))
                    .col(string_null(Users::OtpHash))
                    .col(
                        ColumnDef::new(Users::OtpPurpose)
                            .enumeration(
                                OtpPurpose::Enum,
                                [OtpPurpose::EmailVerification, OtpPurpose::PasswordReset],
                            )
                            .null(),
                    )
                    .col(timestamp_with_time_zone_null(Users::OtpExpiresAt))
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Users::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_role")
                    .table(Users::Table)
                    .col(Users::Role)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(uuid(Profiles::UserId).primary_key())
                    .col(string(Profiles::FirstName).default(""))
                    .col(string(Profiles::LastName).default(""))
                    .col(text(Profiles::Bio).default(""))
                    .col(
                        array(Profiles::Skills, ColumnType::Text)
                            .default(Expr::cust("'{}'::TEXT[]")),
                    )
                    .col(
                        array(Profiles::PortfolioLinks, ColumnType::Text)
                            .default(Expr::cust("'{}'::TEXT[]")),
                    )
                    .col(string_null(Profiles::AvatarUrl))
                    .col(
                        timestamp_with_time_zone(Profiles::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_profiles_user_id")
                            .from(Profiles::Table, Profiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();
        db.execute_unprepared(&touch_trigger("users")).await?;
        db.execute_unprepared(&touch_trigger("profiles")).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(&drop_touch_trigger("profiles")).await?;
        db.execute_unprepared(&drop_touch_trigger("users")).await?;

        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(OtpPurpose::Enum).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(UserRole::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
    EmailVerified,
    IsSuspended,
    OtpHash,
    OtpPurpose,
    OtpExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Profiles {
    Table,
    UserId,
    FirstName,
    LastName,
    Bio,
    Skills,
    PortfolioLinks,
    AvatarUrl,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserRole {
    #[sea_orm(iden = "user_role")]
    Enum,
    #[sea_orm(iden = "CLIENT")]
    Client,
    #[sea_orm(iden = "FREELANCER")]
    Freelancer,
    #[sea_orm(iden = "ADMIN")]
    Admin,
}

#[derive(DeriveIden)]
enum OtpPurpose {
    #[sea_orm(iden = "otp_purpose")]
    Enum,
    #[sea_orm(iden = "EMAIL_VERIFICATION")]
    EmailVerification,
    #[sea_orm(iden = "PASSWORD_RESET")]
    PasswordReset,
}

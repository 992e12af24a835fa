//! SeaORM entities for `users` and `profiles`.

pub mod user {
    use crate::models::{OtpPurpose, Role, User};
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub email: String,
        pub password_hash: String,
        pub role: Role,
        pub email_verified: bool,
        pub is_suspended: bool,
        pub otp_hash: Option<String>,
        pub otp_purpose: Option<OtpPurpose>,
        pub otp_expires_at: Option<DateTimeWithTimeZone>,
        pub otp_attempts: i32,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_one = "super::profile::Entity")]
        Profile,
    }

    impl Related<super::profile::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Profile.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for User {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                email: model.email,
                password_hash: model.password_hash,
                role: model.role,
                email_verified: model.email_verified,
                is_suspended: model.is_suspended,
                otp_hash: model.otp_hash,
                otp_purpose: model.otp_purpose,
                otp_expires_at: model.otp_expires_at.map(Into::into),
                otp_attempts: model.otp_attempts,
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<User> for ActiveModel {
        fn from(user: User) -> Self {
            ActiveModel {
                id: Set(user.id),
                email: Set(user.email),
                password_hash: Set(user.password_hash),
                role: Set(user.role),
                email_verified: Set(user.email_verified),
                is_suspended: Set(user.is_suspended),
                otp_hash: Set(user.otp_hash),
                otp_purpose: Set(user.otp_purpose),
                otp_expires_at: Set(user.otp_expires_at.map(Into::into)),
                otp_attempts: Set(user.otp_attempts),
                created_at: Set(user.created_at.into()),
                updated_at: Set(user.updated_at.into()),
            }
        }
    }
}

pub mod profile {
    use crate::models::Profile;
    use sea_orm::ActiveValue::Set;
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "profiles")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        pub first_name: String,
        pub last_name: String,
        #[sea_orm(column_type = "Text")]
        pub bio: String,
        pub skills: Vec<String>,
        pub portfolio_links: Vec<String>,
        pub avatar_url: Option<String>,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for Profile {
        fn from(model: Model) -> Self {
            Self {
                user_id: model.user_id,
                first_name: model.first_name,
                last_name: model.last_name,
                bio: model.bio,
                skills: model.skills,
                portfolio_links: model.portfolio_links,
                avatar_url: model.avatar_url,
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<Profile> for ActiveModel {
        fn from(profile: Profile) -> Self {
            ActiveModel {
                user_id: Set(profile.user_id),
                first_name: Set(profile.first_name),
                last_name: Set(profile.last_name),
                bio: Set(profile.bio),
                skills: Set(profile.skills),
                portfolio_links: Set(profile.portfolio_links),
                avatar_url: Set(profile.avatar_url),
                updated_at: Set(profile.updated_at.into()),
            }
        }
    }
}

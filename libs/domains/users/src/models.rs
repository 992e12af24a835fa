use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Marketplace role. Fixed at registration; only an admin can change it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "CLIENT")]
    Client,
    #[sea_orm(string_value = "FREELANCER")]
    Freelancer,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

/// What a pending one-time code may be used for
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "otp_purpose")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpPurpose {
    #[sea_orm(string_value = "EMAIL_VERIFICATION")]
    EmailVerification,
    #[sea_orm(string_value = "PASSWORD_RESET")]
    PasswordReset,
}

/// User entity - matches SQL schema
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    /// Stored lowercased
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub is_suspended: bool,
    /// SHA-256 hex of the pending one-time code
    pub otp_hash: Option<String>,
    pub otp_purpose: Option<OtpPurpose>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Wrong guesses against the pending code
    pub otp_attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: normalize_email(email),
            password_hash,
            role,
            email_verified: false,
            is_suspended: false,
            otp_hash: None,
            otp_purpose: None,
            otp_expires_at: None,
            otp_attempts: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_otp(&mut self, purpose: OtpPurpose, hash: String, expires_at: DateTime<Utc>) {
        self.otp_hash = Some(hash);
        self.otp_purpose = Some(purpose);
        self.otp_expires_at = Some(expires_at);
        self.otp_attempts = 0;
        self.updated_at = Utc::now();
    }

    pub fn clear_otp(&mut self) {
        self.otp_hash = None;
        self.otp_purpose = None;
        self.otp_expires_at = None;
        self.otp_attempts = 0;
        self.updated_at = Utc::now();
    }

    /// Count a wrong guess. The pending code is discarded once `limit` wrong
    /// guesses have been made; returns true when that happened.
    pub fn record_failed_otp(&mut self, limit: i32) -> bool {
        if self.otp_hash.is_none() {
            return false;
        }
        self.otp_attempts += 1;
        self.updated_at = Utc::now();
        if self.otp_attempts >= limit {
            self.clear_otp();
            return true;
        }
        false
    }

    /// True when a code for `purpose` is pending, unexpired at `now`, and
    /// hashes to `otp_hash`.
    pub fn otp_matches(&self, purpose: OtpPurpose, code_hash: &str, now: DateTime<Utc>) -> bool {
        match (&self.otp_hash, self.otp_purpose, self.otp_expires_at) {
            (Some(stored), Some(p), Some(expires_at)) => {
                p == purpose && expires_at > now && stored == code_hash
            }
            _ => false,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub email_verified: bool,
    pub is_suspended: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            email_verified: user.email_verified,
            is_suspended: user.is_suspended,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// One-to-one profile, created together with the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub skills: Vec<String>,
    pub portfolio_links: Vec<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile whose name is split on the first run of whitespace.
    pub fn for_user(user_id: Uuid, full_name: &str) -> Self {
        let full_name = full_name.trim();
        let (first_name, last_name) = match full_name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
            None => (full_name.to_string(), String::new()),
        };

        Self {
            user_id,
            first_name,
            last_name,
            bio: String::new(),
            skills: Vec::new(),
            portfolio_links: Vec::new(),
            avatar_url: None,
            updated_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }

    pub fn apply_update(&mut self, update: UpdateProfile) {
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(bio) = update.bio {
            self.bio = bio;
        }
        if let Some(skills) = update.skills {
            self.skills = skills
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(links) = update.portfolio_links {
            self.portfolio_links = links;
        }
        if let Some(avatar_url) = update.avatar_url {
            self.avatar_url = Some(avatar_url);
        }
        self.updated_at = Utc::now();
    }
}

/// `GET /users/me` payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub profile: Profile,
}

/// DTO for user registration
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// `CLIENT` or `FREELANCER`
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct VerifyEmailRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub otp: String,
}

/// Body for endpoints that only need an email address
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email)]
    pub email: String,
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email, length(max = 255))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub otp: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Response after successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the access token expires
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Self-service profile changes; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
    #[validate(length(max = 50))]
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 20))]
    pub portfolio_links: Option<Vec<String>>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// One admin listing filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Role(Role),
    Suspended(bool),
    /// Case-insensitive substring of the email
    EmailContains(String),
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserFilter::Role(role) => user.role == *role,
            UserFilter::Suspended(suspended) => user.is_suspended == *suspended,
            UserFilter::EmailContains(needle) => user.email.contains(&needle.to_lowercase()),
        }
    }
}

/// All filters must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserQuery {
    pub filters: Vec<UserFilter>,
}

impl UserQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: UserFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn matches(&self, user: &User) -> bool {
        self.filters.iter().all(|f| f.matches(user))
    }
}

/// Query string for `GET /admin/users`
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListUsersParams {
    pub role: Option<Role>,
    pub suspended: Option<bool>,
    /// Substring of the email address
    #[validate(length(min = 1, max = 255))]
    pub search: Option<String>,
}

impl From<ListUsersParams> for UserQuery {
    fn from(params: ListUsersParams) -> Self {
        let mut query = UserQuery::new();
        if let Some(role) = params.role {
            query = query.with(UserFilter::Role(role));
        }
        if let Some(suspended) = params.suspended {
            query = query.with(UserFilter::Suspended(suspended));
        }
        if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
            query = query.with(UserFilter::EmailContains(search.trim().to_string()));
        }
        query
    }
}

/// Admin change to an account
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUserStatus {
    pub is_suspended: bool,
    pub role: Option<Role>,
}

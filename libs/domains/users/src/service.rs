use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use domain_notifications::{EmailJob, NotificationType, Outbox, Outcome};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{
    OtpPurpose, Profile, ProfileResponse, RegisterRequest, Role, UpdateProfile, User,
    UserResponse, normalize_email,
};
use crate::otp;
use crate::repository::UserRepository;

pub const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Service layer for identity and self-service profile logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    otp_ttl: Duration,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            otp_ttl: self.otp_ttl,
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self::from_shared(Arc::new(repository))
    }

    /// Share one repository between this service and [`AdminService`](crate::AdminService).
    pub fn from_shared(repository: Arc<R>) -> Self {
        Self {
            repository,
            otp_ttl: Duration::minutes(DEFAULT_OTP_TTL_MINUTES),
        }
    }

    pub fn with_otp_ttl(mut self, ttl: Duration) -> Self {
        self.otp_ttl = ttl;
        self
    }

    pub fn repository(&self) -> Arc<R> {
        Arc::clone(&self.repository)
    }

    /// Create an unverified account and email a verification code.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterRequest) -> UserResult<Outcome<UserResponse>> {
        if input.role == Role::Admin {
            return Err(UserError::Validation(
                "Role must be CLIENT or FREELANCER".to_string(),
            ));
        }
        validate_password(&input.password)?;

        let email = normalize_email(&input.email);
        if self.repository.get_by_email(&email).await?.is_some() {
            return Err(UserError::DuplicateEmail(email));
        }

        let password_hash = hash_password(&input.password)?;
        let mut user = User::new(&email, password_hash, input.role);
        let profile = Profile::for_user(user.id, &input.name);

        let code = otp::issue(self.otp_ttl);
        user.set_otp(OtpPurpose::EmailVerification, code.hash, code.expires_at);

        let created = self.repository.create(user, profile.clone()).await?;

        let mut outbox = Outbox::new();
        outbox.email(EmailJob::VerifyEmail {
            to: created.email.clone(),
            name: profile.display_name(),
            otp: code.code,
            expires_in_minutes: self.otp_ttl.num_minutes(),
        });

        Ok(Outcome::with_outbox(created.into(), outbox))
    }

    #[instrument(skip(self, code))]
    pub async fn verify_email(&self, email: &str, code: &str) -> UserResult<Outcome<UserResponse>> {
        let email = normalize_email(email);
        let mut user = self
            .repository
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidOtp)?;

        if user.email_verified {
            return Err(UserError::EmailAlreadyVerified);
        }
        if !user.otp_matches(OtpPurpose::EmailVerification, &otp::hash_code(code), Utc::now()) {
            return Err(self.reject_code(user).await);
        }

        user.email_verified = true;
        user.clear_otp();
        let updated = self.repository.update(user).await?;

        tracing::info!(user_id = %updated.id, "Email verified");

        let mut outbox = Outbox::new();
        outbox.notify(
            updated.id,
            NotificationType::EmailVerified,
            "Your email address has been verified",
            "/profile",
            None,
        );
        Ok(Outcome::with_outbox(updated.into(), outbox))
    }

    /// Re-issue the verification code. Unknown or verified emails are a silent no-op.
    #[instrument(skip(self))]
    pub async fn resend_verification(&self, email: &str) -> UserResult<Outcome<()>> {
        let email = normalize_email(email);
        let Some(user) = self.repository.get_by_email(&email).await? else {
            return Ok(Outcome::new(()));
        };
        if user.email_verified {
            return Ok(Outcome::new(()));
        }

        self.issue_code(user, OtpPurpose::EmailVerification).await
    }

    /// Check credentials. The HTTP layer turns the result into a token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> UserResult<UserResponse> {
        let user = self
            .repository
            .get_by_email(&normalize_email(email))
            .await?
            .ok_or(UserError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }
        if !user.email_verified {
            return Err(UserError::EmailNotVerified);
        }
        if user.is_suspended {
            return Err(UserError::Suspended);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user.into())
    }

    /// Email a password reset code. Unknown emails are a silent no-op.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> UserResult<Outcome<()>> {
        let email = normalize_email(email);
        match self.repository.get_by_email(&email).await? {
            Some(user) => self.issue_code(user, OtpPurpose::PasswordReset).await,
            None => Ok(Outcome::new(())),
        }
    }

    #[instrument(skip(self, code, new_password))]
    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> UserResult<()> {
        let email = normalize_email(email);
        let mut user = self
            .repository
            .get_by_email(&email)
            .await?
            .ok_or(UserError::InvalidOtp)?;

        if !user.otp_matches(OtpPurpose::PasswordReset, &otp::hash_code(code), Utc::now()) {
            return Err(self.reject_code(user).await);
        }
        validate_password(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.clear_otp();
        self.repository.update(user).await?;
        Ok(())
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let mut user = self.find(user_id).await?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }
        validate_password(new_password)?;

        user.password_hash = hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;
        Ok(())
    }

    pub async fn get_profile(&self, user_id: Uuid) -> UserResult<ProfileResponse> {
        let user = self.find(user_id).await?;
        let profile = self.profile_of(user_id).await?;
        Ok(ProfileResponse {
            user: user.into(),
            profile,
        })
    }

    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: UpdateProfile,
    ) -> UserResult<ProfileResponse> {
        if let Some(links) = &changes.portfolio_links {
            if let Some(bad) = links
                .iter()
                .find(|l| !(l.starts_with("https://") || l.starts_with("http://")))
            {
                return Err(UserError::Validation(format!(
                    "Portfolio link '{}' must be an http(s) URL",
                    bad
                )));
            }
        }

        let user = self.find(user_id).await?;
        let mut profile = self.profile_of(user_id).await?;
        profile.apply_update(changes);
        let profile = self.repository.update_profile(profile).await?;

        Ok(ProfileResponse {
            user: user.into(),
            profile,
        })
    }

    async fn find(&self, id: Uuid) -> UserResult<User> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn profile_of(&self, user_id: Uuid) -> UserResult<Profile> {
        match self.repository.get_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => Ok(Profile::for_user(user_id, "")),
        }
    }

    /// Record a wrong code against the account and build the error to return.
    async fn reject_code(&self, mut user: User) -> UserError {
        if user.otp_hash.is_none() {
            return UserError::InvalidOtp;
        }
        let burned = user.record_failed_otp(otp::MAX_ATTEMPTS);
        let user_id = user.id;
        if let Err(e) = self.repository.update(user).await {
            return e;
        }
        if burned {
            tracing::warn!(user_id = %user_id, "Too many wrong codes, pending code discarded");
        }
        UserError::InvalidOtp
    }

    async fn issue_code(&self, mut user: User, purpose: OtpPurpose) -> UserResult<Outcome<()>> {
        let code = otp::issue(self.otp_ttl);
        user.set_otp(purpose, code.hash, code.expires_at);
        let user = self.repository.update(user).await?;

        let name = self
            .repository
            .get_profile(user.id)
            .await?
            .map(|p| p.display_name())
            .unwrap_or_default();
        let expires_in_minutes = self.otp_ttl.num_minutes();

        let job = match purpose {
            OtpPurpose::EmailVerification => EmailJob::VerifyEmail {
                to: user.email,
                name,
                otp: code.code,
                expires_in_minutes,
            },
            OtpPurpose::PasswordReset => EmailJob::PasswordReset {
                to: user.email,
                name,
                otp: code.code,
                expires_in_minutes,
            },
        };

        let mut outbox = Outbox::new();
        outbox.email(job);
        Ok(Outcome::with_outbox((), outbox))
    }
}

// Password helpers

pub(crate) fn hash_password(password: &str) -> UserResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| UserError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> UserResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| UserError::PasswordHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 8-128 chars with upper, lower, digit and special characters.
pub fn validate_password(password: &str) -> UserResult<()> {
    let len = password.chars().count();
    if len < 8 {
        return Err(UserError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if len > 128 {
        return Err(UserError::Validation(
            "Password cannot exceed 128 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(UserError::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(UserError::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(UserError::Validation(
            "Password must contain at least one digit".to_string(),
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(UserError::Validation(format!(
            "Password must contain at least one special character ({})",
            SPECIAL_CHARS
        )));
    }

    Ok(())
}

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
    routing::post,
};
use axum_helpers::{
    ApiResponse, AuditEvent, AuditOutcome, AuthUser, Empty, JwtAuth, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestValidationResponse, ConflictResponse, ForbiddenResponse,
        InternalServerErrorResponse, UnauthorizedResponse,
    },
};
use domain_notifications::EffectHandler;
use std::sync::Arc;
use utoipa::OpenApi;

use super::AUTH_TAG;
use crate::error::{UserError, UserResult};
use crate::models::{
    AuthResponse, ChangePasswordRequest, EmailRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, UserResponse, VerifyEmailRequest,
};
use crate::repository::UserRepository;
use crate::service::UserService;

#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        verify_email,
        resend_verification,
        login,
        forgot_password,
        reset_password,
        change_password
    ),
    components(schemas(
        RegisterRequest,
        VerifyEmailRequest,
        EmailRequest,
        LoginRequest,
        ResetPasswordRequest,
        ChangePasswordRequest,
        AuthResponse,
        UserResponse,
        Empty
    ))
)]
pub struct ApiDoc;

/// State shared by the auth endpoints
pub struct AuthState<R: UserRepository> {
    pub service: UserService<R>,
    pub jwt: JwtAuth,
    pub effects: Arc<dyn EffectHandler>,
}

pub fn router<R: UserRepository + 'static>(
    service: UserService<R>,
    jwt: JwtAuth,
    effects: Arc<dyn EffectHandler>,
) -> Router {
    let state = Arc::new(AuthState {
        service,
        jwt,
        effects,
    });

    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route("/change-password", post(change_password))
        .with_state(state)
}

/// Register a new client or freelancer account
#[utoipa::path(
    post,
    path = "/register",
    tag = AUTH_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification code sent", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<impl IntoResponse> {
    let user = state
        .service
        .register(input)
        .await?
        .deliver(state.effects.as_ref())
        .await;

    AuditEvent::new(
        Some(user.id.to_string()),
        "auth.register",
        None,
        AuditOutcome::Success,
    )
    .on("user", user.id)
    .from_headers(&headers)
    .log();

    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "Registration successful. Check your email for the verification code.",
            user,
        ),
    ))
}

/// Confirm an email address with the emailed code
#[utoipa::path(
    post,
    path = "/verify-email",
    tag = AUTH_TAG,
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn verify_email<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    ValidatedJson(input): ValidatedJson<VerifyEmailRequest>,
) -> UserResult<ApiResponse<UserResponse>> {
    let user = state
        .service
        .verify_email(&input.email, &input.otp)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::with_message("Email verified", user))
}

/// Send a fresh verification code
#[utoipa::path(
    post,
    path = "/resend-verification",
    tag = AUTH_TAG,
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent if the account exists and is unverified", body = ApiResponse<Empty>),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn resend_verification<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    ValidatedJson(input): ValidatedJson<EmailRequest>,
) -> UserResult<ApiResponse<Empty>> {
    state
        .service
        .resend_verification(&input.email)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::message(
        "If the account exists and is unverified, a new code has been sent",
    ))
}

/// Log in and receive an access token
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<impl IntoResponse> {
    let user = match state.service.login(&input.email, &input.password).await {
        Ok(user) => user,
        Err(e) => {
            AuditEvent::new(None, "auth.login", None, AuditOutcome::Failure)
                .from_headers(&headers)
                .with_details(serde_json::json!({ "reason": e.to_string() }))
                .log();
            return Err(e);
        }
    };

    let token = state
        .jwt
        .create_access_token(user.id, &user.email, &user.role.to_string())
        .map_err(|e| UserError::Internal(format!("Failed to create token: {}", e)))?;

    AuditEvent::new(
        Some(user.id.to_string()),
        "auth.login",
        None,
        AuditOutcome::Success,
    )
    .on("user", user.id)
    .from_headers(&headers)
    .log();

    let expires_in = state.jwt.ttl_seconds();
    let cookie = format!(
        "access_token={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        token, expires_in
    );
    let cookie = HeaderValue::from_str(&cookie)
        .map_err(|e| UserError::Internal(format!("Invalid cookie header: {}", e)))?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        ApiResponse::ok(AuthResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        }),
    ))
}

/// Request a password reset code
#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = AUTH_TAG,
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Code sent if the account exists", body = ApiResponse<Empty>),
        (status = 400, response = BadRequestValidationResponse)
    )
)]
async fn forgot_password<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    ValidatedJson(input): ValidatedJson<EmailRequest>,
) -> UserResult<ApiResponse<Empty>> {
    state
        .service
        .forgot_password(&input.email)
        .await?
        .deliver(state.effects.as_ref())
        .await;
    Ok(ApiResponse::message(
        "If the account exists, a reset code has been sent",
    ))
}

/// Set a new password with a reset code
#[utoipa::path(
    post,
    path = "/reset-password",
    tag = AUTH_TAG,
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<Empty>),
        (status = 400, response = BadRequestResponse)
    )
)]
async fn reset_password<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ResetPasswordRequest>,
) -> UserResult<ApiResponse<Empty>> {
    state
        .service
        .reset_password(&input.email, &input.otp, &input.new_password)
        .await?;

    AuditEvent::new(None, "auth.password_reset", None, AuditOutcome::Success)
        .from_headers(&headers)
        .log();

    Ok(ApiResponse::message("Password has been reset"))
}

/// Change the signed-in user's password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = AUTH_TAG,
    request_body = ChangePasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<Empty>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn change_password<R: UserRepository>(
    State(state): State<Arc<AuthState<R>>>,
    user: AuthUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ChangePasswordRequest>,
) -> UserResult<ApiResponse<Empty>> {
    state
        .service
        .change_password(user.id, &input.current_password, &input.new_password)
        .await?;

    AuditEvent::new(
        Some(user.id.to_string()),
        "auth.password_change",
        None,
        AuditOutcome::Success,
    )
    .on("user", user.id)
    .from_headers(&headers)
    .log();

    Ok(ApiResponse::message("Password changed successfully"))
}

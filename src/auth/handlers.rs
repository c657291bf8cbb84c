use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        claims::TokenKind,
        dto::{LoginRequest, LoginResponse, PublicUser, RegisterRequest, VerifyEmailRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{hash_password, verify_against_dummy, verify_password},
        repo_types::NewUser,
        validation::{validate_login, validate_registration},
    },
    error::{AppError, AppResult},
    mail::templates,
    response::ApiResponse,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/verify-email", post(verify_email))
        .route("/auth/login", post(login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(get_me))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload.map(|Json(body)| body).map_err(|rej| {
        warn!(error = %rej.body_text(), "unreadable request body");
        AppError::BadRequest("Invalid request body.".into())
    })
}

fn invalid_token() -> AppError {
    AppError::Unauthorized("Invalid or expired token.".into())
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid email or password.".into())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<ApiResponse> {
    let registration = validate_registration(json_body(payload)?).map_err(|issues| {
        warn!(issues = issues.len(), "registration input rejected");
        AppError::Validation(issues)
    })?;

    if state.users.email_exists(&registration.email).await? {
        warn!(email = %registration.email, "email already registered");
        return Err(AppError::Conflict("User is already registered.".into()));
    }

    let password_hash = hash_password(&registration.password)?;
    let user = state
        .users
        .create(NewUser {
            name: registration.name,
            email: registration.email,
            password_hash,
        })
        .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_email_verification(user.id)?;
    let link = templates::verification_link(&state.config.public_base_url, &token);
    state
        .mailer
        .send(templates::verification_email(&user.email, &link))
        .await
        .context("send verification email")?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(ApiResponse::created(
        "Registration success, Please verify your email address.",
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    payload: Result<Json<VerifyEmailRequest>, JsonRejection>,
) -> AppResult<ApiResponse> {
    let token = json_body(payload)?
        .token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing token.".into()))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&token, TokenKind::EmailVerification)
        .map_err(|e| {
            warn!(error = %e, "verification token rejected");
            invalid_token()
        })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| {
        warn!(sub = %claims.sub, "verification token carries malformed user id");
        AppError::BadRequest("Invalid user Id".into())
    })?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    if user.is_email_verified {
        info!(user_id = %user.id, "email already verified");
        return Ok(ApiResponse::ok("Email is already verified."));
    }

    if !state.users.mark_email_verified(user.id).await? {
        // Lost a race with another redemption or a delete.
        return match state.users.find_by_id(user.id).await? {
            Some(_) => Ok(ApiResponse::ok("Email is already verified.")),
            None => Err(AppError::NotFound("User not found.".into())),
        };
    }

    info!(user_id = %user.id, "email verified");
    Ok(ApiResponse::ok("User email verification is done."))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<ApiResponse> {
    let creds = validate_login(json_body(payload)?).map_err(AppError::Validation)?;

    let Some(user) = state.users.find_by_email(&creds.email).await? else {
        verify_against_dummy(&creds.password);
        warn!(email = %creds.email, "login unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&creds.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(invalid_credentials());
    }

    if !user.is_email_verified {
        warn!(user_id = %user.id, "login before email verification");
        return Err(AppError::Forbidden(
            "Please verify your email address before logging in.".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;

    info!(user_id = %user.id, "user logged in");
    Ok(ApiResponse::ok("Login successful.").with_data(LoginResponse {
        access_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<ApiResponse> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".into()))?;

    Ok(ApiResponse::ok("Current user.").with_data(PublicUser::from(user)))
}

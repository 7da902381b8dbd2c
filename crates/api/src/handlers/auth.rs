//! Email-based passwordless authentication.
//!
//! Flow:
//! 1. User signs up via POST /auth/register; a login code is mailed
//! 2. Existing users request a new code via POST /auth/otp
//! 3. User submits email + code to POST /auth/verify
//! 4. On success an opaque bearer token is issued and stored in Redis
//! 5. POST /auth/logout revokes the presented token
//!
//! Security notes:
//! - Codes are hashed before storage (Redis compromise doesn't leak valid codes)
//! - Five wrong codes lock the email for 15 minutes
//! - Tokens are stored by SHA-256 digest, never in plaintext
//! - Banned and suspended accounts cannot obtain codes or tokens

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use rand::Rng;
use shared::api::{
    AuthResponse, RegisterPayload, RequestCodePayload, RequestCodeResponse, VerifyCodePayload,
};

use crate::{error::AppError, middleware::auth::AuthUser, models::User, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/otp", post(request_code))
        .route("/verify", post(verify_code))
        .route("/logout", post(logout))
        .route("/me", get(get_me))
}

const TOKEN_TYPE: &str = "Bearer";

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// 32 random bytes, hex encoded.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

fn ensure_active(user: &User) -> Result<(), AppError> {
    if user.is_banned() {
        tracing::warn!(user_id = user.id, "refused: account banned");
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "Your account has been blocked. Please contact support.",
        ));
    }
    if user.is_suspended() {
        tracing::warn!(user_id = user.id, "refused: account suspended");
        return Err(AppError::External(
            StatusCode::FORBIDDEN,
            "Your account has been temporarily suspended.",
        ));
    }
    Ok(())
}

async fn find_account(state: &AppState, email: &str) -> Result<User, AppError> {
    state
        .repos
        .users
        .find_by_email(email)
        .await?
        .ok_or(AppError::External(
            StatusCode::NOT_FOUND,
            "No account for this email",
        ))
}

#[debug_handler]
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let username = normalize(&payload.username);
    let email = normalize(&payload.email);

    if state.repos.users.email_taken(&email).await? {
        return Err(AppError::External(
            StatusCode::CONFLICT,
            "This email is already registered",
        ));
    }
    if state.repos.users.username_taken(&username).await? {
        return Err(AppError::External(
            StatusCode::CONFLICT,
            "This username is already taken",
        ));
    }

    let user = state.repos.users.create(&username, &email).await?;
    state.otp.generate(&user.email, &user.username).await?;

    tracing::info!(user_id = user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user.to_response())))
}

#[debug_handler]
async fn request_code(
    State(state): State<AppState>,
    Json(payload): Json<RequestCodePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let email = normalize(&payload.email);
    let user = find_account(&state, &email).await?;
    ensure_active(&user)?;

    state.otp.generate(&email, &user.username).await?;
    let expires_in_secs = state.otp.remaining_seconds(&email).await?;

    Ok(Json(RequestCodeResponse { expires_in_secs }))
}

#[debug_handler]
async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let email = normalize(&payload.email);
    let user = find_account(&state, &email).await?;
    ensure_active(&user)?;

    state.otp.verify(&email, &payload.code).await?;

    let user = if user.email_verified_at.is_none() {
        let user = state.repos.users.mark_verified(user.id).await?;
        if let Err(e) = state.email.send_welcome(&user.email, &user.username).await {
            tracing::warn!(user_id = user.id, "failed to send welcome email: {:?}", e);
        }
        user
    } else {
        user
    };

    let token = generate_token();
    let ttl = state.config.token_ttl_secs;
    state.stores.tokens.issue(&token, user.id, ttl).await?;

    tracing::info!(user_id = user.id, "user signed in");

    Ok(Json(AuthResponse {
        token,
        token_type: TOKEN_TYPE.to_string(),
        expires_in: ttl,
        user: user.to_response(),
    }))
}

#[debug_handler]
async fn logout(user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.stores.tokens.revoke(&user.token).await?;

    tracing::info!(user_id = user.id, "user signed out");

    Ok(StatusCode::NO_CONTENT)
}

#[debug_handler]
async fn get_me(user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let user = state
        .repos
        .users
        .find_by_id(user.id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "User not found"))?;

    Ok(Json(user.to_response()))
}

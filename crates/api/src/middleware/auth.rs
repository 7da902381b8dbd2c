//! Bearer token authentication.
//!
//! Usage: Add `AuthUser` as an extractor parameter to require authentication.
//! Tokens are issued by `POST /auth/verify` and resolved through the token store.
//!
//! ```ignore
//! async fn my_handler(user: AuthUser, ...) -> ... {
//!     // user.id is available here
//! }
//! ```

use axum::{
    Json, RequestPartsExt,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::state::AppState;

/// Authenticated user extracted from a live bearer token.
pub struct AuthUser {
    pub id: i64,
    /// The presented token, kept so it can be revoked on logout.
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::MissingToken)?;

        let token = bearer.token();

        let user_id = state.stores.tokens.resolve(token).await.map_err(|e| {
            tracing::error!("token lookup failed: {:?}", e);
            AuthError::Unavailable
        })?;

        let id = user_id.ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser {
            id,
            token: token.to_string(),
        })
    }
}

pub enum AuthError {
    MissingToken,
    InvalidToken,
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication temporarily unavailable",
            ),
        };

        let body = serde_json::json!({ "error": message });

        (status, Json(body)).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::engine::EngineError;

pub enum AppError {
    /// Internal errors - logged but return generic 500 to user
    Internal(anyhow::Error),
    /// User-facing errors - message is safe to show
    External(StatusCode, &'static str),
    /// Validation errors - safe to show
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::External(status, msg) => (status, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Expired => Self::External(
                StatusCode::GONE,
                "Code expired or was never requested. Request a new one.",
            ),
            EngineError::InvalidCode => Self::External(StatusCode::BAD_REQUEST, "Invalid code"),
            EngineError::Locked => Self::External(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many incorrect attempts. Please wait 15 minutes.",
            ),
            EngineError::SessionConflict => Self::External(
                StatusCode::CONFLICT,
                "A game session is already active",
            ),
            EngineError::NotFound => Self::External(StatusCode::NOT_FOUND, "Not found"),
            EngineError::Ownership => Self::External(
                StatusCode::FORBIDDEN,
                "This session belongs to another user",
            ),
            EngineError::Store(err) => Self::Internal(err),
            partial @ (EngineError::PartialScoreUpdate { .. }
            | EngineError::RankUnavailable { .. }) => Self::Internal(anyhow::Error::new(partial)),
        }
    }
}

//! Play sessions.
//!
//! A player starts one session at a time, plays, then reports the result.
//! Finishing records the match, updates the player's totals and adds the
//! score to the global, daily, weekly and per-game boards. A board failure
//! after the match is recorded still answers with the settlement, plus
//! `leaderboard_error` naming the boards that did and did not take the score.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use garde::Validate;
use shared::api::{
    FinishGamePayload, FinishGameResponse, LeaderboardFailure, LeaderboardUpdate,
    MatchHistoryResponse, StartSessionResponse,
};

use crate::{
    engine::{Board, EngineError, ScoreUpdate},
    error::AppError,
    middleware::auth::AuthUser,
    models::MatchReport,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{game_id}/start", post(start_game))
        .route("/finish", post(finish_game))
        .route("/history", get(match_history))
}

impl From<ScoreUpdate> for LeaderboardUpdate {
    fn from(update: ScoreUpdate) -> Self {
        Self {
            user_id: update.user_id,
            points_added: update.points_added,
            new_global_score: update.new_global_score,
            global_rank: update.global_rank,
            new_daily_score: update.new_daily_score,
            daily_rank: update.daily_rank,
        }
    }
}

#[debug_handler]
async fn start_game(
    user: AuthUser,
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .start_session(user.id, game_id, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartSessionResponse {
            session_id: session.session_id,
            game_id: session.game_id,
            started_at: session.started_at,
        }),
    ))
}

#[debug_handler]
async fn finish_game(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<FinishGamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = MatchReport {
        result: payload.result,
        score: payload.score,
        duration: payload.duration,
        opponent_id: payload.opponent_id,
    };

    let settlement = state
        .sessions
        .finish_session(&payload.session_id, user.id, &report)
        .await?;

    let (leaderboard, leaderboard_error) = match state
        .leaderboard
        .add_score(
            user.id,
            settlement.earned_score,
            Some(settlement.game_id),
            Utc::now(),
        )
        .await
    {
        Ok(update) => (Some(update.into()), None),
        Err(err) => (None, Some(board_failure(user.id, settlement.match_id, err)?)),
    };

    Ok(Json(FinishGameResponse {
        match_id: settlement.match_id,
        result: settlement.result,
        score: settlement.score,
        earned_score: settlement.earned_score,
        new_total_score: settlement.new_total_score,
        leaderboard,
        leaderboard_error,
    }))
}

/// Board keys touched before a leaderboard failure on a recorded match.
/// Any other error is passed through.
fn board_failure(
    user_id: i64,
    match_id: i64,
    err: EngineError,
) -> Result<LeaderboardFailure, AppError> {
    let (applied, failed, cause) = match err {
        EngineError::PartialScoreUpdate {
            applied,
            failed,
            cause,
        } => (applied, Some(failed), cause),
        EngineError::RankUnavailable { applied, cause } => (applied, None, cause),
        other => return Err(other.into()),
    };

    tracing::error!(
        user_id,
        match_id,
        applied = ?applied,
        failed = ?failed,
        "leaderboard update incomplete: {:?}",
        cause
    );
    sentry::capture_error(cause.as_ref() as &(dyn std::error::Error + Send + Sync + 'static));

    Ok(LeaderboardFailure {
        applied: applied.iter().map(Board::key).collect(),
        failed: failed.as_ref().map(Board::key),
    })
}

#[debug_handler]
async fn match_history(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let match_ids = state.stores.history.recent(user.id).await?;

    Ok(Json(MatchHistoryResponse { match_ids }))
}

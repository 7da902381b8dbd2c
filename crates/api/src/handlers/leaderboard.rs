//! Public leaderboard listings and player standings.

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use shared::api::{LeaderboardEntry, UserRankResponse};

use crate::{engine::Board, error::AppError, middleware::auth::AuthUser, state::AppState};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/global", get(global))
        .route("/top10", get(top10))
        .route("/top100", get(top100))
        .route("/daily", get(daily))
        .route("/weekly", get(weekly))
        .route("/game/{game_id}", get(game))
        .route("/me", get(my_rank))
        .route("/users/{user_id}", get(user_rank))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

impl ListQuery {
    fn count(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

async fn listing(
    state: &AppState,
    board: Board,
    count: usize,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let rows = state.leaderboard.get_top(board, count).await?;
    let entries = state.presenter.present(rows).await?;

    Ok(Json(entries))
}

#[debug_handler]
async fn global(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::Global, query.count()).await
}

#[debug_handler]
async fn top10(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::Global, 10).await
}

#[debug_handler]
async fn top100(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::Global, 100).await
}

#[debug_handler]
async fn daily(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::daily(Utc::now()), query.count()).await
}

#[debug_handler]
async fn weekly(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::weekly(Utc::now()), query.count()).await
}

#[debug_handler]
async fn game(
    State(state): State<AppState>,
    Path(game_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, AppError> {
    listing(&state, Board::Game(game_id), query.count()).await
}

async fn standing(state: &AppState, user_id: i64) -> Result<Json<UserRankResponse>, AppError> {
    let info = state.leaderboard.get_user_rank(user_id, Utc::now()).await?;
    let response = state.presenter.present_rank(info).await?;

    Ok(Json(response))
}

#[debug_handler]
async fn my_rank(user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    standing(&state, user.id).await
}

#[debug_handler]
async fn user_rank(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    standing(&state, user_id).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use super::*;
    use crate::models::PlayerProfile;
    use crate::services::MockUserDirectory;
    use crate::stores::MockBoardStore;
    use crate::test_utils::{MemoryRedis, TestStateBuilder, json_body};

    fn directory() -> MockUserDirectory {
        let mut directory = MockUserDirectory::new();
        directory.expect_lookup().returning(|id| {
            Ok((id != 404).then(|| PlayerProfile {
                user_id: id,
                username: format!("player{}", id),
                avatar: None,
                level: 2,
            }))
        });
        directory
    }

    async fn seeded(scores: &[(i64, u32)]) -> AppState {
        let state = TestStateBuilder::new()
            .with_directory(directory())
            .with_redis(Arc::new(MemoryRedis::new()))
            .build();
        for &(user_id, points) in scores {
            state
                .leaderboard
                .add_score(user_id, points, Some(1), Utc::now())
                .await
                .unwrap();
        }
        state
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(ListQuery::default().count(), DEFAULT_LIMIT);
        assert_eq!(ListQuery { limit: Some(0) }.count(), 1);
        assert_eq!(ListQuery { limit: Some(500) }.count(), MAX_LIMIT);
    }

    #[tokio::test]
    async fn global_listing_is_ranked_and_resolved() {
        let state = seeded(&[(1, 10), (2, 30), (404, 20)]).await;

        let response = global(State(state), Query(ListQuery::default()))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        let rows: Vec<_> = entries
            .iter()
            .map(|e| (e.rank, e.username.as_str(), e.score))
            .collect();
        assert_eq!(
            rows,
            vec![(1, "player2", 30), (2, "Unknown", 20), (3, "player1", 10)]
        );
    }

    #[tokio::test]
    async fn listing_respects_limit() {
        let state = seeded(&[(1, 10), (2, 30), (3, 20)]).await;

        let response = global(State(state), Query(ListQuery { limit: Some(2) }))
            .await
            .into_response();

        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn game_listing_reads_game_board() {
        let state = seeded(&[(1, 10)]).await;

        let response = game(State(state.clone()), Path(1), Query(ListQuery::default()))
            .await
            .into_response();
        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        assert_eq!(entries.len(), 1);

        let response = game(State(state), Path(2), Query(ListQuery::default()))
            .await
            .into_response();
        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn daily_and_weekly_include_todays_scores() {
        let state = seeded(&[(1, 10)]).await;

        let response = daily(State(state.clone()), Query(ListQuery::default()))
            .await
            .into_response();
        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        assert_eq!(entries[0].user_id, Some(1));

        let response = weekly(State(state), Query(ListQuery::default()))
            .await
            .into_response();
        let entries: Vec<LeaderboardEntry> = json_body(response).await;
        assert_eq!(entries[0].score, 10);
    }

    #[tokio::test]
    async fn my_rank_reports_tier_and_percentile() {
        let state = seeded(&[(1, 10), (2, 30), (3, 20), (4, 5)]).await;
        let user = AuthUser {
            id: 3,
            token: "tok".to_string(),
        };

        let response = my_rank(user, State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let rank: UserRankResponse = json_body(response).await;
        assert_eq!(rank.global_rank, 2);
        assert_eq!(rank.global_score, 20);
        assert_eq!(rank.total_players, 4);
        assert_eq!(rank.percentile, 75.0);
        assert_eq!(rank.tier, "Master");
        assert_eq!(rank.username.as_deref(), Some("player3"));
    }

    #[tokio::test]
    async fn unranked_user_is_not_found() {
        let state = seeded(&[(1, 10)]).await;

        let response = user_rank(State(state), Path(99)).await.into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let mut boards = MockBoardStore::new();
        boards
            .expect_top()
            .returning(|_, _| Err(anyhow::anyhow!("redis down")));
        let state = TestStateBuilder::new().with_board_store(boards).build();

        let response = top10(State(state)).await.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

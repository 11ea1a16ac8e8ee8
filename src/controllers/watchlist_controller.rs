use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::{
    services::{leaderboard_service, watchlist_service},
    AppState,
};

fn server_error(e: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
        .into_response()
}

// GET /watchlist/:scope/:owner
pub async fn get_watchlist(
    State(state): State<AppState>,
    Path((scope_id, owner_id)): Path<(String, String)>,
) -> Response {
    match watchlist_service::watchlist(&state, &scope_id, &owner_id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => server_error(e),
    }
}

// GET /usage
pub async fn get_usage(State(state): State<AppState>) -> Response {
    match state.quotes.usage().usage().await {
        Ok(u) => (
            StatusCode::OK,
            Json(json!({
                "count": u.count,
                "reset_at": u.reset_at_utc().to_rfc3339(),
            })),
        )
            .into_response(),
        Err(e) => server_error(e),
    }
}

// GET /leaderboard/:scope
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(scope_id): Path<String>,
) -> Response {
    let date = leaderboard_service::today();
    match leaderboard_service::standings(
        state.store.as_ref(),
        &scope_id,
        &date,
        leaderboard_service::STANDINGS_LIMIT,
    )
    .await
    {
        Ok(entries) => (
            StatusCode::OK,
            Json(json!({ "date": date, "entries": entries })),
        )
            .into_response(),
        Err(e) => server_error(e),
    }
}

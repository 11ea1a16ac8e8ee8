use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::AppState;

pub const COMMAND_TOKEN_HEADER: &str = "x-command-token";

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(COMMAND_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
}

/// Rejects relay requests that don't carry the configured shared secret.
/// With no `COMMAND_TOKEN` configured every request passes.
pub async fn require_command_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.settings.command_token.as_deref() else {
        return next.run(req).await;
    };

    if presented_token(req.headers()) == Some(expected) {
        return next.run(req).await;
    }

    tracing::warn!(path = %req.uri().path(), "rejected request without a valid command token");
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "missing or invalid command token" })),
    )
        .into_response()
}

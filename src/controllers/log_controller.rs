use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::{logging, AppState};

// GET /logs
pub async fn get_logs(State(state): State<AppState>) -> Response {
    match logging::tail(&state.settings.log_file, state.settings.log_tail_lines).await {
        Ok(lines) => (StatusCode::OK, Json(json!({ "logs": lines }))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %state.settings.log_file.display(), "could not read log file");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "could not read log file" })),
            )
                .into_response()
        }
    }
}

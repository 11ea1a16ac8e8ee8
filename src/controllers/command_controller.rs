use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    commands::{self, CommandContext},
    AppState,
};

/// A chat message relayed from the chat platform.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(flatten)]
    pub ctx: CommandContext,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandReply {
    pub reply: Option<String>,
}

// POST /commands
pub async fn post_command(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Response {
    if req.ctx.scope_id.trim().is_empty() || req.ctx.owner_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CommandReply {
                reply: Some("scope_id and owner_id are required".to_string()),
            }),
        )
            .into_response();
    }

    let reply = commands::dispatch(&state, &req.ctx, &req.content).await;
    (StatusCode::OK, Json(CommandReply { reply })).into_response()
}

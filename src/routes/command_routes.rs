use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use crate::{
    AppState,
    controllers::{command_controller, log_controller},
    middleware::auth,
};

/// Routes that can change state or expose logs sit behind the command token.
pub fn add_routes(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/commands", post(command_controller::post_command))
        .route("/logs", get(log_controller::get_logs))
        .route_layer(from_fn_with_state(state.clone(), auth::require_command_token));

    router.merge(guarded)
}

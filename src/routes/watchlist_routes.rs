use axum::{Router, routing::get};
use crate::{AppState, controllers::watchlist_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/watchlist/:scope/:owner", get(watchlist_controller::get_watchlist))
        .route("/usage", get(watchlist_controller::get_usage))
        .route("/leaderboard/:scope", get(watchlist_controller::get_leaderboard))
}

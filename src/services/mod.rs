pub mod finnhub;
pub mod db_init;
pub mod api_usage;
pub mod quote_gateway;
pub mod evaluator;
pub mod notifier;
pub mod alert_monitor;

pub mod watchlist_service;
pub mod leaderboard_service;

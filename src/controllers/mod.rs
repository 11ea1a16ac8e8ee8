pub mod home_controller;
pub mod command_controller;
pub mod watchlist_controller;
pub mod log_controller;

mod common;

use common::harness;
use stockwatch::{
    commands::{self, CommandContext},
    store::{LeaderboardStore, WatchlistStore},
    services::leaderboard_service,
};

fn ctx() -> CommandContext {
    CommandContext {
        scope_id: "guild-1".to_string(),
        owner_id: "user-1".to_string(),
        channel_id: "chan-9".to_string(),
        mentions_bot: false,
    }
}

#[tokio::test]
async fn addstock_tracks_with_current_price_as_baseline() {
    let h = harness();
    h.quotes.set("AAPL", 187.44);

    let reply = commands::dispatch(&h.state, &ctx(), "!addstock aapl").await.unwrap();

    assert_eq!(reply, "Added AAPL to your watchlist at $187.44.");
    let row = h.store.tracked("guild-1", "user-1", "AAPL").await.unwrap();
    assert_eq!(row.last_price, Some(187.44));
}

#[tokio::test]
async fn addstock_twice_does_not_duplicate_or_requote() {
    let h = harness();
    h.quotes.set("AAPL", 100.0);

    commands::dispatch(&h.state, &ctx(), "!addstock AAPL").await;
    let reply = commands::dispatch(&h.state, &ctx(), "!addstock AAPL").await.unwrap();

    assert_eq!(reply, "AAPL is already being tracked!");
    assert_eq!(h.quotes.calls_for("AAPL"), 1);
}

#[tokio::test]
async fn addstock_with_unknown_symbol_is_rejected() {
    let h = harness();

    let reply = commands::dispatch(&h.state, &ctx(), "!addstock NOPE").await.unwrap();

    assert_eq!(reply, "Could not find a price for NOPE.");
    assert!(h.store.tracked("guild-1", "user-1", "NOPE").await.is_none());
}

#[tokio::test]
async fn missing_argument_shows_usage() {
    let h = harness();

    let reply = commands::dispatch(&h.state, &ctx(), "!addstock").await.unwrap();
    assert_eq!(reply, "Usage: !addstock SYMBOL");

    let reply = commands::dispatch(&h.state, &ctx(), "!setthreshold").await.unwrap();
    assert_eq!(reply, "Usage: !setthreshold PERCENT");
}

#[tokio::test]
async fn removestock_reports_whether_anything_was_removed() {
    let h = harness();
    h.store.add_symbol("guild-1", "user-1", "TSLA", Some(200.0)).await.unwrap();

    let reply = commands::dispatch(&h.state, &ctx(), "!removestock tsla").await.unwrap();
    assert_eq!(reply, "Removed TSLA from your watchlist.");

    let reply = commands::dispatch(&h.state, &ctx(), "!removestock tsla").await.unwrap();
    assert_eq!(reply, "TSLA is not in your watchlist.");
}

#[tokio::test]
async fn watchlists_are_per_owner() {
    let h = harness();
    h.store.add_symbol("guild-1", "someone-else", "MSFT", Some(400.0)).await.unwrap();

    let reply = commands::dispatch(&h.state, &ctx(), "!watchlist").await.unwrap();
    assert_eq!(reply, "Your watchlist is empty.");

    h.store.add_symbol("guild-1", "user-1", "AAPL", Some(101.5)).await.unwrap();
    h.store.add_symbol("guild-1", "user-1", "NEW", None).await.unwrap();

    let reply = commands::dispatch(&h.state, &ctx(), "!watchlist").await.unwrap();
    assert!(reply.contains("AAPL"));
    assert!(reply.contains("$101.50"));
    assert!(reply.contains("(pending)"));
    assert!(!reply.contains("MSFT"));
}

#[tokio::test]
async fn setthreshold_validates_and_stores() {
    let h = harness();

    let reply = commands::dispatch(&h.state, &ctx(), "!setthreshold lots").await.unwrap();
    assert_eq!(reply, "Please provide a valid percentage.");

    let reply = commands::dispatch(&h.state, &ctx(), "!setthreshold -2").await.unwrap();
    assert_eq!(reply, "Threshold must be a positive number.");

    let reply = commands::dispatch(&h.state, &ctx(), "!setthreshold 2.5%").await.unwrap();
    assert_eq!(reply, "Notification threshold set to 2.5%.");
    assert_eq!(h.store.get_threshold("user-1", "guild-1").await.unwrap(), 2.5);
}

#[tokio::test]
async fn threshold_defaults_to_five_percent() {
    let h = harness();
    assert_eq!(h.store.get_threshold("user-1", "guild-1").await.unwrap(), 5.0);
}

#[tokio::test]
async fn setchannel_binds_current_or_given_channel() {
    let h = harness();

    let reply = commands::dispatch(&h.state, &ctx(), "!setchannel").await.unwrap();
    assert_eq!(reply, "Alerts for this server will be posted in <#chan-9>.");
    assert_eq!(
        h.store.get_notification_channel("guild-1").await.unwrap(),
        Some("chan-9".to_string())
    );

    commands::dispatch(&h.state, &ctx(), "!setchannel <#777>").await;
    assert_eq!(
        h.store.get_notification_channel("guild-1").await.unwrap(),
        Some("777".to_string())
    );
}

#[tokio::test]
async fn price_is_a_one_off_lookup() {
    let h = harness();
    h.quotes.set("AMZN", 178.2);

    let reply = commands::dispatch(&h.state, &ctx(), "!price amzn").await.unwrap();

    assert_eq!(reply, "Current price of AMZN: $178.20 USD");
    assert!(h.store.tracked("guild-1", "user-1", "AMZN").await.is_none());
}

#[tokio::test]
async fn leaderboard_lists_todays_scores() {
    let h = harness();
    let today = leaderboard_service::today();

    let reply = commands::dispatch(&h.state, &ctx(), "!leaderboard").await.unwrap();
    assert_eq!(reply, "No leaderboard entries for today yet.");

    h.store.add_score(&today, "guild-1", "a", 1.25).await.unwrap();
    h.store.add_score(&today, "guild-1", "b", -0.5).await.unwrap();

    let reply = commands::dispatch(&h.state, &ctx(), "!leaderboard").await.unwrap();
    assert!(reply.contains("1. <@a> +1.25%"));
    assert!(reply.contains("2. <@b> -0.50%"));
}

#[tokio::test]
async fn usage_reports_calls_this_month() {
    let h = harness();
    h.quotes.set("AAPL", 1.0);
    h.state.quotes.fetch_price("AAPL").await;

    let reply = commands::dispatch(&h.state, &ctx(), "!usage").await.unwrap();
    assert!(reply.starts_with("Quote API calls this month: 1 (resets "));
}

#[tokio::test]
async fn help_on_command_or_mention() {
    let h = harness();

    let reply = commands::dispatch(&h.state, &ctx(), "!help").await.unwrap();
    assert!(reply.contains("**!addstock SYMBOL**"));
    assert!(reply.contains("**!setthreshold PERCENT**"));

    let mut mention = ctx();
    mention.mentions_bot = true;
    let reply = commands::dispatch(&h.state, &mention, "<@bot> help please").await;
    assert!(reply.is_some());
}

#[tokio::test]
async fn ordinary_chatter_and_unknown_commands_are_ignored() {
    let h = harness();

    assert!(commands::dispatch(&h.state, &ctx(), "good morning").await.is_none());
    assert!(commands::dispatch(&h.state, &ctx(), "!dance").await.is_none());
    assert!(commands::dispatch(&h.state, &ctx(), "help").await.is_none());
}

#[test]
fn command_names_are_case_insensitive() {
    assert!(commands::lookup("AddStock").is_some());
    assert!(commands::lookup("nope").is_none());
}

//! Chat command surface.
//!
//! Commands are looked up by name in a fixed table; each entry carries its
//! usage line, a one-line summary for `help`, and the handler. Nothing in
//! here is used by the monitoring loop.

use std::{collections::HashMap, fmt::Write as _, sync::LazyLock};

use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::{
    error::WatchlistError,
    services::{
        leaderboard_service,
        watchlist_service::{self, TrackOutcome, UntrackOutcome},
    },
    AppState,
};

/// Where a message came from.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandContext {
    pub scope_id: String,
    pub owner_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub mentions_bot: bool,
}

type Handler =
    for<'a> fn(&'a AppState, &'a CommandContext, &'a [String]) -> BoxFuture<'a, String>;

pub struct CommandSpec {
    pub name: &'static str,
    pub args: &'static str,
    pub summary: &'static str,
    min_args: usize,
    handler: Handler,
}

impl CommandSpec {
    fn usage(&self, prefix: &str) -> String {
        if self.args.is_empty() {
            format!("Usage: {prefix}{}", self.name)
        } else {
            format!("Usage: {prefix}{} {}", self.name, self.args)
        }
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "addstock",
        args: "SYMBOL",
        summary: "Adds a stock to your watchlist (e.g. `addstock AAPL`).",
        min_args: 1,
        handler: add_stock,
    },
    CommandSpec {
        name: "removestock",
        args: "SYMBOL",
        summary: "Removes a stock from your watchlist.",
        min_args: 1,
        handler: remove_stock,
    },
    CommandSpec {
        name: "watchlist",
        args: "",
        summary: "Shows your watchlist and last known prices.",
        min_args: 0,
        handler: show_watchlist,
    },
    CommandSpec {
        name: "price",
        args: "SYMBOL",
        summary: "Fetches the current price of a stock.",
        min_args: 1,
        handler: show_price,
    },
    CommandSpec {
        name: "setthreshold",
        args: "PERCENT",
        summary: "Sets the price change that triggers an alert for you.",
        min_args: 1,
        handler: cmd_set_threshold,
    },
    CommandSpec {
        name: "setchannel",
        args: "[CHANNEL]",
        summary: "Posts this server's alerts in the given (or current) channel.",
        min_args: 0,
        handler: cmd_set_channel,
    },
    CommandSpec {
        name: "leaderboard",
        args: "",
        summary: "Shows today's best performing watchlists.",
        min_args: 0,
        handler: show_leaderboard,
    },
    CommandSpec {
        name: "usage",
        args: "",
        summary: "Shows quote API calls made this month.",
        min_args: 0,
        handler: show_usage,
    },
    CommandSpec {
        name: "help",
        args: "",
        summary: "Shows this help message.",
        min_args: 0,
        handler: show_help,
    },
];

static TABLE: LazyLock<HashMap<&'static str, &'static CommandSpec>> =
    LazyLock::new(|| COMMANDS.iter().map(|c| (c.name, c)).collect());

pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    TABLE.get(name.to_lowercase().as_str()).copied()
}

/// Handles one chat message. `None` means the bot stays quiet.
pub async fn dispatch(state: &AppState, ctx: &CommandContext, content: &str) -> Option<String> {
    let prefix = state.settings.command_prefix.as_str();
    let content = content.trim();

    let Some(rest) = content.strip_prefix(prefix) else {
        if ctx.mentions_bot && content.to_lowercase().contains("help") {
            return Some(help_text(prefix));
        }
        return None;
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    let args: Vec<String> = parts.map(str::to_string).collect();

    let spec = lookup(name)?;
    if args.len() < spec.min_args {
        return Some(spec.usage(prefix));
    }

    tracing::debug!(command = spec.name, scope = %ctx.scope_id, owner = %ctx.owner_id, "dispatching command");
    Some((spec.handler)(state, ctx, &args).await)
}

pub fn help_text(prefix: &str) -> String {
    let mut out = String::from("Here are the available commands:\n");
    for (i, c) in COMMANDS.iter().enumerate() {
        let call = if c.args.is_empty() {
            format!("{prefix}{}", c.name)
        } else {
            format!("{prefix}{} {}", c.name, c.args)
        };
        let _ = writeln!(out, "{}. **{call}** - {}", i + 1, c.summary);
    }
    out.push_str(
        "\nOnce a stock is added, you'll be notified here when its price moves by your threshold.",
    );
    out
}

fn failed(command: &str, e: WatchlistError) -> String {
    tracing::error!(command, error = %e, "command failed");
    "Something went wrong, please try again later.".to_string()
}

fn add_stock<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let sym = args[0].to_uppercase();
        match watchlist_service::track(state, &ctx.scope_id, &ctx.owner_id, &sym).await {
            Ok(TrackOutcome::Added(price)) => {
                format!("Added {sym} to your watchlist at ${price:.2}.")
            }
            Ok(TrackOutcome::AlreadyTracked) => format!("{sym} is already being tracked!"),
            Ok(TrackOutcome::Invalid) => format!("Could not find a price for {sym}."),
            Err(e) => failed("addstock", e),
        }
    })
}

fn remove_stock<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let sym = args[0].to_uppercase();
        match watchlist_service::untrack(state, &ctx.scope_id, &ctx.owner_id, &sym).await {
            Ok(UntrackOutcome::Removed) => format!("Removed {sym} from your watchlist."),
            Ok(UntrackOutcome::NotTracked) => format!("{sym} is not in your watchlist."),
            Err(e) => failed("removestock", e),
        }
    })
}

fn show_watchlist<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    _args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let view = match watchlist_service::watchlist(state, &ctx.scope_id, &ctx.owner_id).await {
            Ok(v) => v,
            Err(e) => return failed("watchlist", e),
        };

        if view.symbols.is_empty() {
            return "Your watchlist is empty.".to_string();
        }

        let mut out = format!("Your watchlist (alert at ±{}%):\n```\n", view.threshold);
        for s in &view.symbols {
            match s.last_price {
                Some(p) => {
                    let _ = writeln!(out, "{:<10} ${p:.2}", s.symbol);
                }
                None => {
                    let _ = writeln!(out, "{:<10} (pending)", s.symbol);
                }
            }
        }
        out.push_str("```");
        out
    })
}

fn show_price<'a>(
    state: &'a AppState,
    _ctx: &'a CommandContext,
    args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        match watchlist_service::quote(state, &args[0]).await {
            Some((sym, p)) => format!("Current price of {sym}: ${p:.2} USD"),
            None => format!("Could not fetch the price for {}.", args[0].to_uppercase()),
        }
    })
}

fn cmd_set_threshold<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let Ok(percent) = args[0].trim_end_matches('%').parse::<f64>() else {
            return "Please provide a valid percentage.".to_string();
        };

        match watchlist_service::set_threshold(state, &ctx.scope_id, &ctx.owner_id, percent).await {
            Ok(()) => format!("Notification threshold set to {percent}%."),
            Err(WatchlistError::InvalidThreshold(_)) => {
                "Threshold must be a positive number.".to_string()
            }
            Err(e) => failed("setthreshold", e),
        }
    })
}

fn cmd_set_channel<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        // accepts a raw id or a <#id> mention
        let channel = args
            .first()
            .map(|a| a.trim_start_matches("<#").trim_end_matches('>').to_string())
            .unwrap_or_else(|| ctx.channel_id.clone());

        match watchlist_service::bind_channel(state, &ctx.scope_id, &channel).await {
            Ok(()) => format!("Alerts for this server will be posted in <#{channel}>."),
            Err(WatchlistError::InvalidChannel) => "Please provide a channel.".to_string(),
            Err(e) => failed("setchannel", e),
        }
    })
}

fn show_leaderboard<'a>(
    state: &'a AppState,
    ctx: &'a CommandContext,
    _args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        let date = leaderboard_service::today();
        let entries = match leaderboard_service::standings(
            state.store.as_ref(),
            &ctx.scope_id,
            &date,
            leaderboard_service::STANDINGS_LIMIT,
        )
        .await
        {
            Ok(v) => v,
            Err(e) => return failed("leaderboard", e.into()),
        };

        if entries.is_empty() {
            return "No leaderboard entries for today yet.".to_string();
        }

        let mut out = format!("Leaderboard for {date}:\n");
        for (i, e) in entries.iter().enumerate() {
            let _ = writeln!(out, "{}. <@{}> {:+.2}%", i + 1, e.owner_id, e.score);
        }
        out
    })
}

fn show_usage<'a>(
    state: &'a AppState,
    _ctx: &'a CommandContext,
    _args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move {
        match state.quotes.usage().usage().await {
            Ok(u) => format!(
                "Quote API calls this month: {} (resets {}).",
                u.count,
                u.reset_at_utc().format("%Y-%m-%d")
            ),
            Err(e) => failed("usage", e.into()),
        }
    })
}

fn show_help<'a>(
    state: &'a AppState,
    _ctx: &'a CommandContext,
    _args: &'a [String],
) -> BoxFuture<'a, String> {
    Box::pin(async move { help_text(&state.settings.command_prefix) })
}

// This is the entry point of the bug report relay.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (game-server bridge, chat feed, storage)
// - `discord/` = Discord-specific adapters (report embeds)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Feed every chat event from stdin into the report pipeline

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::Config;
use crate::core::bug_reports::BugReportService;
use crate::discord::bug_reports::DiscordReportNotifier;
use crate::infra::bug_reports::{ChatFeed, InMemoryCooldownStore, SquadBridgeClient};
use serenity::http::Http;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::task::JoinSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    let config = Config::load()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let http = Arc::new(Http::new(&config.discord_token));
    let notifier = DiscordReportNotifier::new(Arc::clone(&http), config.channel_id);

    // The bridge serves both map lookups and in-game replies
    let bridge = SquadBridgeClient::new(&config.bridge_url, config.bridge_token.clone())?;

    let service = Arc::new(BugReportService::new(
        InMemoryCooldownStore::new(),
        bridge.clone(),
        bridge,
        notifier,
        config.reports.clone(),
    ));

    tracing::info!(
        channel_id = config.channel_id,
        cooldown_secs = config.reports.cooldown.as_secs(),
        brand_tag = %config.reports.brand_tag,
        "Bug report relay started"
    );

    // Background prune so the cooldown map only holds authors inside their window
    let pruner = Arc::clone(&service);
    let prune_interval = config.prune_interval;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(prune_interval).await;
            match pruner.prune_cooldowns(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Pruned expired cooldowns"),
                Err(err) => tracing::warn!("Cooldown prune failed: {}", err),
            }
        }
    });

    // ========================================================================
    // EVENT LOOP
    // ========================================================================
    // Each event gets its own task so a slow Discord or bridge call never holds
    // up the next chat line.

    let mut feed = ChatFeed::new(BufReader::new(tokio::io::stdin()));
    let mut in_flight = JoinSet::new();

    loop {
        match feed.next_event().await {
            Ok(Some(event)) => {
                let service = Arc::clone(&service);
                in_flight.spawn(async move {
                    service.handle(&event).await;
                });
            }
            Ok(None) => {
                tracing::info!("Chat feed closed, finishing in-flight reports");
                break;
            }
            Err(err) => {
                tracing::error!("Failed to read chat feed: {}", err);
                break;
            }
        }

        // Reap finished handlers so the set doesn't grow with every chat line
        while let Some(finished) = in_flight.try_join_next() {
            if let Err(err) = finished {
                tracing::error!("Chat event task panicked: {}", err);
            }
        }
    }

    while let Some(finished) = in_flight.join_next().await {
        if let Err(err) = finished {
            tracing::error!("Chat event task panicked: {}", err);
        }
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use teloxide::Bot;
use tracing::info;
use url::Url;

mod config;
mod leaderboard;
mod models;
mod store;
mod telegram;

use config::Config;
use leaderboard::{spawn_refresher, LeaderboardCache};
use telegram::BotState;

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up a local .env before anything reads the environment
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::parse();
    config.validate()?;

    let store = store::build_store(&config)?;
    let game_url = Url::parse(&config.game_url).context("Invalid GAME_URL")?;

    let ttl = Duration::from_secs(config.leaderboard_ttl_secs);
    let cache = LeaderboardCache::new(store.clone(), config.leaderboard_limit, ttl);
    info!(
        "Leaderboard: top {} players, cache TTL {:?}",
        config.leaderboard_limit,
        cache.ttl()
    );

    let refresher = spawn_refresher(
        cache.clone(),
        Duration::from_secs(config.refresh_delay_secs),
        ttl,
    );

    let bot = Bot::new(&config.bot_token);
    let state = BotState::new(store, cache, game_url);

    info!("Starting bot");
    telegram::run(bot, state).await;

    info!("Bot stopped, shutting down background tasks");
    refresher.shutdown().await;

    Ok(())
}

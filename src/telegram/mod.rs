pub mod handlers;
pub mod launch;

use std::sync::Arc;
use teloxide::dispatching::{HandlerExt, UpdateFilterExt};
use teloxide::prelude::*;
use teloxide::types::Update;
use teloxide::utils::command::BotCommands;
use tracing::{error, info};
use url::Url;

use crate::leaderboard::{LeaderboardCache, RankResolver};
use crate::store::ScoreStore;

/// Callback data carried by the "leaderboard" inline button.
pub const SHOW_LEADERBOARD: &str = "show_leaderboard";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot and get the game button")]
    Start,
    #[command(description = "🎮 Launch the game")]
    Play,
    #[command(description = "🏆 Leaderboard")]
    Leaderboard,
    #[command(description = "👤 My profile")]
    Profile,
    #[command(description = "❓ Help")]
    Help,
    #[command(description = "🔧 Score store diagnostics")]
    DebugDb,
}

/// Everything a handler needs, injected into the dispatcher once.
#[derive(Clone)]
pub struct BotState {
    pub store: Arc<dyn ScoreStore>,
    pub cache: LeaderboardCache,
    pub resolver: RankResolver,
    pub game_url: Url,
}

impl BotState {
    pub fn new(store: Arc<dyn ScoreStore>, cache: LeaderboardCache, game_url: Url) -> Self {
        BotState {
            resolver: RankResolver::new(store.clone()),
            store,
            cache,
            game_url,
        }
    }
}

/// Publish the command menu shown by Telegram clients.
async fn register_commands(bot: &Bot) {
    // /start is implicit in every client, keep it out of the menu
    let commands: Vec<_> = Command::bot_commands()
        .into_iter()
        .filter(|c| c.command != "/start" && c.command != "start")
        .collect();
    match bot.set_my_commands(commands).await {
        Ok(_) => info!("Bot command menu registered"),
        Err(e) => error!("Failed to register bot commands: {}", e),
    }
}

/// Run the dispatcher until Ctrl-C.
pub async fn run(bot: Bot, state: BotState) {
    register_commands(&bot).await;

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command),
        )
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback));

    info!("Dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/play", "arcade_bot").unwrap(), Command::Play);
        assert_eq!(
            Command::parse("/leaderboard@arcade_bot", "arcade_bot").unwrap(),
            Command::Leaderboard
        );
        assert_eq!(Command::parse("/debug_db", "arcade_bot").unwrap(), Command::DebugDb);
        assert!(Command::parse("/unknown", "arcade_bot").is_err());
    }

    #[test]
    fn test_menu_lists_commands() {
        let names: Vec<String> = Command::bot_commands().into_iter().map(|c| c.command).collect();
        assert!(names.iter().any(|c| c.ends_with("leaderboard")));
        assert!(names.iter().any(|c| c.ends_with("debug_db")));
    }
}

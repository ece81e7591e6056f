use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, User};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use super::launch::{game_link, launch_keyboard};
use super::{BotState, Command, SHOW_LEADERBOARD};
use crate::leaderboard::{view, Standing};
use crate::models::Rank;
use crate::store::StoreResult;

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> ResponseResult<()> {
    let user = match msg.from.as_ref() {
        Some(u) => u,
        None => {
            warn!("Ignoring {:?} without a sender in chat {}", cmd, msg.chat.id.0);
            return Ok(());
        }
    };
    let user_id = user.id.0.to_string();
    info!("Command {:?} from user {}", cmd, user_id);

    match cmd {
        Command::Start | Command::Play => send_game_button(&bot, msg.chat.id, user, &state).await,
        Command::Leaderboard => send_leaderboard(&bot, msg.chat.id, &user_id, &state).await,
        Command::Profile => {
            let text = match profile_text(&state, &user_id, &user.full_name()).await {
                Ok(text) => text,
                Err(e) => {
                    error!("Profile lookup for {} failed: {}", user_id, e);
                    view::PROFILE_UNAVAILABLE.to_string()
                }
            };
            send_html(&bot, msg.chat.id, text).await
        }
        Command::Help => send_html(&bot, msg.chat.id, help_text()).await,
        Command::DebugDb => {
            let text = match state.store.debug_snapshot().await {
                Ok(dump) => view::render_debug(state.store.name(), &dump),
                Err(e) => {
                    error!("debug_db failed: {}", e);
                    view::render_debug(state.store.name(), &format!("error: {}", e))
                }
            };
            send_html(&bot, msg.chat.id, text).await
        }
    }
}

pub async fn handle_callback(bot: Bot, query: CallbackQuery, state: BotState) -> ResponseResult<()> {
    // Clear the loading indicator on the button first
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!("Failed to answer callback query: {}", e);
    }

    if query.data.as_deref() != Some(SHOW_LEADERBOARD) {
        return Ok(());
    }

    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or_else(|| ChatId::from(query.from.id));
    let user_id = query.from.id.0.to_string();
    info!("Leaderboard button from user {}", user_id);
    send_leaderboard(&bot, chat_id, &user_id, &state).await
}

async fn send_game_button(bot: &Bot, chat_id: ChatId, user: &User, state: &BotState) -> ResponseResult<()> {
    let name = user.full_name();
    let link = game_link(&state.game_url, &user.id.0.to_string(), &name);
    info!("Game link for user {}: {}", user.id.0, link);

    bot.send_message(chat_id, view::render_welcome(&name))
        .parse_mode(ParseMode::Html)
        .reply_markup(launch_keyboard(link))
        .await?;
    Ok(())
}

async fn send_leaderboard(
    bot: &Bot,
    chat_id: ChatId,
    requester_id: &str,
    state: &BotState,
) -> ResponseResult<()> {
    let text = match leaderboard_text(state, requester_id).await {
        Ok(text) => text,
        Err(e) => {
            error!("Leaderboard for {} unavailable: {}", requester_id, e);
            view::UNAVAILABLE.to_string()
        }
    };
    send_html(bot, chat_id, text).await
}

async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> ResponseResult<()> {
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Top-N listing plus the requester's own position.
pub async fn leaderboard_text(state: &BotState, requester_id: &str) -> StoreResult<String> {
    let snapshot = state.cache.get_snapshot().await?;
    let standing = if snapshot.is_empty() {
        Standing {
            record: None,
            rank: Rank::Undetermined,
            in_snapshot: false,
        }
    } else {
        state.resolver.resolve(requester_id, &snapshot).await?
    };
    Ok(view::render_leaderboard(&snapshot, requester_id, &standing))
}

/// Profile card. The rank comes from the cached top-N when the player is
/// listed there, otherwise from the store.
pub async fn profile_text(state: &BotState, user_id: &str, display_name: &str) -> StoreResult<String> {
    let profile = match state.store.fetch_profile(user_id).await? {
        Some(p) => p,
        None => return Ok(view::render_profile(display_name, user_id, None, Rank::Undetermined)),
    };

    let listed = match state.cache.get_snapshot().await {
        Ok(snapshot) => snapshot.position_of(user_id),
        Err(e) => {
            warn!("Leaderboard unavailable for profile of {}: {}", user_id, e);
            None
        }
    };
    let rank = match listed {
        Some(idx) => Rank::Ranked(idx as u32 + 1),
        None => state.resolver.rank_of(&profile).await,
    };
    Ok(view::render_profile(display_name, user_id, Some(&profile), rank))
}

fn help_text() -> String {
    format!(
        "🎮 <b>Arcade bot help</b>\n\n{}\n\nHave a good game! 🍀",
        Command::descriptions()
    )
}

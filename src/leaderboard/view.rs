//! HTML message bodies for leaderboard and profile replies.
//!
//! Pure functions of their inputs; every user-supplied string is escaped.

use teloxide::utils::html;

use super::rank::Standing;
use crate::models::{LeaderboardSnapshot, PlayerRecord, Rank};

pub const UNAVAILABLE: &str = "😕 Leaderboard data is unavailable right now. Please try again later.";
pub const PROFILE_UNAVAILABLE: &str = "😕 Could not load your profile right now. Please try again later.";

/// Telegram rejects longer message texts.
pub const MESSAGE_LIMIT: usize = 4096;

pub fn render_leaderboard(
    snapshot: &LeaderboardSnapshot,
    requester_id: &str,
    standing: &Standing,
) -> String {
    if snapshot.is_empty() {
        return "The leaderboard is empty! Be the first to set a record! 🏆".to_string();
    }

    let tail = if standing.in_snapshot {
        String::new()
    } else {
        match &standing.record {
            Some(record) => format!(
                "\n...\nYour result:\n{}. 👉 {}: {} pts",
                standing.rank,
                html::bold(&html::escape(&record.name)),
                record.score
            ),
            None => "\nYou have no results yet. Play to earn a place in the ranking!".to_string(),
        }
    };

    let mut text = String::from("🏆 <b>LEADERBOARD</b> 🏆\n\n");
    // room for the tail and a closing "...\n" when entries get cut
    let budget = MESSAGE_LIMIT.saturating_sub(tail.chars().count() + 4);
    let mut used = text.chars().count();
    for (i, entry) in snapshot.entries.iter().enumerate() {
        let name = html::escape(&entry.name);
        let line = if entry.id == requester_id {
            format!("{}. 👉 {}: {} pts\n", i + 1, html::bold(&name), entry.score)
        } else {
            format!("{}. {}: {} pts\n", i + 1, name, entry.score)
        };
        let len = line.chars().count();
        if used + len > budget {
            text.push_str("...\n");
            break;
        }
        used += len;
        text.push_str(&line);
    }

    text.push_str(&tail);
    text
}

pub fn render_profile(
    display_name: &str,
    user_id: &str,
    record: Option<&PlayerRecord>,
    rank: Rank,
) -> String {
    let record = match record {
        Some(r) => r,
        None => {
            return format!(
                "👤 <b>Player profile</b>\n\n\
                 Name: {}\n\
                 ID: {}\n\n\
                 You haven't played yet. Press /play to start!",
                html::escape(display_name),
                user_id
            )
        }
    };

    let last_played = record
        .last_played
        .map(|ts| ts.format("%d.%m.%Y %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    let mut text = format!(
        "👤 <b>Player profile</b>\n\n\
         Name: {}\n\
         ID: {}\n\n\
         📊 <b>Stats:</b>\n\
         Best score: {} pts\n\
         Last played: {}\n",
        html::escape(&record.name),
        user_id,
        record.score,
        last_played
    );
    if let Some(n) = rank.position() {
        text.push_str(&format!("Rank: #{}\n", n));
    }
    text.push_str("\nPress /play to start a new game!");
    text
}

pub fn render_welcome(display_name: &str) -> String {
    format!(
        "Hi, {}!\n\nReady to dodge? 😉\nTap the button below to start!",
        html::bold(&html::escape(display_name))
    )
}

pub fn render_debug(store_name: &str, dump: &str) -> String {
    format!(
        "🔧 <b>Debug info ({})</b>:\n\n{}",
        html::escape(store_name),
        html::code_block(dump)
    )
}

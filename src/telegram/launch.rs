use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

use super::SHOW_LEADERBOARD;

/// Personalised game link: the client reads `userId` and `userName` to
/// attribute submitted scores.
pub fn game_link(base: &Url, user_id: &str, user_name: &str) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("userId", user_id)
        .append_pair("userName", user_name);
    url
}

/// Web App launch button on the first row, leaderboard button below it.
pub fn launch_keyboard(game_url: Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::web_app(
            "🚀 Launch the game!",
            WebAppInfo { url: game_url },
        )],
        vec![InlineKeyboardButton::callback(
            "🏆 Leaderboard",
            SHOW_LEADERBOARD,
        )],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_link_encodes_name() {
        let base = Url::parse("https://upione.example/e/").unwrap();
        let link = game_link(&base, "12345", "Jane Doe & Co");
        let pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("userId".to_string(), "12345".to_string()),
                ("userName".to_string(), "Jane Doe & Co".to_string()),
            ]
        );
        assert!(link.as_str().starts_with("https://upione.example/e/?userId=12345&userName="));
    }

    #[test]
    fn test_game_link_keeps_existing_query() {
        let base = Url::parse("https://game.example/play?mode=arcade").unwrap();
        let link = game_link(&base, "1", "A");
        assert_eq!(link.as_str(), "https://game.example/play?mode=arcade&userId=1&userName=A");
    }

    #[test]
    fn test_keyboard_layout() {
        let base = Url::parse("https://game.example/").unwrap();
        let kb = launch_keyboard(game_link(&base, "1", "A"));
        assert_eq!(kb.inline_keyboard.len(), 2);
        assert_eq!(kb.inline_keyboard[1][0].text, "🏆 Leaderboard");
    }
}

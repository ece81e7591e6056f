use clap::{Parser, ValueEnum};

/// Larger listings stop fitting in a single Telegram message.
pub const MAX_LEADERBOARD_LIMIT: usize = 50;

/// Which backend holds the player scores
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Firebase Realtime Database (`/scores/<id>` tree)
    Firebase,
    /// Supabase table queried through PostgREST
    Supabase,
}

/// Telegram bot for the arcade game: launch links, leaderboard and profiles
#[derive(Parser, Debug, Clone)]
#[command(name = "arcade-bot", version, about)]
pub struct Config {
    /// Telegram bot token
    #[arg(long, env = "TELOXIDE_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Base URL of the web game; user id and name are appended as query parameters
    #[arg(long, env = "GAME_URL")]
    pub game_url: String,

    /// Score store backend
    #[arg(long, env = "SCORE_STORE", value_enum, default_value = "supabase")]
    pub score_store: StoreKind,

    /// Firebase Realtime Database URL (firebase store only)
    #[arg(long, env = "FIREBASE_DB_URL")]
    pub firebase_db_url: Option<String>,

    /// Supabase project URL (supabase store only)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon API key (supabase store only)
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// Supabase table holding the scores
    #[arg(long, env = "SUPABASE_TABLE", default_value = "leaderboard")]
    pub supabase_table: String,

    /// Number of players shown on the leaderboard
    #[arg(long, env = "LEADERBOARD_LIMIT", default_value = "10")]
    pub leaderboard_limit: usize,

    /// Leaderboard cache lifetime and background refresh interval, in seconds
    #[arg(long, env = "LEADERBOARD_TTL_SECS", default_value = "15")]
    pub leaderboard_ttl_secs: u64,

    /// Delay before the first background refresh, in seconds
    #[arg(long, env = "REFRESH_DELAY_SECS", default_value = "5")]
    pub refresh_delay_secs: u64,

    /// Per-request timeout for Firebase calls, in seconds
    #[arg(long, env = "FIREBASE_TIMEOUT_SECS", default_value = "10")]
    pub firebase_timeout_secs: u64,

    /// Per-request timeout for Supabase calls, in seconds
    #[arg(long, env = "SUPABASE_TIMEOUT_SECS", default_value = "15")]
    pub supabase_timeout_secs: u64,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("TELOXIDE_TOKEN must not be empty");
        }
        match url::Url::parse(&self.game_url) {
            Ok(u) if u.scheme() == "https" || u.scheme() == "http" => {}
            Ok(_) => anyhow::bail!("GAME_URL must be an http(s) URL"),
            Err(e) => anyhow::bail!("GAME_URL is not a valid URL: {}", e),
        }
        match self.score_store {
            StoreKind::Firebase => {
                let url = self.firebase_db_url.as_deref().unwrap_or_default();
                if !url.starts_with("https://") {
                    anyhow::bail!("FIREBASE_DB_URL must be set to an https URL for the firebase store");
                }
            }
            StoreKind::Supabase => {
                let url = self.supabase_url.as_deref().unwrap_or_default();
                if !url.starts_with("https://") {
                    anyhow::bail!("SUPABASE_URL must be set to an https URL for the supabase store");
                }
                if self.supabase_anon_key.as_deref().unwrap_or_default().trim().is_empty() {
                    anyhow::bail!("SUPABASE_ANON_KEY is required for the supabase store");
                }
                if self.supabase_table.trim().is_empty() {
                    anyhow::bail!("SUPABASE_TABLE must not be empty");
                }
            }
        }
        if !(1..=MAX_LEADERBOARD_LIMIT).contains(&self.leaderboard_limit) {
            anyhow::bail!(
                "leaderboard_limit must be between 1 and {}",
                MAX_LEADERBOARD_LIMIT
            );
        }
        if self.leaderboard_ttl_secs == 0 {
            anyhow::bail!("leaderboard_ttl_secs must be positive");
        }
        if self.firebase_timeout_secs == 0 || self.supabase_timeout_secs == 0 {
            anyhow::bail!("store timeouts must be positive");
        }
        Ok(())
    }
}

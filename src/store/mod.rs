pub mod firebase;
#[cfg(test)]
pub mod memory;
pub mod supabase;

pub use firebase::FirebaseStore;
pub use supabase::SupabaseStore;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreKind};
use crate::models::{PlayerRecord, Rank};

/// Error bodies can be whole HTML pages; keep only the start.
const STATUS_BODY_CHARS: usize = 200;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Why a score store call produced no usable answer.
///
/// "Nothing there" is never an error: empty listings and absent profiles are
/// ordinary `Ok` values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure or per-call timeout
    #[error("score store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("score store returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected score store response: {0}")]
    Malformed(String),
}

/// Capability set every score backend must provide.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// At most `limit` records, best score first. Empty when there is no data.
    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<PlayerRecord>>;

    /// `Ok(None)` when the player has never submitted a score.
    async fn fetch_profile(&self, player_id: &str) -> StoreResult<Option<PlayerRecord>>;

    /// Players with a strictly greater score, plus one.
    async fn fetch_rank(&self, player_id: &str, score: u64) -> StoreResult<Rank>;

    /// Best-effort dump of what the backend holds, for the debug command.
    async fn debug_snapshot(&self) -> StoreResult<String>;

    /// Whether a rank lookup makes sense for this score. Backends disagree,
    /// so each one states its own threshold.
    fn is_rankable(&self, score: u64) -> bool {
        score > 0
    }
}

/// Build the backend selected in the configuration.
pub fn build_store(config: &Config) -> Result<Arc<dyn ScoreStore>> {
    let store: Arc<dyn ScoreStore> = match config.score_store {
        StoreKind::Firebase => {
            let url = config
                .firebase_db_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("FIREBASE_DB_URL is required for the firebase store"))?;
            Arc::new(FirebaseStore::new(
                url,
                Duration::from_secs(config.firebase_timeout_secs),
            )?)
        }
        StoreKind::Supabase => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL is required for the supabase store"))?;
            let key = config
                .supabase_anon_key
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_ANON_KEY is required for the supabase store"))?;
            Arc::new(SupabaseStore::new(
                url,
                key,
                &config.supabase_table,
                Duration::from_secs(config.supabase_timeout_secs),
            )?)
        }
    };
    info!("Score store selected: {}", store.name());
    Ok(store)
}

/// Decode a JSON response body.
///
/// 404 and 204 become `None`; other non-success statuses are errors.
pub(crate) async fn read_json(resp: Response) -> StoreResult<Option<serde_json::Value>> {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status,
            body: truncate_chars(body.trim(), STATUS_BODY_CHARS),
        });
    }

    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StoreError::Malformed(format!("invalid JSON: {}", e)))
}

/// Cut `text` to at most `max_chars` characters, marking the cut.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Backend base URLs must be absolute https URLs.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("invalid store URL '{}': {}", raw, e))?;
    if parsed.scheme() != "https" {
        anyhow::bail!("store URL must use https: {}", raw);
    }
    Ok(raw.trim_end_matches('/').to_string())
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{normalize_base_url, read_json, truncate_chars, ScoreStore, StoreError, StoreResult};
use crate::models::{timestamp_from_millis, PlayerRecord, Rank};

const DEBUG_DUMP_CHARS: usize = 1000;

/// Score store backed by the Firebase Realtime Database REST API.
///
/// Players live under `/scores/<id>` as `{ "name", "maxScore", "lastUpdate" }`.
pub struct FirebaseStore {
    http: Client,
    base_url: String,
}

impl FirebaseStore {
    pub fn new(db_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(db_url).context("Invalid Firebase database URL")?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(FirebaseStore { http, base_url })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> StoreResult<Option<Value>> {
        let url = format!("{}/{}.json", self.base_url, path);
        debug!("Firebase GET {} {:?}", url, query);
        let resp = self.http.get(&url).query(query).send().await?;
        read_json(resp).await
    }
}

#[async_trait]
impl ScoreStore for FirebaseStore {
    fn name(&self) -> &str {
        "Firebase"
    }

    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<PlayerRecord>> {
        let query = [
            ("orderBy", "\"maxScore\"".to_string()),
            ("limitToLast", limit.to_string()),
        ];
        match self.get("scores", &query).await? {
            Some(raw) => parse_top_players(&raw),
            None => Ok(vec![]),
        }
    }

    async fn fetch_profile(&self, player_id: &str) -> StoreResult<Option<PlayerRecord>> {
        match self.get(&format!("scores/{}", player_id), &[]).await? {
            Some(raw) => parse_profile(player_id, &raw),
            None => Ok(None),
        }
    }

    async fn fetch_rank(&self, _player_id: &str, score: u64) -> StoreResult<Rank> {
        if !self.is_rankable(score) {
            return Ok(Rank::Undetermined);
        }
        let query = match rank_query(score) {
            Some(query) => query,
            // nobody can be above the top of the range
            None => return Ok(Rank::Ranked(1)),
        };
        let better = match self.get("scores", &query).await? {
            Some(raw) => count_keys(&raw)?,
            None => 0,
        };
        Ok(Rank::from_better_count(better))
    }

    async fn debug_snapshot(&self) -> StoreResult<String> {
        match self.get("", &[]).await? {
            Some(raw) => {
                let pretty = serde_json::to_string_pretty(&raw)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                Ok(format!(
                    "Root data (truncated):\n{}",
                    truncate_chars(&pretty, DEBUG_DUMP_CHARS)
                ))
            }
            None => Ok("Database root is empty.".to_string()),
        }
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

/// Scores are written by a JavaScript client, so integral floats show up too.
fn score_value(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn parse_record(player_id: &str, data: &Value) -> Option<PlayerRecord> {
    let score = score_value(data.get("maxScore")?)?;
    Some(PlayerRecord {
        id: player_id.to_string(),
        name: data["name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player {}", player_id)),
        score,
        last_played: data["lastUpdate"].as_i64().and_then(timestamp_from_millis),
    })
}

/// `limitToLast` answers with an object keyed by player id, in ascending
/// score order. Children without a usable `maxScore` are skipped.
fn parse_top_players(raw: &Value) -> StoreResult<Vec<PlayerRecord>> {
    let children = match raw {
        Value::Null => return Ok(vec![]),
        Value::Object(map) => map,
        other => {
            return Err(StoreError::Malformed(format!(
                "expected object of scores, got {}",
                other
            )))
        }
    };

    let mut players: Vec<PlayerRecord> = children
        .iter()
        .filter_map(|(id, data)| {
            let record = parse_record(id, data);
            if record.is_none() {
                warn!("Firebase: skipping malformed score entry {}: {}", id, data);
            }
            record
        })
        .collect();

    players.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(players)
}

fn parse_profile(player_id: &str, raw: &Value) -> StoreResult<Option<PlayerRecord>> {
    match raw {
        Value::Null => Ok(None),
        Value::Object(_) => Ok(Some(PlayerRecord {
            id: player_id.to_string(),
            name: raw["name"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Player {}", player_id)),
            score: raw.get("maxScore").and_then(score_value).unwrap_or(0),
            last_played: raw["lastUpdate"].as_i64().and_then(timestamp_from_millis),
        })),
        other => Err(StoreError::Malformed(format!(
            "expected profile object for {}, got {}",
            player_id, other
        ))),
    }
}

/// Query for every player scoring strictly more than `score`.
///
/// `startAt` is inclusive, hence `score + 1`. The REST API refuses `shallow`
/// next to ordering parameters, so the full children come back and only
/// their keys are counted. `None` when nothing can score higher.
fn rank_query(score: u64) -> Option<[(&'static str, String); 2]> {
    let start = score.checked_add(1)?;
    Some([
        ("orderBy", "\"maxScore\"".to_string()),
        ("startAt", start.to_string()),
    ])
}

fn count_keys(raw: &Value) -> StoreResult<u64> {
    match raw {
        Value::Null => Ok(0),
        Value::Object(map) => Ok(map.len() as u64),
        other => Err(StoreError::Malformed(format!(
            "expected object of scores, got {}",
            other
        ))),
    }
}

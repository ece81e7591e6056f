use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use super::{normalize_base_url, read_json, ScoreStore, StoreError, StoreResult};
use crate::models::{PlayerRecord, Rank};

/// Score store backed by a Supabase (PostgREST) table with columns
/// `user_id`, `user_name`, `score`, `created_at`.
pub struct SupabaseStore {
    http: Client,
    table_url: String,
    table: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, anon_key: &str, table: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url).context("Invalid Supabase URL")?;
        if anon_key.trim().is_empty() {
            anyhow::bail!("Supabase anon key must not be empty");
        }
        if table.trim().is_empty() {
            anyhow::bail!("Supabase table name must not be empty");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(SupabaseStore {
            http,
            table_url: format!("{}/rest/v1/{}", base_url, table),
            table: table.to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    async fn select(&self, query: &[(&str, String)]) -> StoreResult<Option<Value>> {
        debug!("Supabase GET {} {:?}", self.table_url, query);
        let resp = self
            .http
            .get(&self.table_url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .query(query)
            .send()
            .await?;
        read_json(resp).await
    }
}

#[async_trait]
impl ScoreStore for SupabaseStore {
    fn name(&self) -> &str {
        "Supabase"
    }

    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<PlayerRecord>> {
        let query = [
            ("select", "user_id,user_name,score".to_string()),
            ("order", "score.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        match self.select(&query).await? {
            Some(raw) => parse_top_rows(&raw),
            None => Ok(vec![]),
        }
    }

    async fn fetch_profile(&self, player_id: &str) -> StoreResult<Option<PlayerRecord>> {
        let query = [
            ("select", "user_id,user_name,score,created_at".to_string()),
            ("user_id", format!("eq.{}", player_id)),
            ("limit", "1".to_string()),
        ];
        match self.select(&query).await? {
            Some(raw) => parse_profile_rows(player_id, &raw),
            None => Ok(None),
        }
    }

    async fn fetch_rank(&self, player_id: &str, score: u64) -> StoreResult<Rank> {
        let query = [
            ("select", "count".to_string()),
            ("score", format!("gt.{}", score)),
        ];
        let raw = self.select(&query).await?.unwrap_or(Value::Null);
        let rank = parse_count_rank(&raw);
        if rank == Rank::Undetermined {
            warn!(
                "Supabase: no usable count for player {} (score {}): {}",
                player_id, score, raw
            );
        }
        Ok(rank)
    }

    async fn debug_snapshot(&self) -> StoreResult<String> {
        let query = [("select", "*".to_string()), ("limit", "1".to_string())];
        let sample = match self.select(&query).await? {
            Some(Value::Array(rows)) => rows.into_iter().next(),
            Some(other) => {
                return Err(StoreError::Malformed(format!(
                    "expected array of rows, got {}",
                    other
                )))
            }
            None => None,
        };
        match sample {
            Some(row) => {
                let pretty = serde_json::to_string_pretty(&row)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                Ok(format!("Table: {}\nSample row:\n{}", self.table, pretty))
            }
            None => Ok(format!("Table: {}\nNo rows returned (check RLS policies).", self.table)),
        }
    }

    /// Every stored score, zero included, gets a rank.
    fn is_rankable(&self, _score: u64) -> bool {
        true
    }
}

// ── Parsing helpers ────────────────────────────────────────────────────────────

/// `user_id` may be a text or a bigint column.
fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn rows(raw: &Value) -> StoreResult<&Vec<Value>> {
    raw.as_array()
        .ok_or_else(|| StoreError::Malformed(format!("expected array of rows, got {}", raw)))
}

fn parse_top_rows(raw: &Value) -> StoreResult<Vec<PlayerRecord>> {
    let players = rows(raw)?
        .iter()
        .filter_map(|row| {
            let score = row["score"].as_u64();
            let id = id_string(&row["user_id"]);
            match (score, id) {
                (Some(score), Some(id)) => Some(PlayerRecord {
                    id,
                    name: row["user_name"].as_str().unwrap_or("Unknown").to_string(),
                    score,
                    last_played: None,
                }),
                _ => {
                    warn!("Supabase: skipping malformed leaderboard row: {}", row);
                    None
                }
            }
        })
        .collect();
    Ok(players)
}

fn parse_profile_rows(player_id: &str, raw: &Value) -> StoreResult<Option<PlayerRecord>> {
    let row = match rows(raw)?.first() {
        Some(row) => row,
        None => return Ok(None),
    };
    Ok(Some(PlayerRecord {
        id: id_string(&row["user_id"]).unwrap_or_else(|| player_id.to_string()),
        name: row["user_name"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Player {}", player_id)),
        score: row["score"].as_u64().unwrap_or(0),
        last_played: row["created_at"].as_str().and_then(parse_timestamp),
    }))
}

/// PostgREST renders `timestamptz` as RFC 3339, with or without fractional
/// seconds and with either `Z` or a numeric offset.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Supabase: unparsable timestamp '{}': {}", s, e);
            None
        }
    }
}

/// `select=count` yields `[{"count": n}]`; an empty array means nobody is better.
fn parse_count_rank(raw: &Value) -> Rank {
    match raw.as_array().map(Vec::as_slice) {
        Some([]) => Rank::Ranked(1),
        Some([first, ..]) => first["count"]
            .as_u64()
            .map(Rank::from_better_count)
            .unwrap_or(Rank::Undetermined),
        None => Rank::Undetermined,
    }
}

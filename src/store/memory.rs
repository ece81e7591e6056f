//! In-memory score store for exercising the leaderboard layer in tests.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ScoreStore, StoreError, StoreResult};
use crate::models::{PlayerRecord, Rank};

#[derive(Default)]
pub struct MemoryStore {
    players: Mutex<Vec<PlayerRecord>>,
    failing: AtomicBool,
    rank_failing: AtomicBool,
    /// Rank policy, mirrors the strictly-positive backend when false
    rank_zero_scores: bool,
    pub top_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub rank_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new(players: Vec<PlayerRecord>) -> Self {
        MemoryStore {
            players: Mutex::new(players),
            ..Default::default()
        }
    }

    pub fn ranking_zero_scores(mut self) -> Self {
        self.rank_zero_scores = true;
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rank_failing(&self, failing: bool) {
        self.rank_failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_players(&self, players: Vec<PlayerRecord>) {
        *self.players.lock().unwrap() = players;
    }

    pub fn calls(&self) -> (usize, usize, usize) {
        (
            self.top_calls.load(Ordering::SeqCst),
            self.profile_calls.load(Ordering::SeqCst),
            self.rank_calls.load(Ordering::SeqCst),
        )
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "store offline".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    fn name(&self) -> &str {
        "Memory"
    }

    async fn fetch_top(&self, limit: usize) -> StoreResult<Vec<PlayerRecord>> {
        self.top_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut players = self.players.lock().unwrap().clone();
        players.sort_by(|a, b| b.score.cmp(&a.score));
        players.truncate(limit);
        Ok(players)
    }

    async fn fetch_profile(&self, player_id: &str) -> StoreResult<Option<PlayerRecord>> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let players = self.players.lock().unwrap();
        Ok(players.iter().find(|p| p.id == player_id).cloned())
    }

    async fn fetch_rank(&self, _player_id: &str, score: u64) -> StoreResult<Rank> {
        self.rank_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        if self.rank_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Malformed("count missing".into()));
        }
        let players = self.players.lock().unwrap();
        let better = players.iter().filter(|p| p.score > score).count();
        Ok(Rank::from_better_count(better as u64))
    }

    async fn debug_snapshot(&self) -> StoreResult<String> {
        self.check()?;
        Ok(format!("{} players", self.players.lock().unwrap().len()))
    }

    fn is_rankable(&self, score: u64) -> bool {
        self.rank_zero_scores || score > 0
    }
}

pub fn player(id: &str, score: u64) -> PlayerRecord {
    PlayerRecord {
        id: id.to_string(),
        name: format!("Player {}", id),
        score,
        last_played: None,
    }
}

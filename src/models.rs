use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// A player's best result as held by the score store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    /// Telegram user id as the game client reports it
    pub id: String,
    pub name: String,
    /// Best score reached so far
    pub score: u64,
    pub last_played: Option<DateTime<Utc>>,
}

/// 1-based position among all players, ties collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Ranked(u32),
    /// Store error, player absent, or score not eligible for ranking
    Undetermined,
}

impl Rank {
    /// Rank of a player with `better` players strictly above them.
    pub fn from_better_count(better: u64) -> Self {
        match u32::try_from(better) {
            Ok(n) if n < u32::MAX => Rank::Ranked(n + 1),
            _ => Rank::Undetermined,
        }
    }

    pub fn position(&self) -> Option<u32> {
        match self {
            Rank::Ranked(n) => Some(*n),
            Rank::Undetermined => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Ranked(n) => write!(f, "{}", n),
            Rank::Undetermined => write!(f, "?"),
        }
    }
}

/// Immutable top-N ranking captured at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardSnapshot {
    /// Sorted by score descending, never longer than the configured limit
    pub entries: Vec<PlayerRecord>,
    pub captured_at: DateTime<Utc>,
}

impl LeaderboardSnapshot {
    /// Build a snapshot from whatever a store returned.
    ///
    /// The sort is stable so the store's own tie order survives, and the
    /// result is truncated to `limit` even if the store over-delivered.
    pub fn new(mut entries: Vec<PlayerRecord>, limit: usize, captured_at: DateTime<Utc>) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        LeaderboardSnapshot {
            entries,
            captured_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 0-based index of the player with the given id.
    pub fn position_of(&self, player_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == player_id)
    }
}

/// Convert an epoch-milliseconds timestamp; zero and out-of-range values mean "never".
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, score: u64) -> PlayerRecord {
        PlayerRecord {
            id: id.to_string(),
            name: format!("Player {}", id),
            score,
            last_played: None,
        }
    }

    #[test]
    fn test_snapshot_sorted_and_truncated() {
        let snap = LeaderboardSnapshot::new(
            vec![record("a", 10), record("b", 30), record("c", 20), record("d", 5)],
            3,
            Utc::now(),
        );
        let scores: Vec<u64> = snap.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![30, 20, 10]);
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn test_snapshot_keeps_store_tie_order() {
        let snap = LeaderboardSnapshot::new(
            vec![record("x", 50), record("y", 50), record("z", 70)],
            10,
            Utc::now(),
        );
        let ids: Vec<&str> = snap.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "x", "y"]);
    }

    #[test]
    fn test_position_of() {
        let snap = LeaderboardSnapshot::new(vec![record("A", 100), record("B", 90)], 10, Utc::now());
        assert_eq!(snap.position_of("B"), Some(1));
        assert_eq!(snap.position_of("C"), None);
    }

    #[test]
    fn test_rank_from_better_count() {
        assert_eq!(Rank::from_better_count(0), Rank::Ranked(1));
        assert_eq!(Rank::from_better_count(3), Rank::Ranked(4));
        assert_eq!(Rank::from_better_count(u64::MAX), Rank::Undetermined);
        assert_eq!(Rank::Ranked(7).to_string(), "7");
        assert_eq!(Rank::Undetermined.to_string(), "?");
    }

    #[test]
    fn test_timestamp_from_millis() {
        assert!(timestamp_from_millis(0).is_none());
        assert!(timestamp_from_millis(-5).is_none());
        let ts = timestamp_from_millis(1_700_000_000_000).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }
}

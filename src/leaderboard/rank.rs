use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::{LeaderboardSnapshot, PlayerRecord, Rank};
use crate::store::{ScoreStore, StoreResult};

/// Where the requesting player stands.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    /// `None` when the player has no record at all
    pub record: Option<PlayerRecord>,
    pub rank: Rank,
    /// Whether the rank came from the cached top-N rather than a store query
    pub in_snapshot: bool,
}

/// Locates a player in the ranking, falling back to the store when they are
/// outside the cached top-N.
#[derive(Clone)]
pub struct RankResolver {
    store: Arc<dyn ScoreStore>,
}

impl RankResolver {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        RankResolver { store }
    }

    /// Resolve `requester_id` against `snapshot`.
    ///
    /// A player listed in the snapshot is answered without any store call.
    /// Otherwise their profile is fetched (an error here means the data is
    /// unavailable) and, if the backend considers the score rankable, the
    /// rank is counted by the store. A failed rank count degrades to
    /// `Rank::Undetermined` rather than failing the whole lookup.
    pub async fn resolve(
        &self,
        requester_id: &str,
        snapshot: &LeaderboardSnapshot,
    ) -> StoreResult<Standing> {
        if let Some(idx) = snapshot.position_of(requester_id) {
            return Ok(Standing {
                record: Some(snapshot.entries[idx].clone()),
                rank: Rank::Ranked(idx as u32 + 1),
                in_snapshot: true,
            });
        }

        debug!(
            "Player {} not in top-{}, fetching profile",
            requester_id,
            snapshot.len()
        );
        let profile = match self.store.fetch_profile(requester_id).await? {
            Some(p) => p,
            None => {
                info!("No profile for player {}, rank undetermined", requester_id);
                return Ok(Standing {
                    record: None,
                    rank: Rank::Undetermined,
                    in_snapshot: false,
                });
            }
        };

        let rank = self.rank_of(&profile).await;
        info!("Resolved rank {} for player {}", rank, requester_id);

        Ok(Standing {
            record: Some(profile),
            rank,
            in_snapshot: false,
        })
    }

    /// Ask the store for the rank of a known profile, honouring the
    /// backend's eligibility threshold.
    pub async fn rank_of(&self, profile: &PlayerRecord) -> Rank {
        if !self.store.is_rankable(profile.score) {
            debug!(
                "Score {} of player {} is not rankable on {}",
                profile.score,
                profile.id,
                self.store.name()
            );
            return Rank::Undetermined;
        }
        match self.store.fetch_rank(&profile.id, profile.score).await {
            Ok(rank) => rank,
            Err(e) => {
                warn!("Rank lookup for player {} failed: {}", profile.id, e);
                Rank::Undetermined
            }
        }
    }
}

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use super::cache::LeaderboardCache;

/// Handle to the background refresh task.
pub struct RefresherHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RefresherHandle {
    /// Signal the task to stop and wait until it has exited.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.task.await {
            Ok(()) => info!("Leaderboard refresher stopped"),
            Err(e) if e.is_cancelled() => info!("Leaderboard refresher cancelled"),
            Err(e) => error!("Leaderboard refresher panicked: {}", e),
        }
    }
}

/// Spawns a task that keeps the leaderboard cache warm.
///
/// The first refresh happens after `initial_delay`, then once per `interval`.
/// A failed refresh is logged and retried on the next tick; the cached
/// snapshot is left as it was.
pub fn spawn_refresher(
    cache: LeaderboardCache,
    initial_delay: Duration,
    interval: Duration,
) -> RefresherHandle {
    let (tx, mut rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        info!(
            "Leaderboard refresher started (delay={:?}, interval={:?})",
            initial_delay, interval
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut rx => break,
                _ = ticker.tick() => {
                    if let Err(e) = cache.refresh().await {
                        warn!("Background leaderboard refresh failed: {}", e);
                    }
                }
            }
        }
    });

    RefresherHandle {
        shutdown: Some(tx),
        task,
    }
}

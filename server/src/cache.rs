use std::sync::Arc;

use dashmap::DashMap;
use scouted_shared::{Gender, Leaderboard, WeekCode};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub gender: Gender,
    pub week: WeekCode,
    pub data_version: u32,
}

type Slot = Arc<OnceCell<Arc<Leaderboard>>>;

/// Cumulative leaderboards keyed by (gender, week, data version).
///
/// Concurrent misses on one key share a single build. A failed build leaves the key empty
/// so the next request retries it.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardCache {
    entries: Arc<DashMap<CacheKey, Slot>>,
}

impl LeaderboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed leaderboards held.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached leaderboard for `key`, running `build` on the blocking pool on a miss.
    pub async fn get_or_build<F>(
        &self,
        key: CacheKey,
        build: F,
    ) -> Result<Arc<Leaderboard>, ApiError>
    where
        F: FnOnce() -> scouted_shared::Result<Leaderboard> + Send + 'static,
    {
        // Clone the slot out so no map shard stays locked across the await.
        let slot: Slot = self.entries.entry(key).or_default().value().clone();

        let result = slot
            .get_or_try_init(|| async move {
                debug!(gender = %key.gender, week = %key.week, "building leaderboard");
                let leaderboard = tokio::task::spawn_blocking(build)
                    .await
                    .map_err(|e| ApiError::Internal(format!("leaderboard build failed: {e}")))??;
                Ok::<_, ApiError>(Arc::new(leaderboard))
            })
            .await
            .cloned();

        if result.is_err() {
            self.entries.remove_if(&key, |_, slot| !slot.initialized());
        }
        result
    }

    /// Drop every entry built from a data version other than `current`.
    pub fn retain_version(&self, current: u32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.data_version == current);
        before - self.entries.len()
    }
}

use std::sync::Arc;

use scouted_shared::{Gender, Leaderboard, WeekCode, aggregate};
use tokio::sync::RwLock;

use crate::cache::{CacheKey, LeaderboardCache};
use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    /// Swapped wholesale by the catalog refresher when the data version changes.
    pub catalog: Arc<RwLock<Arc<Catalog>>>,
    pub cache: LeaderboardCache,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Arc::new(catalog))),
            cache: LeaderboardCache::new(),
            settings: Arc::new(settings),
        }
    }

    pub async fn catalog(&self) -> Arc<Catalog> {
        self.catalog.read().await.clone()
    }

    /// Cumulative leaderboard for `gender` through `week`, shared with any concurrent caller.
    pub async fn leaderboard(
        &self,
        catalog: Arc<Catalog>,
        gender: Gender,
        week: WeekCode,
    ) -> Result<Arc<Leaderboard>, ApiError> {
        let weeks = catalog.cumulative_weeks(gender, week)?;
        let key = CacheKey {
            gender,
            week,
            data_version: catalog.version(),
        };
        self.cache
            .get_or_build(key, move || aggregate(catalog.as_ref(), gender, &weeks))
            .await
    }
}

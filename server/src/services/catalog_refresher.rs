use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(state.settings.refresh_interval);
    // The first tick fires immediately; startup already scanned.
    interval.tick().await;

    loop {
        interval.tick().await;

        if let Err(e) = refresh(&state).await {
            warn!(error = %e, "catalog rescan failed, keeping previous catalog");
        }
    }
}

/// Rescan the data directory and swap the catalog in when its data version moved.
///
/// Returns whether a new catalog was installed.
pub async fn refresh(state: &AppState) -> Result<bool, ApiError> {
    let root = state.settings.data_dir.clone();
    let scanned = tokio::task::spawn_blocking(move || Catalog::scan(root))
        .await
        .map_err(|e| ApiError::Internal(format!("catalog scan failed: {e}")))??;

    let version = scanned.version();
    {
        let mut current = state.catalog.write().await;
        if current.version() == version {
            return Ok(false);
        }
        *current = Arc::new(scanned);
    }

    let evicted = state.cache.retain_version(version);
    info!(
        data_version = %format!("{version:08x}"),
        evicted,
        "snapshot catalog changed"
    );
    Ok(true)
}

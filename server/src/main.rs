mod app;
mod cache;
mod catalog;
mod config;
mod error;
mod routes;
mod services;
mod state;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::from_env();
    let data_dir = settings.data_dir.display().to_string();
    let catalog = match Catalog::scan(&settings.data_dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, %data_dir, "failed to scan snapshot directory");
            return;
        }
    };
    if catalog.weeks().is_empty() {
        tracing::warn!(%data_dir, "no weekly player snapshots found");
    }
    tracing::info!(
        %data_dir,
        weeks = catalog.weeks().len(),
        files = catalog.file_count(),
        latest_week = ?catalog.latest_week().map(|week| week.to_string()),
        data_version = %format!("{:08x}", catalog.version()),
        "snapshot catalog loaded"
    );

    let state = AppState::new(catalog, settings);

    tokio::spawn(services::catalog_refresher::run(state.clone()));

    let app = app::build_app(state);

    let addr = format!("0.0.0.0:{}", config::server_port());
    tracing::info!("Scouted leaderboard server listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind TCP listener");
            return;
        }
    };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server failed");
    }

    tracing::info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

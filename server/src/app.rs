use axum::Router;
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::api::health))
        .route("/api/weeks", get(routes::api::get_weeks))
        .route("/api/players", get(routes::api::get_players))
        .route("/api/player/{name}", get(routes::api::get_player))
        .route("/api/matches", get(routes::api::get_matches))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

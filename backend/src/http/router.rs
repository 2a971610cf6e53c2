//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let league = "/leagues/{league_id}";
    let tournament = "/leagues/{league_id}/tournaments/{tournament_id}";

    let api_v1 = Router::new()
        // Teams
        .route(
            &format!("{league}/teams"),
            get(handlers::list_teams).post(handlers::create_team),
        )
        .route(
            &format!("{league}/teams/{{team_id}}"),
            get(handlers::get_team)
                .patch(handlers::update_team)
                .delete(handlers::delete_team),
        )
        // Players
        .route(
            &format!("{league}/players"),
            get(handlers::list_players).post(handlers::create_player),
        )
        .route(
            &format!("{league}/players/{{player_id}}"),
            get(handlers::get_player)
                .patch(handlers::update_player)
                .delete(handlers::delete_player),
        )
        // Tournaments
        .route(
            &format!("{league}/tournaments"),
            get(handlers::list_tournaments).post(handlers::create_tournament),
        )
        .route(
            tournament,
            get(handlers::get_tournament)
                .patch(handlers::update_tournament)
                .delete(handlers::delete_tournament),
        )
        // Matchdays
        .route(
            &format!("{tournament}/matchdays"),
            get(handlers::list_matchdays).post(handlers::create_matchday),
        )
        .route(
            &format!("{tournament}/matchdays/{{matchday_id}}"),
            get(handlers::get_matchday)
                .patch(handlers::update_matchday)
                .delete(handlers::delete_matchday),
        )
        // Matches
        .route(
            &format!("{tournament}/matches"),
            get(handlers::list_matches).post(handlers::create_match),
        )
        .route(
            &format!("{tournament}/matches/scores-batch"),
            patch(handlers::update_scores_batch),
        )
        .route(
            &format!("{tournament}/matches/{{match_id}}"),
            get(handlers::get_match)
                .patch(handlers::update_match)
                .delete(handlers::delete_match),
        )
        .route(
            &format!("{tournament}/matches/{{match_id}}/score"),
            patch(handlers::update_score),
        )
        // Standings
        .route(
            &format!("{tournament}/standings"),
            get(handlers::get_standings),
        )
        .route(
            &format!("{tournament}/standings/recalculate"),
            post(handlers::recalculate_standings),
        )
        .route("/standings/by-matchday", post(handlers::standings_by_matchday));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::services::TriggerMode;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Arc::new(LocalRepository::new()), TriggerMode::Inline);
        let _router = create_router(state);
    }
}

/// API route modules
pub mod health;
pub mod playlists;

use crate::{middleware, state::AppState};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;

/// All routes, mounted under `/api`
pub fn router(app_state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health::health));

    let protected_routes = Router::new()
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(playlists::get_playlist)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route("/playlists/:id/reparent", post(playlists::reparent_playlist))
        .route(
            "/playlists/:id/tracks",
            get(playlists::get_tracks).post(playlists::add_track),
        )
        .route(
            "/playlists/:id/tracks/:track_id",
            delete(playlists::remove_track),
        )
        .route(
            "/playlists/:id/tracks/:track_id/move",
            patch(playlists::move_track),
        )
        .route("/playlists/:id/items", get(playlists::get_items))
        .route(
            "/playlists/:id/items/reorder",
            patch(playlists::reorder_items),
        )
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&app_state.auth_service),
            middleware::auth_middleware,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(app_state)
}

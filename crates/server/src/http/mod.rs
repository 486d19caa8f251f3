use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::trace::TraceLayer;

use crate::{AppState, routes};

pub mod auth;

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/info", get(routes::info::get_info))
        .merge(routes::projects::router(&state))
        .merge(routes::members::router())
        .layer(from_fn_with_state(state.clone(), auth::resolve_member));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

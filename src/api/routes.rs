use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Session lifecycle
        .route("/api/session/start", post(handlers::start_session))
        .route("/api/session/step", post(handlers::step_session))
        .route("/api/session/stop", post(handlers::stop_session))
        .route("/api/session/:id", get(handlers::get_session))
        // Control surface
        .route("/api/control", post(handlers::control_handler))
        // Lattice surface
        .route("/api/lattice", post(handlers::lattice_handler))
        // Oracle dashboard
        .route("/api/cosmic", get(handlers::cosmic_handler))
        // Health probe
        .route("/health", get(handlers::health_handler))
        .with_state(state)
        .layer(cors)
}

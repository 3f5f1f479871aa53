//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, put},
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
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Teacher CRUD and login
        .route(
            "/teachers",
            get(handlers::list_teachers).post(handlers::register_teacher),
        )
        .route("/teachers/login", post(handlers::login_teacher))
        .route(
            "/teachers/{teacher_id}",
            put(handlers::update_teacher).delete(handlers::delete_teacher),
        )
        // Class CRUD
        .route(
            "/classes",
            get(handlers::list_classes).post(handlers::create_class),
        )
        .route(
            "/classes/{class_id}",
            put(handlers::update_class).delete(handlers::delete_class),
        )
        // Subject CRUD
        .route(
            "/subjects",
            get(handlers::list_subjects).post(handlers::create_subject),
        )
        .route(
            "/subjects/{subject_id}",
            put(handlers::update_subject).delete(handlers::delete_subject),
        )
        // Allocation aggregation view
        .route("/allocations/view", get(handlers::allocation_view))
        .route(
            "/allocations/view/{teacher_id}",
            get(handlers::allocation_view_for_teacher),
        )
        // Preferences
        .route("/preferences/{teacher_id}", get(handlers::get_preferences))
        .route("/preferences", post(handlers::submit_preferences));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .merge(api)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo, "2024-2025");
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}

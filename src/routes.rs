// src/routes.rs

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{documents, leaderboard, questions, stats},
    state::AppState,
    utils::api_key::{API_KEY_HEADER, admin_key_middleware, api_key_middleware},
};

/// Assembles the main application router.
///
/// * `/collections/...` is the hosted collection API, guarded by API keys.
/// * `/api/...` is the fail-soft query API used by the UI.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);

    let read_routes = Router::new()
        .route("/{collection}/documents/search", get(documents::search_documents))
        .route("/{collection}/documents/{id}", get(documents::get_document))
        .layer(middleware::from_fn_with_state(state.clone(), api_key_middleware));

    let write_routes = Router::new()
        .route("/{collection}/documents", post(documents::upsert_document))
        .layer(middleware::from_fn_with_state(state.clone(), admin_key_middleware));

    let api_routes = Router::new()
        .route("/questions/search", get(questions::search_questions))
        .route("/leaderboard", get(leaderboard::get_leaderboard))
        .route("/stats", get(stats::get_stats))
        .route("/status", get(stats::get_status));

    Router::new()
        .nest("/collections", read_routes.merge(write_routes))
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// src/handlers/stats.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::search::{Aggregator, QueryEngine};

pub async fn get_stats(State(aggregator): State<Arc<Aggregator>>) -> impl IntoResponse {
    Json(aggregator.global_stats().await)
}

/// Whether the search backend passed its configuration check.
pub async fn get_status(State(engine): State<Arc<QueryEngine>>) -> impl IntoResponse {
    Json(json!({ "search_available": engine.is_available() }))
}

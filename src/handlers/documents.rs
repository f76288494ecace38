// src/handlers/documents.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    search::request::SearchRequest,
    store::{CollectionName, DocumentStore, UpsertOutcome},
};

/// Raw collection search over the wire request shape.
pub async fn search_documents(
    State(store): State<Arc<DocumentStore>>,
    Path(collection): Path<String>,
    Query(request): Query<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    let collection: CollectionName = collection.parse()?;
    let response = store.search_json(collection, &request).await?;

    Ok(Json(response))
}

pub async fn get_document(
    State(store): State<Arc<DocumentStore>>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let collection: CollectionName = collection.parse()?;
    let document = store.get_json(collection, &id).await?;

    Ok(Json(document))
}

/// Inserts or replaces one document.
///
/// 201 when the document is new, 200 when it replaced (or matched) a stored one.
pub async fn upsert_document(
    State(store): State<Arc<DocumentStore>>,
    Path(collection): Path<String>,
    Json(document): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let collection: CollectionName = collection.parse()?;
    let outcome = store.upsert_json(collection, document).await?;

    let status = match outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated | UpsertOutcome::Unchanged => StatusCode::OK,
    };

    Ok((status, Json(json!({ "outcome": outcome }))))
}

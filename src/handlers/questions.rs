// src/handlers/questions.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{error::AppError, models::search::QuestionSearchParams, search::QueryEngine};

/// Searches practice questions.
///
/// Invalid parameters are a 400; backend trouble is an empty result.
pub async fn search_questions(
    State(engine): State<Arc<QueryEngine>>,
    Query(params): Query<QuestionSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(engine.search_questions(&params).await))
}

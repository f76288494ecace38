// src/handlers/leaderboard.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{error::AppError, models::search::LeaderboardParams, search::QueryEngine};

/// Global leaderboard, optionally narrowed to a country or city.
pub async fn get_leaderboard(
    State(engine): State<Arc<QueryEngine>>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(engine.global_leaderboard(&params).await))
}

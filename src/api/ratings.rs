use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::validation::{rating_input, validate_id};
use super::{ApiError, ApiResponse, AppState, AverageRatingDto, MessageResponse, RatingDto};
use crate::domain::{RatingId, StoreId};
use crate::services::{AuthUser, RatingError};

impl From<RatingError> for ApiError {
    fn from(err: RatingError) -> Self {
        match err {
            RatingError::Validation(msg) => Self::validation(msg),
            RatingError::StoreNotFound(id) => Self::not_found("Store", id),
            RatingError::RatingNotFound(id) => Self::not_found("Rating", id),
            RatingError::Database(msg) => Self::DatabaseError(msg),
            RatingError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRatingRequest {
    /// Kept untyped so a missing, null or mistyped value is reported as a
    /// validation error instead of a body rejection.
    pub rating: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SubmitRatingResponse {
    pub message: String,
    pub rating_id: i32,
    pub store_id: i32,
    pub rating: i64,
    pub created: bool,
}

/// POST /api/ratings/{store_id}
/// Creates the caller's rating for the store, or replaces their earlier one
pub async fn submit_rating(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(store_id): Path<i32>,
    Json(payload): Json<SubmitRatingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store_id = StoreId::new(validate_id("store", store_id)?);
    let rating = rating_input(payload.rating.as_ref())?;

    let outcome = state
        .rating_service()
        .submit_rating(user.id, store_id, rating)
        .await?;

    let (status, message) = if outcome.is_created() {
        (StatusCode::CREATED, "Rating submitted successfully!")
    } else {
        (StatusCode::OK, "Rating updated successfully!")
    };

    Ok((
        status,
        Json(ApiResponse::success(SubmitRatingResponse {
            message: message.to_string(),
            rating_id: outcome.id().value(),
            store_id: store_id.value(),
            rating,
            created: outcome.is_created(),
        })),
    ))
}

/// GET /api/ratings/{store_id}
pub async fn list_for_store(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<RatingDto>>>, ApiError> {
    let store_id = StoreId::new(validate_id("store", store_id)?);

    let rows = state.rating_service().ratings_for_store(store_id).await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(RatingDto::from).collect(),
    )))
}

/// GET /api/ratings/{store_id}/average
pub async fn average_for_store(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<i32>,
) -> Result<Json<ApiResponse<AverageRatingDto>>, ApiError> {
    let store_id = StoreId::new(validate_id("store", store_id)?);

    let average = state.rating_service().average_rating(store_id).await?;

    Ok(Json(ApiResponse::success(AverageRatingDto::new(
        store_id.value(),
        average,
    ))))
}

/// DELETE /api/admin/ratings/{id}
pub async fn delete_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = RatingId::new(validate_id("rating", id)?);

    state.rating_service().delete_rating(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Rating deleted successfully.",
    ))))
}

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, OwnerRatingDto, StoreDto};
use crate::services::AuthUser;

#[derive(Debug, Serialize)]
pub struct OwnerStoresResponse {
    pub stores: Vec<StoreDto>,
}

/// GET /api/owner/stores
/// The caller's stores with their average ratings
pub async fn my_stores(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<OwnerStoresResponse>>, ApiError> {
    let stores = state.store_service().owner_stores(user.id).await?;

    Ok(Json(ApiResponse::success(OwnerStoresResponse {
        stores: stores.into_iter().map(StoreDto::from).collect(),
    })))
}

/// GET /api/owner/ratings
/// Every rating submitted for any of the caller's stores
pub async fn my_ratings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<Vec<OwnerRatingDto>>>, ApiError> {
    let rows = state.rating_service().ratings_for_owner(user.id).await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(OwnerRatingDto::from).collect(),
    )))
}

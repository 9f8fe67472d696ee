use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{store_query, validate_id};
use super::{ApiError, ApiResponse, AppState, MessageResponse, PagedResponse, StoreDto, StoreListParams};
use crate::domain::{StoreId, UserId};
use crate::services::{AuthUser, StoreError, StoreInput};

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => Self::validation(msg),
            StoreError::NotFound(id) => Self::not_found("Store", id),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) => Self::DatabaseError(msg),
            StoreError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub name: String,
    #[serde(alias = "email")]
    pub contact_email: String,
    #[serde(alias = "address")]
    pub location: String,
    #[serde(alias = "store_owner_id", alias = "ownerId")]
    pub owner_id: Option<i32>,
}

impl StoreRequest {
    fn into_input(self) -> Result<StoreInput, ApiError> {
        let owner_id = self
            .owner_id
            .map(|id| validate_id("owner", id).map(UserId::new))
            .transpose()?;

        Ok(StoreInput {
            name: self.name,
            contact_email: self.contact_email,
            location: self.location,
            owner_id,
        })
    }
}

/// GET /api/stores
/// Public listing; includes the caller's own rating when authenticated.
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthUser>>,
    Query(params): Query<StoreListParams>,
) -> Result<Json<ApiResponse<PagedResponse<StoreDto>>>, ApiError> {
    let query = store_query(&state.config().listing, params)?;
    let viewer = viewer.map(|Extension(user)| user.id);

    let page = state.store_service().list_stores(&query, viewer).await?;

    Ok(Json(ApiResponse::success(PagedResponse::from_paged(page))))
}

/// GET /api/stores/{id}
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    viewer: Option<Extension<AuthUser>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<StoreDto>>, ApiError> {
    let id = StoreId::new(validate_id("store", id)?);
    let viewer = viewer.map(|Extension(user)| user.id);

    let store = state.store_service().get_store(id, viewer).await?;

    Ok(Json(ApiResponse::success(StoreDto::from(store))))
}

/// POST /api/stores
pub async fn create_store(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StoreRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let store = state
        .store_service()
        .create_store(payload.into_input()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(StoreDto::from(store))),
    ))
}

/// PUT /api/stores/{id}
pub async fn update_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<StoreRequest>,
) -> Result<Json<ApiResponse<StoreDto>>, ApiError> {
    let id = StoreId::new(validate_id("store", id)?);

    let store = state
        .store_service()
        .update_store(id, payload.into_input()?)
        .await?;

    Ok(Json(ApiResponse::success(StoreDto::from(store))))
}

/// DELETE /api/stores/{id}
/// Removes the store and every rating on it
pub async fn delete_store(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = StoreId::new(validate_id("store", id)?);

    state.store_service().delete_store(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Store deleted successfully.",
    ))))
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::{store_query, user_query, validate_id};
use super::{
    ApiError, ApiResponse, AppState, MessageResponse, PagedResponse, StoreDto, StoreListParams,
    UserDto, UserListParams,
};
use crate::domain::{Role, UserId};
use crate::services::{DashboardStats, NewAccount, UserError};

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => Self::validation(msg),
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::Conflict(msg) => Self::Conflict(msg),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Option<String>,
}

/// GET /api/admin/dashboard-stats
pub async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DashboardStats>>, ApiError> {
    let stats = state.user_service().dashboard_stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<PagedResponse<UserDto>>>, ApiError> {
    let query = user_query(&state.config().listing, params)?;
    let page = state.user_service().list_users(&query).await?;

    Ok(Json(ApiResponse::success(PagedResponse::from_paged(page))))
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = UserId::new(validate_id("user", id)?);
    let user = state.user_service().get_user(id).await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /api/admin/users
/// Create an account with any role, including System Administrator
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role = payload
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| ApiError::validation(e.to_string()))?
        .unwrap_or(Role::NormalUser);

    let user = state
        .user_service()
        .create_user(NewAccount {
            name: payload.name,
            email: payload.email.trim().to_string(),
            password: payload.password,
            address: payload.address,
            role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// DELETE /api/admin/users/{id}
/// Deletes the user's ratings and tokens with it; owned stores are kept
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = UserId::new(validate_id("user", id)?);
    state.user_service().delete_user(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "User deleted successfully.",
    ))))
}

/// GET /api/admin/stores
/// Same listing as the public endpoint, without a viewer rating
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StoreListParams>,
) -> Result<Json<ApiResponse<PagedResponse<StoreDto>>>, ApiError> {
    let query = store_query(&state.config().listing, params)?;
    let page = state.store_service().list_stores(&query, None).await?;

    Ok(Json(ApiResponse::success(PagedResponse::from_paged(page))))
}

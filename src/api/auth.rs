use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::domain::{Role, authorize};
use crate::services::{AuthError, AuthUser, Registration};

/// Session key holding the bearer token issued at login.
const SESSION_TOKEN_KEY: &str = "token";

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::unauthorized("Invalid credentials."),
            AuthError::Unauthorized => Self::unauthorized("Not authenticated"),
            AuthError::AccessDenied(msg) => Self::Forbidden(msg),
            AuthError::UserNotFound => Self::NotFound("User not found".to_string()),
            AuthError::Validation(msg) => Self::ValidationError(msg),
            AuthError::Conflict(msg) => Self::Conflict(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Role of the login entry point the client used.
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub expires_at: String,
    pub role_upgraded: bool,
    pub user: UserDto,
}

#[derive(Deserialize)]
pub struct UpdatePasswordRequest {
    pub current_password: Option<String>,
    #[serde(alias = "new_password")]
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the caller's identity for every API request. The token comes
/// from `Authorization: Bearer <token>` or, for browser clients, from the
/// session cookie. A missing or invalid token leaves the request anonymous;
/// route gates decide whether that is acceptable.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer_token(&headers) {
        Some(token) => Some(token),
        None => session.get::<String>(SESSION_TOKEN_KEY).await.ok().flatten(),
    };

    if let Some(token) = token {
        match state.auth_service().resolve_token(&token).await {
            Ok(Some(user)) => {
                super::observability::record_caller(&user);
                request.extensions_mut().insert(user);
            }
            Ok(None) => {}
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(request).await
}

/// Extract the token from an `Authorization: Bearer` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    None
}

/// Lets the request through only when it carries an identity whose role is
/// in `required`. Runs before the handler, so a rejection has no effects.
async fn gate(required: &[Role], request: Request, next: Next) -> Response {
    let Some(user) = request.extensions().get::<AuthUser>() else {
        return ApiError::unauthorized("Access Denied: No valid token provided.").into_response();
    };

    if !authorize(required, user.role).is_allowed() {
        tracing::warn!(
            user_id = %user.id,
            role = %user.role,
            path = %request.uri().path(),
            "Role gate denied request"
        );
        metrics::counter!("rateboard_access_denied_total").increment(1);
        return ApiError::forbidden("Access Denied: You do not have permission to perform this action.")
            .into_response();
    }

    next.run(request).await
}

pub async fn require_auth(request: Request, next: Next) -> Response {
    gate(&Role::ALL, request, next).await
}

pub async fn require_admin(request: Request, next: Next) -> Response {
    gate(&[Role::Administrator], request, next).await
}

pub async fn require_store_owner(request: Request, next: Next) -> Response {
    gate(&[Role::StoreOwner], request, next).await
}

pub async fn require_normal_user(request: Request, next: Next) -> Response {
    gate(&[Role::NormalUser], request, next).await
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .auth_service()
        .register(Registration {
            name: payload.name,
            email: payload.email.trim().to_string(),
            password: payload.password,
            address: payload.address,
            role: payload.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserDto::from(user))),
    ))
}

/// POST /api/login
/// Authenticate with email and password; returns a bearer token and also
/// stores it in the session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(
            payload.email.trim(),
            &payload.password,
            payload.role.as_deref().filter(|r| !r.trim().is_empty()),
        )
        .await?;

    session
        .insert(SESSION_TOKEN_KEY, &result.token)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!(
        event = "login",
        user_id = %result.user.id,
        role = %result.user.role,
        "User logged in"
    );

    Ok(Json(ApiResponse::success(LoginResponse {
        message: "Logged in successfully!".to_string(),
        token: result.token,
        expires_at: result.expires_at,
        role_upgraded: result.transition.is_upgrade(),
        user: UserDto::from(result.user),
    })))
}

/// POST /api/logout
/// Revoke the presented token and drop the session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let token = match extract_bearer_token(&headers) {
        Some(token) => Some(token),
        None => session
            .get::<String>(SESSION_TOKEN_KEY)
            .await
            .map_err(|e| ApiError::internal(format!("Session error: {e}")))?,
    };

    if let Some(token) = token {
        state.auth_service().logout(&token).await?;
    }
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to clear session on logout");
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Logged out",
    ))))
}

/// GET /api/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.auth_service().current_user(user.id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /api/update-password
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth_service()
        .change_password(
            user.id,
            payload.current_password.as_deref(),
            &payload.password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully. Please log in again.",
    ))))
}

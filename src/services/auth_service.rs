//! Domain service for registration, login and bearer tokens.
//!
//! Login reconciles the stored role with the role the client asked for and
//! persists any upgrade before a token is issued.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::{InvalidField, Role, RoleDenied, RoleTransition, UserId};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    AccessDenied(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<InvalidField> for AuthError {
    fn from(err: InvalidField) -> Self {
        Self::Validation(err.0)
    }
}

impl From<RoleDenied> for AuthError {
    fn from(err: RoleDenied) -> Self {
        Self::AccessDenied(err.to_string())
    }
}

/// Identity behind a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    /// Requested role label; defaults to Normal User.
    pub role: Option<String>,
}

/// Login result containing the user (with the persisted role) and token.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub token: String,
    pub expires_at: String,
    pub transition: RoleTransition,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a Normal User or Store Owner account.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Conflict`] when the email is taken and
    /// [`AuthError::Validation`] for bad fields or an Administrator request.
    async fn register(&self, registration: Registration) -> Result<User, AuthError>;

    /// Verifies credentials, reconciles the requested role and issues a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the email or password is
    /// wrong and [`AuthError::AccessDenied`] if the requested role is refused.
    async fn login(
        &self,
        email: &str,
        password: &str,
        requested_role: Option<&str>,
    ) -> Result<LoginResult, AuthError>;

    /// Revokes a token. Unknown tokens are ignored.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Resolves a bearer token to its identity, if it is valid and unexpired.
    async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn current_user(&self, id: UserId) -> Result<User, AuthError>;

    /// Replaces the caller's password. When `current_password` is given it
    /// must match. Every token issued to the user is revoked, so all
    /// sessions have to log in again.
    async fn change_password(
        &self,
        id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError>;
}

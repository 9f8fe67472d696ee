//! Domain service for administrator user management and dashboard counts.

use serde::Serialize;
use thiserror::Error;

use crate::db::User;
use crate::domain::{InvalidField, Paged, Role, UserId, UserQuery};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    NotFound(UserId),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<InvalidField> for UserError {
    fn from(err: InvalidField) -> Self {
        Self::Validation(err.0)
    }
}

/// Account created by an administrator; any role is allowed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_stores: u64,
    pub total_ratings: u64,
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(&self, query: &UserQuery) -> Result<Paged<User>, UserError>;

    async fn get_user(&self, id: UserId) -> Result<User, UserError>;

    /// # Errors
    ///
    /// Returns [`UserError::Conflict`] when the email is already registered.
    async fn create_user(&self, account: NewAccount) -> Result<User, UserError>;

    /// Deletes the user and their ratings and tokens; stores they owned
    /// are kept without an owner.
    async fn delete_user(&self, id: UserId) -> Result<(), UserError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, UserError>;

    /// Creates the configured administrator when no administrator exists.
    /// Returns whether an account was created.
    async fn ensure_bootstrap_admin(&self) -> Result<bool, UserError>;
}

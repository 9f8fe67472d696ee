//! Domain service for the store catalog.

use thiserror::Error;

use crate::db::StoreSummary;
use crate::domain::{InvalidField, Paged, StoreId, StoreQuery, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store not found: {0}")]
    NotFound(StoreId),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<InvalidField> for StoreError {
    fn from(err: InvalidField) -> Self {
        Self::Validation(err.0)
    }
}

/// Editable store fields, used for both create and update.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub contact_email: String,
    pub location: String,
    pub owner_id: Option<UserId>,
}

#[async_trait::async_trait]
pub trait StoreService: Send + Sync {
    /// Lists stores with averages; `viewer` adds the viewer's own rating.
    async fn list_stores(
        &self,
        query: &StoreQuery,
        viewer: Option<UserId>,
    ) -> Result<Paged<StoreSummary>, StoreError>;

    async fn get_store(
        &self,
        id: StoreId,
        viewer: Option<UserId>,
    ) -> Result<StoreSummary, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the name or contact email is
    /// taken and [`StoreError::Validation`] for an unknown owner.
    async fn create_store(&self, input: StoreInput) -> Result<StoreSummary, StoreError>;

    async fn update_store(&self, id: StoreId, input: StoreInput)
    -> Result<StoreSummary, StoreError>;

    /// Deletes the store together with its ratings.
    async fn delete_store(&self, id: StoreId) -> Result<(), StoreError>;

    /// Stores owned by `owner_id`, with averages.
    async fn owner_stores(&self, owner_id: UserId) -> Result<Vec<StoreSummary>, StoreError>;
}

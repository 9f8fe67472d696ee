//! Domain service for the rating ledger and the per-store aggregate.

use thiserror::Error;

use crate::db::{OwnerRatingRow, StoreRatingRow};
use crate::domain::{AverageRating, InvalidRating, RatingId, RatingOutcome, StoreId, UserId};

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Store not found: {0}")]
    StoreNotFound(StoreId),

    #[error("Rating not found: {0}")]
    RatingNotFound(RatingId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RatingError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RatingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<InvalidRating> for RatingError {
    fn from(err: InvalidRating) -> Self {
        Self::Validation(err.to_string())
    }
}

#[async_trait::async_trait]
pub trait RatingService: Send + Sync {
    /// Records `value` as the user's rating for the store, replacing any
    /// earlier rating by the same user.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::Validation`] for a value outside 1..=5 (nothing
    /// is written) and [`RatingError::StoreNotFound`] for an unknown store.
    async fn submit_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: i64,
    ) -> Result<RatingOutcome, RatingError>;

    async fn average_rating(&self, store_id: StoreId) -> Result<AverageRating, RatingError>;

    /// Ratings on a store, newest first.
    async fn ratings_for_store(&self, store_id: StoreId)
    -> Result<Vec<StoreRatingRow>, RatingError>;

    /// Ratings on every store owned by `owner_id`.
    async fn ratings_for_owner(&self, owner_id: UserId)
    -> Result<Vec<OwnerRatingRow>, RatingError>;

    async fn delete_rating(&self, id: RatingId) -> Result<(), RatingError>;
}

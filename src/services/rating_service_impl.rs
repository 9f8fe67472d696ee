//! `SeaORM` implementation of the `RatingService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{OwnerRatingRow, Storage, StoreRatingRow, is_foreign_key_violation};
use crate::domain::{AverageRating, RatingId, RatingOutcome, RatingValue, StoreId, UserId};
use crate::services::rating_service::{RatingError, RatingService};

pub struct SeaOrmRatingService {
    storage: Storage,
}

impl SeaOrmRatingService {
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    async fn ensure_store(&self, store_id: StoreId) -> Result<(), RatingError> {
        if self.storage.store_repo().exists(store_id).await? {
            Ok(())
        } else {
            Err(RatingError::StoreNotFound(store_id))
        }
    }
}

#[async_trait]
impl RatingService for SeaOrmRatingService {
    async fn submit_rating(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: i64,
    ) -> Result<RatingOutcome, RatingError> {
        let value = RatingValue::new(value)?;
        self.ensure_store(store_id).await?;

        let outcome = self
            .storage
            .rating_repo()
            .upsert(user_id, store_id, value)
            .await
            .map_err(|e| {
                // The store was deleted between the check and the write.
                if is_foreign_key_violation(&e) {
                    RatingError::StoreNotFound(store_id)
                } else {
                    RatingError::from(e)
                }
            })?;

        let kind = if outcome.is_created() { "created" } else { "updated" };
        metrics::counter!("rateboard_ratings_submitted_total", "outcome" => kind).increment(1);
        info!(
            event = "rating_submitted",
            user_id = %user_id,
            store_id = %store_id,
            rating = %value,
            outcome = kind,
            "Rating recorded"
        );

        Ok(outcome)
    }

    async fn average_rating(&self, store_id: StoreId) -> Result<AverageRating, RatingError> {
        self.ensure_store(store_id).await?;
        Ok(self.storage.rating_repo().average_for_store(store_id).await?)
    }

    async fn ratings_for_store(
        &self,
        store_id: StoreId,
    ) -> Result<Vec<StoreRatingRow>, RatingError> {
        self.ensure_store(store_id).await?;
        Ok(self.storage.rating_repo().list_for_store(store_id).await?)
    }

    async fn ratings_for_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<OwnerRatingRow>, RatingError> {
        Ok(self.storage.rating_repo().list_for_owner(owner_id).await?)
    }

    async fn delete_rating(&self, id: RatingId) -> Result<(), RatingError> {
        if self.storage.rating_repo().delete(id).await? {
            info!(event = "rating_deleted", rating_id = %id, "Rating deleted");
            Ok(())
        } else {
            Err(RatingError::RatingNotFound(id))
        }
    }
}

//! `SeaORM` implementation of the `StoreService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{
    NewStore, Storage, StoreSummary, is_foreign_key_violation, is_unique_violation,
};
use crate::domain::{Paged, StoreId, StoreQuery, UserId, validation};
use crate::services::store_service::{StoreError, StoreInput, StoreService};

const DUPLICATE_STORE: &str = "Store with this name or contact email already exists.";
const UNKNOWN_OWNER: &str = "Invalid store owner ID provided. Owner must be an existing user.";

pub struct SeaOrmStoreService {
    storage: Storage,
}

impl SeaOrmStoreService {
    #[must_use]
    pub const fn new(storage: Storage) -> Self {
        Self { storage }
    }

    async fn validate(&self, input: &StoreInput) -> Result<NewStore, StoreError> {
        validation::validate_store_name(&input.name)?;
        validation::validate_email(&input.contact_email)?;
        validation::validate_address(&input.location)?;

        if let Some(owner_id) = input.owner_id
            && !self.storage.user_repo().exists(owner_id).await?
        {
            return Err(StoreError::Validation(UNKNOWN_OWNER.to_string()));
        }

        Ok(NewStore {
            name: input.name.trim().to_string(),
            contact_email: input.contact_email.trim().to_string(),
            location: input.location.trim().to_string(),
            owner_id: input.owner_id,
        })
    }
}

fn write_error(err: anyhow::Error) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::Conflict(DUPLICATE_STORE.to_string())
    } else if is_foreign_key_violation(&err) {
        StoreError::Validation(UNKNOWN_OWNER.to_string())
    } else {
        StoreError::from(err)
    }
}

#[async_trait]
impl StoreService for SeaOrmStoreService {
    async fn list_stores(
        &self,
        query: &StoreQuery,
        viewer: Option<UserId>,
    ) -> Result<Paged<StoreSummary>, StoreError> {
        Ok(self.storage.store_repo().list(query, viewer).await?)
    }

    async fn get_store(
        &self,
        id: StoreId,
        viewer: Option<UserId>,
    ) -> Result<StoreSummary, StoreError> {
        self.storage
            .store_repo()
            .get(id, viewer)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn create_store(&self, input: StoreInput) -> Result<StoreSummary, StoreError> {
        let store = self.validate(&input).await?;

        let id = self
            .storage
            .store_repo()
            .insert(store)
            .await
            .map_err(write_error)?;

        info!(event = "store_created", store_id = %id, "Store created");
        self.get_store(id, None).await
    }

    async fn update_store(
        &self,
        id: StoreId,
        input: StoreInput,
    ) -> Result<StoreSummary, StoreError> {
        let store = self.validate(&input).await?;

        let updated = self
            .storage
            .store_repo()
            .update(id, store)
            .await
            .map_err(write_error)?;

        if !updated {
            return Err(StoreError::NotFound(id));
        }

        info!(event = "store_updated", store_id = %id, "Store updated");
        self.get_store(id, None).await
    }

    async fn delete_store(&self, id: StoreId) -> Result<(), StoreError> {
        if !self.storage.store_repo().delete(id).await? {
            return Err(StoreError::NotFound(id));
        }

        info!(event = "store_deleted", store_id = %id, "Store deleted");
        Ok(())
    }

    async fn owner_stores(&self, owner_id: UserId) -> Result<Vec<StoreSummary>, StoreError> {
        Ok(self.storage.store_repo().list_by_owner(owner_id).await?)
    }
}

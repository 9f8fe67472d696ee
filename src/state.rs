use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::db::Storage;
use crate::services::{
    AuthService, RatingService, SeaOrmAuthService, SeaOrmRatingService, SeaOrmStoreService,
    SeaOrmUserService, StoreService, UserService,
};

/// Everything the HTTP layer and the CLI share: configuration, the pool and
/// the domain services built on it.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub storage: Storage,

    pub auth_service: Arc<dyn AuthService>,

    pub store_service: Arc<dyn StoreService>,

    pub rating_service: Arc<dyn RatingService>,

    pub user_service: Arc<dyn UserService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let storage = Storage::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Ok(Self::with_storage(config, storage))
    }

    #[must_use]
    pub fn with_storage(config: Config, storage: Storage) -> Self {
        let security = config.security.clone();

        let auth_service = Arc::new(SeaOrmAuthService::new(storage.clone(), security.clone()))
            as Arc<dyn AuthService>;
        let store_service = Arc::new(SeaOrmStoreService::new(storage.clone())) as Arc<dyn StoreService>;
        let rating_service =
            Arc::new(SeaOrmRatingService::new(storage.clone())) as Arc<dyn RatingService>;
        let user_service =
            Arc::new(SeaOrmUserService::new(storage.clone(), security)) as Arc<dyn UserService>;

        Self {
            config: Arc::new(config),
            storage,
            auth_service,
            store_service,
            rating_service,
            user_service,
        }
    }

    /// Startup housekeeping: seed the bootstrap administrator and drop
    /// expired tokens.
    pub async fn prepare(&self) -> anyhow::Result<()> {
        if self.user_service.ensure_bootstrap_admin().await? {
            info!("Bootstrap administrator created");
        }

        let purged = self.storage.token_repo().purge_expired().await?;
        if purged > 0 {
            info!(purged, "Removed expired auth tokens");
        }

        Ok(())
    }
}

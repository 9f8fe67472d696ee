//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::hash_password_blocking;
use crate::db::{NewUser, Storage, User, is_unique_violation};
use crate::domain::{Paged, Role, UserId, UserQuery, validation};
use crate::services::user_service::{DashboardStats, NewAccount, UserError, UserService};

const DUPLICATE_EMAIL: &str = "User with this email already exists.";

pub struct SeaOrmUserService {
    storage: Storage,
    security: SecurityConfig,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(storage: Storage, security: SecurityConfig) -> Self {
        Self { storage, security }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list_users(&self, query: &UserQuery) -> Result<Paged<User>, UserError> {
        Ok(self.storage.user_repo().list(query).await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserError> {
        self.storage
            .user_repo()
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn create_user(&self, account: NewAccount) -> Result<User, UserError> {
        validation::validate_user_name(&account.name)?;
        validation::validate_email(&account.email)?;
        validation::validate_password(&account.password)?;
        validation::validate_address(&account.address)?;

        let users = self.storage.user_repo();
        if users.find_by_email(&account.email).await?.is_some() {
            return Err(UserError::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let hash = hash_password_blocking(account.password, self.security.clone()).await?;

        let user = users
            .insert(
                NewUser {
                    name: account.name,
                    email: account.email,
                    address: account.address,
                    role: account.role,
                },
                hash,
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    UserError::Conflict(DUPLICATE_EMAIL.to_string())
                } else {
                    UserError::from(e)
                }
            })?;

        info!(event = "user_created", user_id = %user.id, role = %user.role, "User created by administrator");
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> Result<(), UserError> {
        if !self.storage.user_repo().delete_by_id(id).await? {
            return Err(UserError::NotFound(id));
        }

        info!(event = "user_deleted", user_id = %id, "User deleted");
        Ok(())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, UserError> {
        Ok(DashboardStats {
            total_users: self.storage.user_repo().count().await?,
            total_stores: self.storage.store_repo().count().await?,
            total_ratings: self.storage.rating_repo().count().await?,
        })
    }

    async fn ensure_bootstrap_admin(&self) -> Result<bool, UserError> {
        let bootstrap = &self.security.bootstrap_admin;
        if !bootstrap.enabled {
            return Ok(false);
        }

        let users = self.storage.user_repo();
        if users.count_with_role(Role::Administrator).await? > 0 {
            return Ok(false);
        }

        if users.find_by_email(&bootstrap.email).await?.is_some() {
            warn!(
                email = %bootstrap.email,
                "No administrator exists but the bootstrap email is taken; skipping"
            );
            return Ok(false);
        }

        let user = self
            .create_user(NewAccount {
                name: bootstrap.name.clone(),
                email: bootstrap.email.clone(),
                password: bootstrap.password.clone(),
                address: bootstrap.address.clone(),
                role: Role::Administrator,
            })
            .await?;

        warn!(
            user_id = %user.id,
            email = %user.email,
            "Created bootstrap administrator; change its password"
        );
        Ok(true)
    }
}

//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password_blocking, verify_password_blocking};
use crate::db::{NewUser, Storage, User, is_unique_violation};
use crate::domain::{Role, RoleTransition, UserId, reconcile_role, validation};
use crate::services::auth_service::{
    AuthError, AuthService, AuthUser, LoginResult, Registration,
};

/// Compare-and-update attempts before a login gives up on a contended row.
const MAX_ROLE_ATTEMPTS: usize = 3;

pub struct SeaOrmAuthService {
    storage: Storage,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(storage: Storage, security: SecurityConfig) -> Self {
        Self { storage, security }
    }

    /// Reconciles and, for an upgrade, persists the role with
    /// compare-and-update. A lost race re-reads the row and reconciles
    /// against the fresh role.
    async fn settle_role(
        &self,
        mut user: User,
        requested: Option<&str>,
    ) -> Result<(User, RoleTransition), AuthError> {
        let users = self.storage.user_repo();
        let policy = self.security.upgrade_policy();

        for attempt in 1..=MAX_ROLE_ATTEMPTS {
            let transition = reconcile_role(user.role, requested, policy)?;
            if !transition.is_upgrade() {
                return Ok((user, transition));
            }

            if users
                .update_role_if(user.id, transition.previous, transition.final_role)
                .await?
            {
                info!(
                    event = "role_upgraded",
                    user_id = %user.id,
                    from = %transition.previous,
                    to = %transition.final_role,
                    "Role upgraded on login"
                );
                metrics::counter!("rateboard_role_upgrades_total").increment(1);
                user.role = transition.final_role;
                return Ok((user, transition));
            }

            warn!(user_id = %user.id, attempt, "Role changed concurrently, re-reading user");
            user = users
                .get_by_id(user.id)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;
        }

        Err(AuthError::Conflict(
            "Role changed concurrently, please retry".to_string(),
        ))
    }
}

/// Roles a client may pick for itself at registration.
fn self_service_role(requested: Option<&str>) -> Result<Role, AuthError> {
    let Some(label) = requested else {
        return Ok(Role::NormalUser);
    };

    match label.parse::<Role>() {
        Ok(Role::Administrator) => Err(AuthError::Validation(
            "Administrator accounts can only be created by an administrator.".to_string(),
        )),
        Ok(role) => Ok(role),
        Err(_) => Err(AuthError::Validation(
            "Invalid user role provided for registration.".to_string(),
        )),
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        validation::validate_user_name(&registration.name)?;
        validation::validate_email(&registration.email)?;
        validation::validate_password(&registration.password)?;
        validation::validate_address(&registration.address)?;
        let role = self_service_role(registration.role.as_deref())?;

        let users = self.storage.user_repo();
        if users.find_by_email(&registration.email).await?.is_some() {
            return Err(AuthError::Conflict(
                "User with this email already exists.".to_string(),
            ));
        }

        let hash = hash_password_blocking(registration.password, self.security.clone()).await?;

        let user = users
            .insert(
                NewUser {
                    name: registration.name,
                    email: registration.email,
                    address: registration.address,
                    role,
                },
                hash,
            )
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::Conflict("User with this email already exists.".to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        info!(event = "user_registered", user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        requested_role: Option<&str>,
    ) -> Result<LoginResult, AuthError> {
        let Some((user, password_hash)) =
            self.storage.user_repo().find_credentials(email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password_blocking(password.to_string(), password_hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let (user, transition) = self.settle_role(user, requested_role).await?;

        let ttl = chrono::Duration::minutes(self.security.token_ttl_minutes);
        let issued = self
            .storage
            .token_repo()
            .issue(user.id, &user.email, user.role, ttl)
            .await?;

        Ok(LoginResult {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
            transition,
        })
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.storage.token_repo().revoke(token).await?;
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let issued = self.storage.token_repo().resolve(token).await?;
        Ok(issued.map(|t| AuthUser {
            id: t.user_id,
            email: t.email,
            role: t.role,
        }))
    }

    async fn current_user(&self, id: UserId) -> Result<User, AuthError> {
        self.storage
            .user_repo()
            .get_by_id(id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        id: UserId,
        current_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validation::validate_password(new_password)?;

        let users = self.storage.user_repo();

        if let Some(current) = current_password {
            let stored = users.password_hash(id).await?.ok_or(AuthError::UserNotFound)?;
            if !verify_password_blocking(current.to_string(), stored).await? {
                return Err(AuthError::Validation(
                    "Current password is incorrect".to_string(),
                ));
            }
        }

        let hash = hash_password_blocking(new_password.to_string(), self.security.clone()).await?;

        if !users.update_password_hash(id, hash).await? {
            return Err(AuthError::UserNotFound);
        }

        let revoked = self.storage.token_repo().revoke_all_for_user(id).await?;

        info!(event = "password_changed", user_id = %id, revoked, "Password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing;

    fn upgrading_service(storage: Storage) -> SeaOrmAuthService {
        SeaOrmAuthService::new(
            storage,
            SecurityConfig {
                allow_login_role_upgrade: true,
                ..SecurityConfig::default()
            },
        )
    }

    /// Returns a copy of the account read before another login promoted it.
    async fn stale_after_promotion(storage: &Storage, promoted_to: Role) -> User {
        let stale = testing::seed_user(storage, "bob@example.com", Role::NormalUser).await;
        assert!(
            storage
                .user_repo()
                .update_role_if(stale.id, Role::NormalUser, promoted_to)
                .await
                .unwrap()
        );
        stale
    }

    #[tokio::test]
    async fn stale_login_rereads_before_upgrading() {
        let storage = testing::memory_storage().await;
        let stale = stale_after_promotion(&storage, Role::StoreOwner).await;
        let service = upgrading_service(storage.clone());

        let (user, transition) = service
            .settle_role(stale, Some("System Administrator"))
            .await
            .unwrap();

        assert!(transition.is_upgrade());
        assert_eq!(transition.previous, Role::StoreOwner);
        assert_eq!(user.role, Role::Administrator);
        let stored = storage.user_repo().get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Administrator);
    }

    #[tokio::test]
    async fn stale_login_for_the_granted_role_changes_nothing() {
        let storage = testing::memory_storage().await;
        let stale = stale_after_promotion(&storage, Role::StoreOwner).await;
        let service = upgrading_service(storage);

        let (user, transition) = service
            .settle_role(stale, Some("Store Owner"))
            .await
            .unwrap();

        assert!(!transition.is_upgrade());
        assert_eq!(transition.previous, Role::StoreOwner);
        assert_eq!(user.role, Role::StoreOwner);
    }

    #[tokio::test]
    async fn stale_login_below_the_fresh_role_is_denied() {
        let storage = testing::memory_storage().await;
        let stale = stale_after_promotion(&storage, Role::Administrator).await;
        let service = upgrading_service(storage.clone());

        let result = service.settle_role(stale, Some("Store Owner")).await;

        assert!(matches!(result, Err(AuthError::AccessDenied(_))));
        let users = storage.user_repo();
        let stored = users.find_by_email("bob@example.com").await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Administrator);
    }

    #[test]
    fn registration_role_defaults_and_limits() {
        assert_eq!(self_service_role(None).unwrap(), Role::NormalUser);
        assert_eq!(self_service_role(Some("Store Owner")).unwrap(), Role::StoreOwner);
        assert!(matches!(
            self_service_role(Some("System Administrator")),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            self_service_role(Some("Janitor")),
            Err(AuthError::Validation(_))
        ));
    }
}

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::db::now_timestamp;
use crate::domain::{Paged, Role, UserId, UserQuery, UserSortField};
use crate::entities::{auth_tokens, ratings, stores, users};

/// User data returned from repository (without the password hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self> {
        let role = model
            .role
            .parse::<Role>()
            .with_context(|| format!("User {} has an invalid stored role", model.id))?;

        Ok(Self {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            address: model.address,
            role,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        user.map(User::try_from).transpose()
    }

    /// Get user by email together with the stored password hash (for login)
    pub async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user credentials")?;

        user.map(|u| {
            let password_hash = u.password_hash.clone();
            User::try_from(u).map(|user| (user, password_hash))
        })
        .transpose()
    }

    pub async fn password_hash(&self, id: UserId) -> Result<Option<String>> {
        let hash = users::Entity::find_by_id(id.value())
            .select_only()
            .column(users::Column::PasswordHash)
            .into_tuple::<String>()
            .one(&self.conn)
            .await
            .context("Failed to query password hash")?;

        Ok(hash)
    }

    pub async fn insert(&self, new_user: NewUser, password_hash: String) -> Result<User> {
        let now = now_timestamp();

        let model = users::ActiveModel {
            name: Set(new_user.name),
            email: Set(new_user.email),
            password_hash: Set(password_hash),
            address: Set(new_user.address),
            role: Set(new_user.role.as_str().to_string()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        User::try_from(model)
    }

    /// Sets the role only if the stored role still equals `expected`.
    /// Returns false when the row changed underneath (or is gone).
    pub async fn update_role_if(&self, id: UserId, expected: Role, new_role: Role) -> Result<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Role, Expr::value(new_role.as_str()))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(users::Column::Id.eq(id.value()))
            .filter(users::Column::Role.eq(expected.as_str()))
            .exec(&self.conn)
            .await
            .context("Failed to update user role")?;

        Ok(result.rows_affected == 1)
    }

    pub async fn update_password_hash(&self, id: UserId, password_hash: String) -> Result<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(users::Column::UpdatedAt, Expr::value(now_timestamp()))
            .filter(users::Column::Id.eq(id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to update password hash")?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes a user with their ratings and tokens, detaching any stores
    /// they owned. Returns false if the user did not exist.
    pub async fn delete_by_id(&self, id: UserId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let exists = users::Entity::find_by_id(id.value())
            .one(&txn)
            .await
            .context("Failed to query user for deletion")?
            .is_some();

        if !exists {
            txn.rollback().await?;
            return Ok(false);
        }

        ratings::Entity::delete_many()
            .filter(ratings::Column::UserId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete user's ratings")?;

        auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::UserId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete user's tokens")?;

        stores::Entity::update_many()
            .col_expr(stores::Column::OwnerId, Expr::value(Option::<i32>::None))
            .filter(stores::Column::OwnerId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to detach user's stores")?;

        users::Entity::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete user")?;

        txn.commit().await?;
        Ok(true)
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Paged<User>> {
        let mut condition = Condition::all();

        if let Some(role) = query.role {
            condition = condition.add(users::Column::Role.eq(role.as_str()));
        }

        if let Some(search) = &query.search {
            condition = condition.add(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Email.contains(search))
                    .add(users::Column::Address.contains(search)),
            );
        }

        let total = users::Entity::find()
            .filter(condition.clone())
            .count(&self.conn)
            .await
            .context("Failed to count users")?;

        let sort_column = match query.sort {
            UserSortField::Name => users::Column::Name,
            UserSortField::Email => users::Column::Email,
            UserSortField::Address => users::Column::Address,
            UserSortField::Role => users::Column::Role,
        };
        let order = if query.order.is_ascending() {
            Order::Asc
        } else {
            Order::Desc
        };

        let rows = users::Entity::find()
            .filter(condition)
            .order_by(sort_column, order)
            .order_by_asc(users::Column::Id)
            .limit(query.page.limit)
            .offset(query.page.offset())
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Paged::new(items, total, query.page))
    }

    pub async fn count(&self) -> Result<u64> {
        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }

    pub async fn count_with_role(&self, role: Role) -> Result<u64> {
        users::Entity::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .count(&self.conn)
            .await
            .context("Failed to count users by role")
    }

    pub async fn exists(&self, id: UserId) -> Result<bool> {
        let count = users::Entity::find_by_id(id.value())
            .count(&self.conn)
            .await
            .context("Failed to check user existence")?;
        Ok(count > 0)
    }
}

fn argon2_for(config: Option<&SecurityConfig>) -> Result<Argon2<'static>> {
    let Some(cfg) = config else {
        return Ok(Argon2::default());
    };

    let params = Params::new(
        cfg.argon2_memory_cost_kib,
        cfg.argon2_time_cost,
        cfg.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id.
/// Without a config the crate's default parameters are used.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2_for(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC hash. The hash carries its own
/// parameters, so verification never needs the config.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// [`hash_password`] on the blocking pool. Argon2 is CPU-intensive and
/// would stall the async runtime if run inline.
pub async fn hash_password_blocking(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, Some(&config)))
        .await
        .context("Password hashing task panicked")?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(password: String, password_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}

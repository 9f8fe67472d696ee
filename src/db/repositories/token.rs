use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::db::{now_timestamp, timestamp};
use crate::domain::{Role, UserId};
use crate::entities::auth_tokens;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub expires_at: String,
}

impl TryFrom<auth_tokens::Model> for IssuedToken {
    type Error = anyhow::Error;

    fn try_from(model: auth_tokens::Model) -> Result<Self> {
        Ok(Self {
            role: model
                .role
                .parse()
                .context("Token carries an invalid role")?,
            token: model.token,
            user_id: UserId::new(model.user_id),
            email: model.email,
            expires_at: model.expires_at,
        })
    }
}

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn issue(
        &self,
        user_id: UserId,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = timestamp(now + ttl);

        let model = auth_tokens::ActiveModel {
            token: Set(generate_token()),
            user_id: Set(user_id.value()),
            email: Set(email.to_string()),
            role: Set(role.as_str().to_string()),
            created_at: Set(timestamp(now)),
            expires_at: Set(expires_at),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to store auth token")?;

        IssuedToken::try_from(model)
    }

    /// Looks up an unexpired token.
    pub async fn resolve(&self, token: &str) -> Result<Option<IssuedToken>> {
        let Some(model) = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?
        else {
            return Ok(None);
        };

        let expires_at = DateTime::parse_from_rfc3339(&model.expires_at)
            .context("Token has a malformed expiry")?;
        if expires_at <= Utc::now() {
            return Ok(None);
        }

        IssuedToken::try_from(model).map(Some)
    }

    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::Token.eq(token))
            .exec(&self.conn)
            .await
            .context("Failed to revoke auth token")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn revoke_all_for_user(&self, user_id: UserId) -> Result<u64> {
        let result = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::UserId.eq(user_id.value()))
            .exec(&self.conn)
            .await
            .context("Failed to revoke user tokens")?;

        Ok(result.rows_affected)
    }

    /// Drops every expired token. Relies on the fixed-width timestamp format.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::ExpiresAt.lte(now_timestamp()))
            .exec(&self.conn)
            .await
            .context("Failed to purge expired tokens")?;

        Ok(result.rows_affected)
    }
}

/// Generate a random token (64 character hex string)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

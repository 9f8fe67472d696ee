use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    sea_query::{Expr, Func, SimpleExpr},
};

use crate::db::{is_unique_violation, now_timestamp};
use crate::domain::{AverageRating, RatingId, RatingOutcome, RatingValue, StoreId, UserId};
use crate::entities::{ratings, stores, users};

/// A rating on one store together with who submitted it.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct StoreRatingRow {
    pub id: i32,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// A rating on one of an owner's stores.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct OwnerRatingRow {
    pub id: i32,
    pub store_id: i32,
    pub store_name: String,
    pub user_id: i32,
    pub user_name: String,
    pub user_email: String,
    pub rating: i32,
    pub updated_at: String,
}

pub struct RatingRepository {
    conn: DatabaseConnection,
}

impl RatingRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_existing(
        &self,
        user_id: UserId,
        store_id: StoreId,
    ) -> Result<Option<ratings::Model>> {
        ratings::Entity::find()
            .filter(ratings::Column::UserId.eq(user_id.value()))
            .filter(ratings::Column::StoreId.eq(store_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to query existing rating")
    }

    async fn overwrite(&self, existing: ratings::Model, value: RatingValue) -> Result<RatingId> {
        let id = existing.id;
        let mut active: ratings::ActiveModel = existing.into();
        active.rating = Set(value.as_i32());
        active.updated_at = Set(now_timestamp());
        active
            .update(&self.conn)
            .await
            .context("Failed to update rating")?;
        Ok(RatingId::new(id))
    }

    /// Inserts or overwrites the caller's rating for a store. The unique
    /// (user_id, store_id) index arbitrates concurrent first submissions:
    /// the loser of the race falls through to an update.
    pub async fn upsert(
        &self,
        user_id: UserId,
        store_id: StoreId,
        value: RatingValue,
    ) -> Result<RatingOutcome> {
        if let Some(existing) = self.find_existing(user_id, store_id).await? {
            let id = self.overwrite(existing, value).await?;
            return Ok(RatingOutcome::Updated { id });
        }

        let now = now_timestamp();
        let inserted = ratings::ActiveModel {
            user_id: Set(user_id.value()),
            store_id: Set(store_id.value()),
            rating: Set(value.as_i32()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert rating");

        match inserted {
            Ok(model) => Ok(RatingOutcome::Created {
                id: RatingId::new(model.id),
            }),
            Err(e) if is_unique_violation(&e) => {
                let existing = self
                    .find_existing(user_id, store_id)
                    .await?
                    .context("Rating vanished after unique violation")?;
                let id = self.overwrite(existing, value).await?;
                Ok(RatingOutcome::Updated { id })
            }
            Err(e) => Err(e),
        }
    }

    pub async fn average_for_store(&self, store_id: StoreId) -> Result<AverageRating> {
        let row = ratings::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(ratings::Column::Rating))),
                "average_rating",
            )
            .column_as(Expr::col(ratings::Column::Id).count(), "rating_count")
            .filter(ratings::Column::StoreId.eq(store_id.value()))
            .into_tuple::<(Option<f64>, i64)>()
            .one(&self.conn)
            .await
            .context("Failed to aggregate ratings")?;

        Ok(row.map_or(AverageRating::NoRatings, |(mean, count)| {
            AverageRating::from_aggregate(mean, count)
        }))
    }

    /// Ratings on a store, newest first.
    pub async fn list_for_store(&self, store_id: StoreId) -> Result<Vec<StoreRatingRow>> {
        ratings::Entity::find()
            .select_only()
            .column(ratings::Column::Id)
            .column(ratings::Column::UserId)
            .column_as(users::Column::Name, "user_name")
            .column_as(users::Column::Email, "user_email")
            .column(ratings::Column::Rating)
            .column(ratings::Column::CreatedAt)
            .column(ratings::Column::UpdatedAt)
            .join(JoinType::InnerJoin, ratings::Relation::User.def())
            .filter(ratings::Column::StoreId.eq(store_id.value()))
            .order_by_desc(ratings::Column::UpdatedAt)
            .order_by_desc(ratings::Column::Id)
            .into_model::<StoreRatingRow>()
            .all(&self.conn)
            .await
            .context("Failed to list ratings for store")
    }

    /// Every rating on any store owned by `owner`.
    pub async fn list_for_owner(&self, owner: UserId) -> Result<Vec<OwnerRatingRow>> {
        ratings::Entity::find()
            .select_only()
            .column(ratings::Column::Id)
            .column(ratings::Column::StoreId)
            .column_as(stores::Column::Name, "store_name")
            .column(ratings::Column::UserId)
            .column_as(users::Column::Name, "user_name")
            .column_as(users::Column::Email, "user_email")
            .column(ratings::Column::Rating)
            .column(ratings::Column::UpdatedAt)
            .join(JoinType::InnerJoin, ratings::Relation::Store.def())
            .join(JoinType::InnerJoin, ratings::Relation::User.def())
            .filter(stores::Column::OwnerId.eq(owner.value()))
            .order_by_asc(stores::Column::Name)
            .order_by_desc(ratings::Column::UpdatedAt)
            .into_model::<OwnerRatingRow>()
            .all(&self.conn)
            .await
            .context("Failed to list ratings for owner")
    }

    pub async fn delete(&self, id: RatingId) -> Result<bool> {
        let result = ratings::Entity::delete_by_id(id.value())
            .exec(&self.conn)
            .await
            .context("Failed to delete rating")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        ratings::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count ratings")
    }
}

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    Set, TransactionTrait,
    sea_query::{Expr, Func, SimpleExpr},
};
use std::collections::HashMap;

use crate::db::now_timestamp;
use crate::domain::{
    AverageRating, Paged, RatingValue, StoreId, StoreQuery, StoreSortField, UserId,
};
use crate::entities::{ratings, stores, users};

/// A store as listed: catalog columns plus the owner name and the
/// aggregated rating.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSummary {
    pub id: StoreId,
    pub name: String,
    pub contact_email: String,
    pub location: String,
    pub owner_id: Option<UserId>,
    pub owner_name: Option<String>,
    pub average: AverageRating,
    /// The viewing user's own rating, when a viewer was given.
    pub user_rating: Option<RatingValue>,
}

#[derive(Debug, FromQueryResult)]
struct StoreRow {
    id: i32,
    name: String,
    contact_email: String,
    location: String,
    owner_id: Option<i32>,
    owner_name: Option<String>,
    average_rating: Option<f64>,
    rating_count: i64,
}

impl From<StoreRow> for StoreSummary {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            name: row.name,
            contact_email: row.contact_email,
            location: row.location,
            owner_id: row.owner_id.map(UserId::new),
            owner_name: row.owner_name,
            average: AverageRating::from_aggregate(row.average_rating, row.rating_count),
            user_rating: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub contact_email: String,
    pub location: String,
    pub owner_id: Option<UserId>,
}

pub struct StoreRepository {
    conn: DatabaseConnection,
}

impl StoreRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Base aggregate query: one row per store with owner name, mean and
    /// count of its ratings.
    fn summary_select() -> Select<stores::Entity> {
        stores::Entity::find()
            .select_only()
            .column(stores::Column::Id)
            .column(stores::Column::Name)
            .column(stores::Column::ContactEmail)
            .column(stores::Column::Location)
            .column(stores::Column::OwnerId)
            .column_as(users::Column::Name, "owner_name")
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col((
                    ratings::Entity,
                    ratings::Column::Rating,
                )))),
                "average_rating",
            )
            .column_as(
                Expr::col((ratings::Entity, ratings::Column::Id)).count(),
                "rating_count",
            )
            .join(JoinType::LeftJoin, stores::Relation::Owner.def())
            .join(JoinType::LeftJoin, stores::Relation::Ratings.def())
            .group_by(stores::Column::Id)
    }

    /// Store columns are qualified since the owner join also has a `name`;
    /// aggregates are ordered by their result alias.
    fn sort_expr(sort: StoreSortField) -> SimpleExpr {
        match sort {
            StoreSortField::Name => Expr::col((stores::Entity, stores::Column::Name)).into(),
            StoreSortField::Location => {
                Expr::col((stores::Entity, stores::Column::Location)).into()
            }
            StoreSortField::ContactEmail => {
                Expr::col((stores::Entity, stores::Column::ContactEmail)).into()
            }
            StoreSortField::OwnerName | StoreSortField::AverageRating => {
                Expr::cust(sort.column_alias())
            }
        }
    }

    fn filter_condition(query: &StoreQuery) -> Condition {
        let mut condition = Condition::all();

        if let Some(search) = &query.search {
            condition = condition.add(
                Condition::any()
                    .add(stores::Column::Name.contains(search))
                    .add(stores::Column::Location.contains(search))
                    .add(stores::Column::ContactEmail.contains(search)),
            );
        }

        if let Some(owner_id) = query.owner_id {
            condition = condition.add(stores::Column::OwnerId.eq(owner_id.value()));
        }

        condition
    }

    pub async fn get(&self, id: StoreId, viewer: Option<UserId>) -> Result<Option<StoreSummary>> {
        let row = Self::summary_select()
            .filter(stores::Column::Id.eq(id.value()))
            .into_model::<StoreRow>()
            .one(&self.conn)
            .await
            .context("Failed to query store")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut summaries = vec![StoreSummary::from(row)];
        self.attach_viewer_ratings(&mut summaries, viewer).await?;
        Ok(summaries.pop())
    }

    pub async fn exists(&self, id: StoreId) -> Result<bool> {
        let count = stores::Entity::find_by_id(id.value())
            .count(&self.conn)
            .await
            .context("Failed to check store existence")?;
        Ok(count > 0)
    }

    pub async fn list(
        &self,
        query: &StoreQuery,
        viewer: Option<UserId>,
    ) -> Result<Paged<StoreSummary>> {
        let condition = Self::filter_condition(query);

        let total = stores::Entity::find()
            .filter(condition.clone())
            .count(&self.conn)
            .await
            .context("Failed to count stores")?;

        let order = if query.order.is_ascending() {
            Order::Asc
        } else {
            Order::Desc
        };

        let rows = Self::summary_select()
            .filter(condition)
            .order_by(Self::sort_expr(query.sort), order)
            .order_by_asc(stores::Column::Id)
            .limit(query.page.limit)
            .offset(query.page.offset())
            .into_model::<StoreRow>()
            .all(&self.conn)
            .await
            .context("Failed to list stores")?;

        let mut items: Vec<StoreSummary> = rows.into_iter().map(StoreSummary::from).collect();
        self.attach_viewer_ratings(&mut items, viewer).await?;

        Ok(Paged::new(items, total, query.page))
    }

    /// All stores owned by `owner`, by name.
    pub async fn list_by_owner(&self, owner: UserId) -> Result<Vec<StoreSummary>> {
        let rows = Self::summary_select()
            .filter(stores::Column::OwnerId.eq(owner.value()))
            .order_by_asc(stores::Column::Name)
            .into_model::<StoreRow>()
            .all(&self.conn)
            .await
            .context("Failed to list owner's stores")?;

        Ok(rows.into_iter().map(StoreSummary::from).collect())
    }

    async fn attach_viewer_ratings(
        &self,
        summaries: &mut [StoreSummary],
        viewer: Option<UserId>,
    ) -> Result<()> {
        let Some(viewer) = viewer else {
            return Ok(());
        };
        if summaries.is_empty() {
            return Ok(());
        }

        let store_ids: Vec<i32> = summaries.iter().map(|s| s.id.value()).collect();

        let own: HashMap<i32, i32> = ratings::Entity::find()
            .select_only()
            .column(ratings::Column::StoreId)
            .column(ratings::Column::Rating)
            .filter(ratings::Column::UserId.eq(viewer.value()))
            .filter(ratings::Column::StoreId.is_in(store_ids))
            .into_tuple::<(i32, i32)>()
            .all(&self.conn)
            .await
            .context("Failed to query viewer ratings")?
            .into_iter()
            .collect();

        for summary in summaries {
            summary.user_rating = own
                .get(&summary.id.value())
                .and_then(|v| RatingValue::try_from(*v).ok());
        }

        Ok(())
    }

    pub async fn insert(&self, store: NewStore) -> Result<StoreId> {
        let now = now_timestamp();

        let model = stores::ActiveModel {
            name: Set(store.name),
            contact_email: Set(store.contact_email),
            location: Set(store.location),
            owner_id: Set(store.owner_id.map(|id| id.value())),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert store")?;

        Ok(StoreId::new(model.id))
    }

    /// Overwrites the editable columns. Returns false if the store is gone.
    pub async fn update(&self, id: StoreId, store: NewStore) -> Result<bool> {
        let Some(existing) = stores::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query store for update")?
        else {
            return Ok(false);
        };

        let mut active: stores::ActiveModel = existing.into();
        active.name = Set(store.name);
        active.contact_email = Set(store.contact_email);
        active.location = Set(store.location);
        active.owner_id = Set(store.owner_id.map(|id| id.value()));
        active.updated_at = Set(now_timestamp());
        active
            .update(&self.conn)
            .await
            .context("Failed to update store")?;

        Ok(true)
    }

    /// Deletes a store and its ratings. Returns false if it did not exist.
    pub async fn delete(&self, id: StoreId) -> Result<bool> {
        let txn = self.conn.begin().await?;

        ratings::Entity::delete_many()
            .filter(ratings::Column::StoreId.eq(id.value()))
            .exec(&txn)
            .await
            .context("Failed to delete store ratings")?;

        let result = stores::Entity::delete_by_id(id.value())
            .exec(&txn)
            .await
            .context("Failed to delete store")?;

        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        txn.commit().await?;
        Ok(true)
    }

    pub async fn count(&self) -> Result<u64> {
        stores::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count stores")
    }
}

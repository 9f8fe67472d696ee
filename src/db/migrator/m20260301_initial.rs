use crate::entities::prelude::*;
use crate::entities::{ratings, stores, users};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Stores)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(AuthTokens)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Ratings are declared by hand for the value CHECK.
        manager
            .create_table(
                Table::create()
                    .table(Ratings)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ratings::Column::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ratings::Column::UserId).integer().not_null())
                    .col(ColumnDef::new(ratings::Column::StoreId).integer().not_null())
                    .col(
                        ColumnDef::new(ratings::Column::Rating)
                            .integer()
                            .not_null()
                            .check(Expr::col(ratings::Column::Rating).between(1, 5)),
                    )
                    .col(ColumnDef::new(ratings::Column::CreatedAt).string().not_null())
                    .col(ColumnDef::new(ratings::Column::UpdatedAt).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_user")
                            .from(Ratings, ratings::Column::UserId)
                            .to(Users, users::Column::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_store")
                            .from(Ratings, ratings::Column::StoreId)
                            .to(Stores, stores::Column::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_user_store_unique")
                    .table(Ratings)
                    .col(ratings::Column::UserId)
                    .col(ratings::Column::StoreId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ratings).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuthTokens).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Stores).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

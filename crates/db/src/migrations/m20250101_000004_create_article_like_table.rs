//! Create article_like table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ArticleLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ArticleLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ArticleLike::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleLike::ArticleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ArticleLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_like_user")
                            .from(ArticleLike::Table, ArticleLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_article_like_article")
                            .from(ArticleLike::Table, ArticleLike::ArticleId)
                            .to(Article::Table, Article::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, article_id) - one like per user per article
        manager
            .create_index(
                Index::create()
                    .name("idx_article_like_user_article")
                    .table(ArticleLike::Table)
                    .col(ArticleLike::UserId)
                    .col(ArticleLike::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: article_id (for listing likes on an article)
        manager
            .create_index(
                Index::create()
                    .name("idx_article_like_article_id")
                    .table(ArticleLike::Table)
                    .col(ArticleLike::ArticleId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ArticleLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ArticleLike {
    Table,
    Id,
    UserId,
    ArticleId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
}

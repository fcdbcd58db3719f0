//! Create ai_hunsoo table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AiHunsoo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiHunsoo::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AiHunsoo::ArticleId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AiHunsoo::Content).text())
                    .col(
                        ColumnDef::new(AiHunsoo::Status)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AiHunsoo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(AiHunsoo::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ai_hunsoo_article")
                            .from(AiHunsoo::Table, AiHunsoo::ArticleId)
                            .to(Article::Table, Article::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One AI response row per article
        manager
            .create_index(
                Index::create()
                    .name("idx_ai_hunsoo_article_id")
                    .table(AiHunsoo::Table)
                    .col(AiHunsoo::ArticleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AiHunsoo::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AiHunsoo {
    Table,
    Id,
    ArticleId,
    Content,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Article {
    Table,
    Id,
}

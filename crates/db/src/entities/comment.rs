//! Comment (hunsoo) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Comment author; one comment per user per article
    pub user_id: String,

    #[sea_orm(indexed)]
    pub article_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// At most one comment per article carries this flag; flips exactly once
    #[sea_orm(default_value = false)]
    pub is_selected: bool,

    /// Denormalized from the reaction ledger
    #[sea_orm(default_value = 0)]
    pub helpful_count: i32,

    /// Denormalized from the reaction ledger
    #[sea_orm(default_value = 0)]
    pub not_helpful_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    Article,

    #[sea_orm(has_many = "super::comment_reaction::Entity")]
    CommentReaction,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::article::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Article.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

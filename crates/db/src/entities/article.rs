//! Article entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "article")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Author user ID
    #[sea_orm(indexed)]
    pub user_id: String,

    pub title: String,

    /// Question body; may embed image URLs rewritten after temp-image promotion
    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Flips to true exactly once, when a comment is accepted
    #[sea_orm(default_value = false)]
    pub is_closed: bool,

    /// Denormalized, incremented atomically
    #[sea_orm(default_value = 0)]
    pub view_count: i32,

    /// Denormalized, kept in step with the article_like rows
    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    /// Tag names (at most 3)
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,

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

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    #[sea_orm(has_many = "super::article_like::Entity")]
    ArticleLike,

    #[sea_orm(has_one = "super::ai_hunsoo::Entity")]
    AiHunsoo,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

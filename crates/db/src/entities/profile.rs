//! Profile entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub user_id: String,

    #[sea_orm(column_type = "Text")]
    pub bio: String,

    /// Bounded rank, 1..=10
    #[sea_orm(default_value = 1)]
    pub hunsoo_level: i32,

    /// Incremented once per resolved report against this user
    #[sea_orm(default_value = 0)]
    pub warning_count: i32,

    /// How many of this user's comments have been accepted
    #[sea_orm(default_value = 0)]
    pub selected_comment_count: i32,

    /// Public URL of the profile image
    #[sea_orm(nullable)]
    pub profile_image: Option<String>,

    /// Tags the user follows (at most 3)
    #[sea_orm(column_type = "JsonBinary")]
    pub selected_tags: Json,

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
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

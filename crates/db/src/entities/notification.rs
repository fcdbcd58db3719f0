//! Notification entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationVerb {
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "like")]
    Like,
    #[sea_orm(string_value = "select")]
    Select,
    #[sea_orm(string_value = "ai_response")]
    AiResponse,
    #[sea_orm(string_value = "report")]
    Report,
}

impl NotificationVerb {
    /// Human-readable description of the verb.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Comment => "Commented on your post",
            Self::Like => "Liked your post",
            Self::Select => "Selected your comment",
            Self::AiResponse => "AI responded to your post",
            Self::Report => "A report has been received",
        }
    }
}

/// What kind of entity the notification points at.
///
/// Together with `target_id` this is the stored form of [`NotificationTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    #[sea_orm(string_value = "article")]
    Article,
    #[sea_orm(string_value = "comment")]
    Comment,
    #[sea_orm(string_value = "ai_hunsoo")]
    AiHunsoo,
    #[sea_orm(string_value = "report")]
    Report,
}

/// Tagged reference to the entity a notification points at.
///
/// A sum type instead of a stringly (type-name, id) pair so deriving
/// description text stays exhaustive at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Article(String),
    Comment(String),
    AiHunsoo(String),
    Report(String),
}

impl NotificationTarget {
    /// The stored discriminant.
    #[must_use]
    pub const fn kind(&self) -> TargetKind {
        match self {
            Self::Article(_) => TargetKind::Article,
            Self::Comment(_) => TargetKind::Comment,
            Self::AiHunsoo(_) => TargetKind::AiHunsoo,
            Self::Report(_) => TargetKind::Report,
        }
    }

    /// The referenced entity id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Article(id) | Self::Comment(id) | Self::AiHunsoo(id) | Self::Report(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The user receiving the notification; NULL for admin-channel notices
    #[sea_orm(nullable)]
    pub recipient_id: Option<String>,

    /// The user who triggered the notification; NULL for system-generated ones
    #[sea_orm(nullable)]
    pub actor_id: Option<String>,

    pub verb: NotificationVerb,

    pub target_kind: TargetKind,

    pub target_id: String,

    /// Denormalized article reference for display
    pub article_id: String,

    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// Admin-channel notice (recipient is NULL)
    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RecipientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ActorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Actor,

    #[sea_orm(
        belongs_to = "super::article::Entity",
        from = "Column::ArticleId",
        to = "super::article::Column::Id",
        on_delete = "Cascade"
    )]
    Article,
}

impl ActiveModelBehavior for ActiveModel {}

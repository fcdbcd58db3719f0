//! Database entities.

pub mod ai_hunsoo;
pub mod article;
pub mod article_like;
pub mod comment;
pub mod comment_reaction;
pub mod notification;
pub mod profile;
pub mod report;
pub mod user;

pub use ai_hunsoo::Entity as AiHunsoo;
pub use article::Entity as Article;
pub use article_like::Entity as ArticleLike;
pub use comment::Entity as Comment;
pub use comment_reaction::Entity as CommentReaction;
pub use notification::Entity as Notification;
pub use profile::Entity as Profile;
pub use report::Entity as Report;
pub use user::Entity as User;

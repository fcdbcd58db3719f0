//! Database repositories.

pub mod ai_hunsoo;
pub mod article;
pub mod comment;
pub mod notification;
pub mod profile;
pub mod reaction;
pub mod report;
pub mod user;

pub use ai_hunsoo::AiHunsooRepository;
pub use article::ArticleRepository;
pub use comment::CommentRepository;
pub use notification::NotificationRepository;
pub use profile::ProfileRepository;
pub use reaction::{ArticleLikeRepository, CommentReactionRepository, ReactionToggle};
pub use report::ReportRepository;
pub use user::UserRepository;

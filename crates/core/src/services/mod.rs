//! Business logic services.

pub mod ai_hunsoo;
pub mod article;
pub mod comment;
pub mod jobs;
pub mod media;
pub mod moderation;
pub mod notification;
pub mod profile;
pub mod reaction;

pub use ai_hunsoo::{AiHunsooService, AiResponder, DisabledResponder, OpenAiResponder};
pub use article::{ArticleService, CreateArticleInput};
pub use comment::CommentService;
pub use jobs::{Job, JobSender, JobService, JobWorkerContext};
pub use media::MediaService;
pub use moderation::{ModerationService, SubmitReportInput};
pub use notification::NotificationService;
pub use profile::{ProfileService, UpdateProfileInput};
pub use reaction::ReactionService;

//! Business logic layer for hunsuking.
//!
//! Services compose the repositories from `hunsuking-db` and enforce the
//! rules the REST layer relies on: who may act, which state transitions are
//! legal, and which side effects follow a committed write.

pub mod services;

pub use services::{
    AiHunsooService, AiResponder, ArticleService, CommentService, CreateArticleInput,
    DisabledResponder, Job, JobSender, JobService, JobWorkerContext, MediaService,
    ModerationService, NotificationService, OpenAiResponder, ProfileService, ReactionService,
    SubmitReportInput, UpdateProfileInput,
};

//! Job processing service for background tasks.
//!
//! A simple in-memory job queue. Today it carries a single job kind, the AI
//! response generation that must not run on the request path.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::services::ai_hunsoo::AiHunsooService;

/// Maximum number of concurrent job workers.
const MAX_WORKERS: usize = 4;

/// Channel buffer size for jobs.
const JOB_BUFFER_SIZE: usize = 1000;

/// Attempts per job before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Job types that can be processed.
#[derive(Debug, Clone)]
pub enum Job {
    /// Generate the AI response for an article.
    AiResponse { article_id: String },
}

/// Job sender for enqueueing jobs.
#[derive(Clone)]
pub struct JobSender {
    sender: mpsc::Sender<Job>,
}

impl JobSender {
    /// Enqueue a job for processing.
    pub async fn enqueue(&self, job: Job) -> Result<(), &'static str> {
        self.sender.send(job).await.map_err(|_| "Job queue is full")
    }

    /// Enqueue an AI response job.
    pub async fn ai_response(&self, article_id: String) -> Result<(), &'static str> {
        self.enqueue(Job::AiResponse { article_id }).await
    }
}

/// Job worker context containing services needed for job processing.
#[derive(Clone)]
pub struct JobWorkerContext {
    pub ai_service: Option<AiHunsooService>,
}

/// Job processing service.
pub struct JobService {
    sender: mpsc::Sender<Job>,
    receiver: Option<mpsc::Receiver<Job>>,
}

impl JobService {
    /// Create a new job service.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(JOB_BUFFER_SIZE);
        Self {
            sender,
            receiver: Some(receiver),
        }
    }

    /// Get a job sender for enqueueing jobs.
    #[must_use]
    pub fn sender(&self) -> JobSender {
        JobSender {
            sender: self.sender.clone(),
        }
    }

    /// Start the job processor with the given context.
    /// This consumes the receiver and spawns worker tasks.
    pub fn start(mut self, context: JobWorkerContext) {
        let Some(receiver) = self.receiver.take() else {
            warn!("Job service already started");
            return;
        };
        let context = Arc::new(context);

        tokio::spawn(async move {
            info!("Job worker starting with {} workers", MAX_WORKERS);
            run_job_processor(receiver, context).await;
            info!("Job worker stopped");
        });
    }
}

impl Default for JobService {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the job processor.
async fn run_job_processor(mut receiver: mpsc::Receiver<Job>, context: Arc<JobWorkerContext>) {
    // Use a semaphore to limit concurrent workers
    let semaphore = Arc::new(tokio::sync::Semaphore::new(MAX_WORKERS));

    while let Some(job) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let ctx = context.clone();

        tokio::spawn(async move {
            let _permit = permit;
            process_job(job, &ctx).await;
        });
    }
}

/// Process a single job, retrying transient failures a bounded number
/// of times.
async fn process_job(job: Job, context: &JobWorkerContext) {
    match job {
        Job::AiResponse { article_id } => {
            let Some(ref ai_service) = context.ai_service else {
                warn!("AI service not available, dropping AI response job");
                return;
            };

            for attempt in 1..=MAX_ATTEMPTS {
                match ai_service.respond(&article_id).await {
                    Ok(()) => return,
                    Err(e) => {
                        warn!(
                            article_id = %article_id,
                            attempt = attempt,
                            error = %e,
                            "AI response job failed"
                        );
                        if attempt < MAX_ATTEMPTS {
                            tokio::time::sleep(std::time::Duration::from_secs(u64::from(
                                attempt,
                            )))
                            .await;
                        }
                    }
                }
            }
        }
    }
}

use chrono::Utc;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use summa_import::schema::{self, SchemaError};
use summa_report::ReportGenerator;

use crate::job::{JobOutcome, SubmissionJob, SubmitterId};
use crate::notify::SubmitterNotifier;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("submitter {0} is not on the allowed list")]
    NotAllowed(SubmitterId),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// FIFO registry of report jobs. One lock guards the deque, so enqueue and
/// drain never interleave their critical sections; the pipeline itself runs
/// outside the lock, on the single consumer task.
pub struct SubmissionQueue<G, N> {
    jobs: Mutex<VecDeque<SubmissionJob>>,
    generator: G,
    notifier: N,
    allowed: HashSet<SubmitterId>,
}

impl<G, N> SubmissionQueue<G, N>
where
    G: ReportGenerator,
    N: SubmitterNotifier,
{
    pub fn new(generator: G, notifier: N, allowed: HashSet<SubmitterId>) -> Self {
        Self {
            jobs: Mutex::new(VecDeque::new()),
            generator,
            notifier,
            allowed,
        }
    }

    /// Accepts an upload and returns its queue position without waiting for
    /// processing. Rejections (unknown submitter, wrong upload schema)
    /// happen here, before any job exists.
    pub async fn submit(
        &self,
        source: PathBuf,
        submitter: SubmitterId,
    ) -> Result<usize, SubmitError> {
        if !self.allowed.contains(&submitter) {
            tracing::info!(%submitter, "rejected submission from unlisted submitter");
            return Err(SubmitError::NotAllowed(submitter));
        }
        schema::validate_header(&source)?;

        let mut jobs = self.jobs.lock().await;
        let position = jobs.len() + 1;
        jobs.push_back(SubmissionJob {
            source,
            submitter,
            enqueued_at: Utc::now(),
            position,
        });
        tracing::info!(%submitter, position, "submission queued");
        Ok(position)
    }

    /// One drain cycle: dequeue the head job, renumber and notify the rest,
    /// then run the pipeline to completion for the dequeued job. Never
    /// propagates pipeline errors; they become a failure notification.
    pub async fn drain_tick(&self) -> Option<JobOutcome> {
        let (job, moved) = {
            let mut jobs = self.jobs.lock().await;
            let job = jobs.pop_front()?;
            let mut moved = Vec::with_capacity(jobs.len());
            for (index, waiting) in jobs.iter_mut().enumerate() {
                waiting.position = index + 1;
                moved.push((waiting.submitter, waiting.source_name(), waiting.position));
            }
            (job, moved)
        };

        for (submitter, name, position) in moved {
            if let Err(err) = self.notifier.queue_position(submitter, &name, position).await {
                tracing::warn!(%submitter, %err, "failed to deliver position update");
            }
        }

        let name = job.source_name();
        tracing::info!(submitter = %job.submitter, source = %name, "processing submission");

        let outcome = match self.generator.generate(&job.source).await {
            Ok(artifact) => self.deliver(&job, &name, artifact).await,
            Err(err) => {
                tracing::error!(
                    submitter = %job.submitter,
                    source = %name,
                    error = %err,
                    "report build failed"
                );
                self.fail(&job, &name, &err.to_string()).await
            }
        };

        // Terminal in every case: drop the locally downloaded source.
        if let Err(err) = tokio::fs::remove_file(&job.source).await {
            tracing::warn!(source = %job.source.display(), %err, "failed to remove source file");
        }

        Some(outcome)
    }

    async fn deliver(&self, job: &SubmissionJob, name: &str, artifact: PathBuf) -> JobOutcome {
        let size = tokio::fs::metadata(&artifact).await.map(|m| m.len());
        match size {
            Ok(len) if len > 0 => {
                if let Err(err) = self.notifier.report_ready(job.submitter, name, &artifact).await {
                    tracing::warn!(submitter = %job.submitter, %err, "failed to deliver report");
                }
                tracing::info!(
                    submitter = %job.submitter,
                    artifact = %artifact.display(),
                    "report delivered"
                );
                JobOutcome::Delivered(artifact)
            }
            _ => {
                tracing::error!(
                    submitter = %job.submitter,
                    artifact = %artifact.display(),
                    "generated report is missing or empty"
                );
                self.fail(job, name, "generated report was empty").await
            }
        }
    }

    async fn fail(&self, job: &SubmissionJob, name: &str, reason: &str) -> JobOutcome {
        if let Err(err) = self.notifier.report_failed(job.submitter, name, reason).await {
            tracing::warn!(submitter = %job.submitter, %err, "failed to deliver failure notice");
        }
        JobOutcome::Failed(reason.to_string())
    }

    /// Snapshot of (submitter, position) for every queued job, in queue
    /// order.
    pub async fn queued_positions(&self) -> Vec<(SubmitterId, usize)> {
        self.jobs
            .lock()
            .await
            .iter()
            .map(|job| (job.submitter, job.position))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drives the queue by fixed-interval polling — worst-case latency is one
/// interval, and the single task guarantees one build at a time.
pub fn spawn_drain_loop<G, N>(
    queue: Arc<SubmissionQueue<G, N>>,
    period: Duration,
) -> JoinHandle<()>
where
    G: ReportGenerator + 'static,
    N: SubmitterNotifier + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            queue.drain_tick().await;
        }
    })
}

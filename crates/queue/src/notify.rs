use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::job::SubmitterId;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Delivery(String),
}

/// Boundary to the excluded delivery layer (bot, API callback, …). The
/// queue logs notifier failures; they never fail a job or stop the drain
/// loop.
#[async_trait]
pub trait SubmitterNotifier: Send + Sync {
    /// The submitter's file moved to a new queue position.
    async fn queue_position(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        position: usize,
    ) -> Result<(), NotifyError>;

    /// The final artifact is ready for the submitter.
    async fn report_ready(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        artifact: &Path,
    ) -> Result<(), NotifyError>;

    /// The job reached a failed terminal state.
    async fn report_failed(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        reason: &str,
    ) -> Result<(), NotifyError>;
}

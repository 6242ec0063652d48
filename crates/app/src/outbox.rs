use async_trait::async_trait;
use std::path::{Path, PathBuf};

use summa_queue::{NotifyError, SubmitterId, SubmitterNotifier};

/// Stand-in for the excluded delivery layer: position changes and failures
/// are logged, finished artifacts are moved into a per-submitter-named file
/// in the outbox directory.
pub struct OutboxNotifier {
    outbox: PathBuf,
}

impl OutboxNotifier {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self { outbox: outbox.into() }
    }
}

#[async_trait]
impl SubmitterNotifier for OutboxNotifier {
    async fn queue_position(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        position: usize,
    ) -> Result<(), NotifyError> {
        tracing::info!(%submitter, source = source_name, position, "queue position changed");
        Ok(())
    }

    async fn report_ready(
        &self,
        submitter: SubmitterId,
        _source_name: &str,
        artifact: &Path,
    ) -> Result<(), NotifyError> {
        tokio::fs::create_dir_all(&self.outbox)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        let name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pdf".to_string());
        let destination = self.outbox.join(format!("{submitter}_{name}"));
        tokio::fs::rename(artifact, &destination)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::info!(%submitter, destination = %destination.display(), "report delivered to outbox");
        Ok(())
    }

    async fn report_failed(
        &self,
        submitter: SubmitterId,
        source_name: &str,
        reason: &str,
    ) -> Result<(), NotifyError> {
        tracing::warn!(%submitter, source = source_name, reason, "report build failed");
        Ok(())
    }
}

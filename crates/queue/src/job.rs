use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifier of whoever submitted an upload. Opaque to the queue: it only
/// gates on the allowed set and routes notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmitterId(pub i64);

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One queued submission. Owned exclusively by the queue from enqueue to
/// terminal state; `position` is recomputed whenever a job ahead drains.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    pub source: PathBuf,
    pub submitter: SubmitterId,
    pub enqueued_at: DateTime<Utc>,
    pub position: usize,
}

impl SubmissionJob {
    /// Display name of the uploaded file, for submitter-facing messages.
    pub fn source_name(&self) -> String {
        file_name(&self.source)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Terminal state of one drained job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Delivered(PathBuf),
    Failed(String),
}

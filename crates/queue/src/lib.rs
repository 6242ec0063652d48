pub mod job;
pub mod notify;
pub mod queue;

pub use job::{JobOutcome, SubmissionJob, SubmitterId};
pub use notify::{NotifyError, SubmitterNotifier};
pub use queue::{spawn_drain_loop, SubmissionQueue, SubmitError};

pub use summa_report::ReportGenerator;

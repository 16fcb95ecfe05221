use serde::{Deserialize, Serialize};

/// Lifecycle of a background batch generation job, as polled by clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Percentage of sites processed so far.
    InProgress(u32),
    Completed(String),
    Failed(String),
    Cancelled(String),
}

impl JobStatus {
    /// `true` once the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed(_) | JobStatus::Failed(_) | JobStatus::Cancelled(_)
        )
    }
}

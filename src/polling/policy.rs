//! Wait policies for submit-then-poll workflows.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::validations::types::ValidationOverview;

/// How the orchestration waits for a job to complete.
#[derive(Clone)]
pub struct WaitPolicy {
    /// Forwarded as `waitTime` on submission.
    pub submission_wait_time: Duration,
    /// Forwarded as `waitTime` on each poll.
    pub poll_wait_time: Duration,
    /// Keep polling until the job reaches a terminal status.
    pub wait_for_completion: bool,
    /// Invoked with the latest overview before each wait.
    pub progress: Option<ProgressCallback>,
}

/// Progress callback shared across the polls of one job.
pub type ProgressCallback = Arc<dyn Fn(&ValidationOverview) + Send + Sync>;

impl WaitPolicy {
    /// Wait for completion, letting the service hold each response up to 30 s.
    pub const DEFAULT: WaitPolicy = WaitPolicy {
        submission_wait_time: Duration::from_secs(30),
        poll_wait_time: Duration::from_secs(30),
        wait_for_completion: true,
        progress: None,
    };

    /// Return right after submission.
    pub const NO_WAIT: WaitPolicy = WaitPolicy {
        submission_wait_time: Duration::ZERO,
        poll_wait_time: Duration::ZERO,
        wait_for_completion: false,
        progress: None,
    };

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ValidationOverview) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn with_wait_times(mut self, submission: Duration, poll: Duration) -> Self {
        self.submission_wait_time = submission;
        self.poll_wait_time = poll;
        self
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for WaitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitPolicy")
            .field("submission_wait_time", &self.submission_wait_time)
            .field("poll_wait_time", &self.poll_wait_time)
            .field("wait_for_completion", &self.wait_for_completion)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

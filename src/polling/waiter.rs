//! Waits between job completion polls.

use std::time::Duration;

use crate::cancellation::CancellationSignal;
use crate::error::{ClientError, ClientResult};
use crate::polling::delay;
use crate::validations::types::ValidationOverview;

/// Lower bound of the poll delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
/// Upper bound of the poll delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Computes and sleeps the delay before the next poll of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobCompletionWaiter {
    min_delay: Duration,
    max_delay: Duration,
}

impl JobCompletionWaiter {
    pub fn new(min_delay: Duration, max_delay: Duration) -> ClientResult<Self> {
        if min_delay > max_delay {
            return Err(ClientError::Configuration(format!(
                "minimum poll delay {min_delay:?} exceeds maximum {max_delay:?}"
            )));
        }
        Ok(Self {
            min_delay,
            max_delay,
        })
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Delay before the next poll of `overview`.
    ///
    /// Uses the service's remaining-time estimate when it parses, the entry
    /// count otherwise.
    pub fn compute_delay(&self, overview: &ValidationOverview) -> Duration {
        let eta = overview
            .progress
            .as_ref()
            .and_then(|progress| progress.estimated_time_remaining.as_deref())
            .and_then(|raw| {
                let parsed = delay::parse_eta(raw);
                if parsed.is_none() {
                    tracing::debug!(job_id = %overview.id, eta = raw, "Unparseable ETA, using entry count");
                }
                parsed
            });

        let seconds = match eta {
            Some(eta) => eta.as_secs_f64(),
            None => delay::entry_count_delay(overview.no_of_entries),
        };
        delay::clamp_secs(seconds, self.min_delay, self.max_delay)
    }

    /// Sleep for [`compute_delay`](Self::compute_delay), or until `signal`
    /// fires.
    ///
    /// An already cancelled signal fails immediately without arming a timer.
    pub async fn wait(
        &self,
        overview: &ValidationOverview,
        signal: Option<&CancellationSignal>,
    ) -> ClientResult<()> {
        if let Some(signal) = signal {
            signal.ensure_not_cancelled()?;
        }

        let delay = self.compute_delay(overview);
        tracing::debug!(
            job_id = %overview.id,
            delay_ms = delay.as_millis() as u64,
            "Waiting before next poll"
        );

        let Some(signal) = signal else {
            tokio::time::sleep(delay).await;
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = signal.cancelled() => {
                tracing::debug!(job_id = %overview.id, "Poll wait canceled");
                Err(ClientError::OperationCanceled)
            }
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

impl Default for JobCompletionWaiter {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

//! Bounded wait for a remote run to reach a terminal state.
//!
//! Polls with capped exponential backoff, gives up at a deadline, and stops
//! early when the caller's `CancellationToken` fires. On timeout or
//! cancellation the remote run is cancelled on a best-effort basis.

use std::time::Duration;

use memberchat_types::assistant::{Run, RunStatus};
use memberchat_types::config::PollConfig;
use memberchat_types::error::AssistantError;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::client::AssistantClient;

/// Largest backoff factor accepted from configuration.
pub const MAX_MULTIPLIER: f64 = 10.0;

/// Longest total wait accepted from configuration.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Backoff schedule and deadline for [`wait_for_run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: f64,
    pub timeout: Duration,
}

impl PollPolicy {
    /// Build a policy from configuration, clamping nonsensical values.
    pub fn from_config(config: &PollConfig) -> Self {
        let initial_interval = Duration::from_millis(config.initial_interval_ms.max(1));
        let max_interval = Duration::from_millis(config.max_interval_ms).max(initial_interval);
        // NaN compares false everywhere, so it is handled before clamping.
        let multiplier = if config.multiplier.is_nan() {
            1.0
        } else {
            config.multiplier.clamp(1.0, MAX_MULTIPLIER)
        };
        Self {
            initial_interval,
            max_interval,
            multiplier,
            timeout: Duration::from_secs(config.timeout_secs.max(1)).min(MAX_TIMEOUT),
        }
    }

    /// Interval to use after `current`, capped at `max_interval`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .map_or(self.max_interval, |next| next.min(self.max_interval))
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

/// Wait until `run` reaches a terminal status.
///
/// Returns the terminal run as-is (completed or not); use
/// [`into_completed`] to turn non-completed outcomes into errors.
pub async fn wait_for_run<A: AssistantClient>(
    client: &A,
    run: Run,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> Result<Run, AssistantError> {
    let started = Instant::now();
    let deadline = started
        .checked_add(policy.timeout)
        .unwrap_or_else(|| started + MAX_TIMEOUT);
    let mut interval = policy.initial_interval;
    let mut run = run;
    let mut polls: u32 = 0;

    loop {
        if run.status.is_terminal() {
            debug!(run_id = %run.id, status = %run.status, polls, "Run reached terminal state");
            return Ok(run);
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(run_id = %run.id, status = %run.status, polls, "Run exceeded poll deadline");
            cancel_quietly(client, &run).await;
            return Err(AssistantError::Timeout {
                elapsed_secs: started.elapsed().as_secs(),
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancel_quietly(client, &run).await;
                return Err(AssistantError::Cancelled);
            }
            _ = tokio::time::sleep(interval.min(deadline - now)) => {}
        }

        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                cancel_quietly(client, &run).await;
                return Err(AssistantError::Cancelled);
            }
            polled = client.get_run(&run.thread_id, &run.id) => polled?,
        };
        run = polled;
        polls += 1;
        interval = policy.next_interval(interval);
    }
}

/// Map a terminal run to `Ok` only if it completed.
pub fn into_completed(run: Run) -> Result<Run, AssistantError> {
    match run.status {
        RunStatus::Completed => Ok(run),
        RunStatus::Cancelled => Err(AssistantError::Cancelled),
        status => {
            let message = run
                .last_error
                .map(|e| format!("{}: {}", e.code, e.message))
                .unwrap_or_else(|| format!("run {status}"));
            Err(AssistantError::RunFailed { status, message })
        }
    }
}

async fn cancel_quietly<A: AssistantClient>(client: &A, run: &Run) {
    if let Err(e) = client.cancel_run(&run.thread_id, &run.id).await {
        warn!(run_id = %run.id, error = %e, "Failed to cancel remote run");
    }
}

//! Trigger-and-wait workflow.
//!
//! Submits the build exactly once, then (if the wait policy is enabled)
//! polls the queue handle under the fixed-delay retry driver.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::build::QueueHandle;
use crate::client::CiClient;
use crate::config::WaitPolicy;
use crate::error::{TriggerError, TriggerResult};
use crate::poller::ResultPoller;
use crate::progress::{ProgressSink, TriggerEvent};
use crate::retry::{retry_fixed, RetryError, RetryPolicy};
use crate::trigger::{trigger, BuildRequest};

/// What an invocation achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReport {
    /// Job as addressed (`folder/sub/name` for nested jobs).
    pub job: String,
    pub queue_id: QueueHandle,
    /// Set only when waiting was enabled and the build succeeded.
    pub build_number: Option<i64>,
    /// Poll attempts made (0 when not waiting).
    pub attempts: u32,
}

/// Trigger `request` and optionally wait for a terminal result.
///
/// Returns `Ok` only for an unambiguous success: either waiting is disabled
/// and the submission succeeded, or the build finished successfully.
#[instrument(skip_all, fields(job = %request.job_name()))]
pub async fn run_trigger(
    client: &dyn CiClient,
    progress: &dyn ProgressSink,
    request: &BuildRequest,
    wait: &WaitPolicy,
) -> TriggerResult<TriggerReport> {
    let job = request.target().to_string();

    progress.emit(&TriggerEvent::Submitting {
        job: job.clone(),
        params: request.parameters().len(),
        wait: wait.enabled,
    });

    let handle = trigger(client, request).await?;

    progress.emit(&TriggerEvent::Queued {
        job: job.clone(),
        queue_id: handle.id(),
    });

    if !wait.enabled {
        return Ok(TriggerReport {
            job,
            queue_id: handle,
            build_number: None,
            attempts: 0,
        });
    }

    let poller = ResultPoller::new(client, progress, handle, job.clone(), wait.poll_interval);
    let poller = &poller;
    let max_attempts = wait.max_attempts;

    let result = retry_fixed(
        RetryPolicy::new(wait.poll_interval, max_attempts),
        move |attempt| poller.attempt(attempt, max_attempts),
    )
    .await;

    match result {
        Ok(done) => {
            info!(number = done.value, attempts = done.attempts, "build succeeded");
            Ok(TriggerReport {
                job,
                queue_id: handle,
                build_number: Some(done.value),
                attempts: done.attempts,
            })
        }
        Err(RetryError::Failed { error, .. }) => Err(error),
        Err(RetryError::Exhausted {
            attempts,
            last_reason,
        }) => Err(TriggerError::AttemptsExhausted {
            job,
            attempts,
            last: last_reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildState;
    use crate::fakes::{RecordingProgress, ScriptedClient};
    use crate::params::Parameters;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_reports_last_reason() {
        let client = ScriptedClient::new(QueueHandle(1)).then_build(2, BuildState::Running);
        let progress = RecordingProgress::new();
        let request = BuildRequest::new("deploy", vec![], Parameters::new()).unwrap();
        let wait = WaitPolicy::new(true, Duration::from_secs(1), 2).unwrap();

        let err = run_trigger(&client, &progress, &request, &wait)
            .await
            .unwrap_err();

        match err {
            TriggerError::AttemptsExhausted { job, attempts, last } => {
                assert_eq!(job, "deploy");
                assert_eq!(attempts, 2);
                assert!(last.contains("still running"));
            }
            other => panic!("expected AttemptsExhausted, got {:?}", other),
        }
    }
}

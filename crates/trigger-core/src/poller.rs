//! Build result polling.
//!
//! A poll attempt resolves the queue handle to a build, then classifies it:
//!
//! | remote state            | outcome        | retried |
//! |-------------------------|----------------|---------|
//! | lookup error            | (error)        | yes     |
//! | success                 | `Succeeded`    | no      |
//! | running                 | `StillRunning` | yes     |
//! | anything else           | `Failed`       | no      |

use std::time::Duration;

use tracing::{debug, warn};

use crate::build::{BuildOutcome, BuildRecord, QueueHandle};
use crate::client::CiClient;
use crate::error::{TriggerError, TriggerResult};
use crate::progress::{ProgressSink, TriggerEvent};
use crate::retry::Attempt;

/// Polls one queued build. Holds no build state between calls.
pub struct ResultPoller<'a> {
    client: &'a dyn CiClient,
    progress: &'a dyn ProgressSink,
    handle: QueueHandle,
    job: String,
    poll_interval: Duration,
}

impl<'a> ResultPoller<'a> {
    pub fn new(
        client: &'a dyn CiClient,
        progress: &'a dyn ProgressSink,
        handle: QueueHandle,
        job: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            progress,
            handle,
            job: job.into(),
            poll_interval,
        }
    }

    /// Query the server once and classify the build.
    pub async fn poll_once(&self) -> TriggerResult<BuildOutcome> {
        self.fetch().await.map(|(outcome, _)| outcome)
    }

    async fn fetch(&self) -> TriggerResult<(BuildOutcome, BuildRecord)> {
        let build = self
            .client
            .build_from_queue(self.handle)
            .await
            .map_err(|e| TriggerError::ResolutionFailed {
                queue_id: self.handle.id(),
                cause: e.to_string(),
            })?;

        let outcome = BuildOutcome::classify(&build);
        debug!(
            job = %self.job,
            number = build.number,
            state = %build.state,
            ?outcome,
            "classified build"
        );
        Ok((outcome, build))
    }

    /// One attempt for the retry driver. Resolves to the build number on
    /// success.
    pub async fn attempt(&self, attempt: u32, max_attempts: u32) -> Attempt<i64, TriggerError> {
        self.progress.emit(&TriggerEvent::Polling {
            job: self.job.clone(),
            attempt,
            max_attempts,
        });

        match self.fetch().await {
            Ok((BuildOutcome::Succeeded(number), build)) => {
                self.progress.emit(&TriggerEvent::Succeeded {
                    job: self.job.clone(),
                    number,
                    url: build.url,
                });
                Attempt::Done(Ok(number))
            }
            Ok((BuildOutcome::StillRunning(number), _)) => {
                self.progress.emit(&TriggerEvent::StillRunning {
                    job: self.job.clone(),
                    number,
                    retry_after: self.poll_interval,
                });
                Attempt::Retry(format!("build number {} is still running", number))
            }
            Ok((BuildOutcome::Failed(number), build)) => {
                self.progress.emit(&TriggerEvent::Failed {
                    job: self.job.clone(),
                    number,
                    url: build.url,
                });
                Attempt::Done(Err(TriggerError::BuildFailed {
                    job: self.job.clone(),
                    number,
                }))
            }
            Err(err) if err.is_retryable() => {
                warn!(job = %self.job, queue_id = self.handle.id(), error = %err, "queue item not resolved");
                self.progress.emit(&TriggerEvent::NotResolved {
                    job: self.job.clone(),
                    reason: err.to_string(),
                    retry_after: self.poll_interval,
                });
                Attempt::Retry(err.to_string())
            }
            Err(err) => Attempt::Done(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildState;
    use crate::error::ClientError;
    use crate::fakes::{RecordingProgress, ScriptedClient};
    use crate::progress::SilentProgress;

    fn poller<'a>(client: &'a ScriptedClient, progress: &'a dyn ProgressSink) -> ResultPoller<'a> {
        ResultPoller::new(client, progress, QueueHandle(5), "deploy", Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_poll_once_is_idempotent_for_unchanged_state() {
        let client = ScriptedClient::new(QueueHandle(5)).then_build(9, BuildState::Running);
        let poller = poller(&client, &SilentProgress);

        let first = poller.poll_once().await.unwrap();
        let second = poller.poll_once().await.unwrap();

        assert_eq!(first, BuildOutcome::StillRunning(9));
        assert_eq!(first, second);
        assert_eq!(client.poll_count(), 2);
        assert_eq!(client.polled_handles(), vec![QueueHandle(5), QueueHandle(5)]);
    }

    #[tokio::test]
    async fn test_poll_once_follows_remote_state() {
        let client = ScriptedClient::new(QueueHandle(5))
            .then_build(9, BuildState::Running)
            .then_build(9, BuildState::Success);
        let poller = poller(&client, &SilentProgress);

        assert_eq!(poller.poll_once().await.unwrap(), BuildOutcome::StillRunning(9));
        assert_eq!(poller.poll_once().await.unwrap(), BuildOutcome::Succeeded(9));
    }

    #[tokio::test]
    async fn test_lookup_error_is_resolution_failed() {
        let client = ScriptedClient::new(QueueHandle(5))
            .then(Err(ClientError::Transport("connection reset".to_string())));
        let poller = poller(&client, &SilentProgress);

        let err = poller.poll_once().await.unwrap_err();
        assert!(matches!(err, TriggerError::ResolutionFailed { queue_id: 5, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_attempt_maps_outcomes() {
        let progress = RecordingProgress::new();
        let client = ScriptedClient::new(QueueHandle(5))
            .then(Err(ClientError::NotYetScheduled(5)))
            .then_build(3, BuildState::Running)
            .then_build(3, BuildState::Aborted);
        let poller = poller(&client, &progress);

        assert!(matches!(poller.attempt(1, 3).await, Attempt::Retry(_)));
        assert!(matches!(poller.attempt(2, 3).await, Attempt::Retry(_)));
        match poller.attempt(3, 3).await {
            Attempt::Done(Err(TriggerError::BuildFailed { job, number })) => {
                assert_eq!(job, "deploy");
                assert_eq!(number, 3);
            }
            other => panic!("expected BuildFailed, got {:?}", other),
        }

        assert_eq!(progress.poll_attempts(), 3);
        assert!(progress
            .events()
            .contains(&TriggerEvent::Failed {
                job: "deploy".to_string(),
                number: 3,
                url: None,
            }));
    }

    #[tokio::test]
    async fn test_terminal_events_report_build_url() {
        let progress = RecordingProgress::new();
        let client = ScriptedClient::new(QueueHandle(5)).then(Ok(BuildRecord {
            number: 12,
            state: BuildState::Success,
            url: Some("http://ci/job/deploy/12/".to_string()),
        }));
        let poller = poller(&client, &progress);

        assert!(matches!(poller.attempt(1, 1).await, Attempt::Done(Ok(12))));
        assert_eq!(
            progress.events().last(),
            Some(&TriggerEvent::Succeeded {
                job: "deploy".to_string(),
                number: 12,
                url: Some("http://ci/job/deploy/12/".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_state_is_not_retried() {
        let client = ScriptedClient::new(QueueHandle(5))
            .then_build(4, BuildState::Unknown(String::new()));
        let poller = poller(&client, &SilentProgress);

        assert!(matches!(
            poller.attempt(1, 60).await,
            Attempt::Done(Err(TriggerError::BuildFailed { number: 4, .. }))
        ));
    }
}

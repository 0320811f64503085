//! Progress events emitted while triggering and polling.
//!
//! The workflow reports each step to a [`ProgressSink`]; the CLI prints
//! them as human-readable lines. `Display` renders that line.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One observable step of an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TriggerEvent {
    Submitting { job: String, params: usize, wait: bool },
    Queued { job: String, queue_id: i64 },
    Polling { job: String, attempt: u32, max_attempts: u32 },
    StillRunning { job: String, number: i64, retry_after: Duration },
    NotResolved { job: String, reason: String, retry_after: Duration },
    Succeeded { job: String, number: i64, url: Option<String> },
    Failed { job: String, number: i64, url: Option<String> },
}

impl std::fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerEvent::Submitting { job, params, wait } => write!(
                f,
                "Triggering Jenkins build for job: {} ({} parameter(s), wait: {})",
                job, params, wait
            ),
            TriggerEvent::Queued { job, queue_id } => {
                write!(f, "Job {} triggered successfully (queue item {})", job, queue_id)
            }
            TriggerEvent::Polling {
                job,
                attempt,
                max_attempts,
            } => write!(
                f,
                "Polling build result for job {} (attempt {}/{})",
                job, attempt, max_attempts
            ),
            TriggerEvent::StillRunning {
                job,
                number,
                retry_after,
            } => write!(
                f,
                "Job {}, build number {} is still running, retry after {:?}",
                job, number, retry_after
            ),
            TriggerEvent::NotResolved {
                job,
                reason,
                retry_after,
            } => write!(
                f,
                "Job {} has no build yet ({}), retry after {:?}",
                job, reason, retry_after
            ),
            TriggerEvent::Succeeded { job, number, url } => {
                write!(f, "Job {}, build number {} completed successfully", job, number)?;
                write_url(f, url.as_deref())
            }
            TriggerEvent::Failed { job, number, url } => {
                write!(
                    f,
                    "Job {}, build number {} did not complete successfully",
                    job, number
                )?;
                write_url(f, url.as_deref())
            }
        }
    }
}

fn write_url(f: &mut std::fmt::Formatter<'_>, url: Option<&str>) -> std::fmt::Result {
    match url {
        Some(url) => write!(f, " ({})", url),
        None => Ok(()),
    }
}

/// Receiver of progress events.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &TriggerEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, _event: &TriggerEvent) {}
}

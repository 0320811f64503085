//! Error types for trigger-core

use thiserror::Error;

/// Errors produced while triggering a build or waiting for its result.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// `--params-json` was not a JSON object of strings
    #[error("Malformed job parameters: {0}")]
    MalformedParameters(String),

    /// Job name was blank or contained `/`
    #[error("Invalid job name: {0:?}")]
    InvalidJobName(String),

    /// Wait policy had a zero interval or zero attempts
    #[error("Invalid wait policy: {0}")]
    InvalidWaitPolicy(String),

    /// Duration string could not be parsed
    #[error("Invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    /// Submitting the build to the server failed
    #[error("Failed to trigger job {job}: {cause}")]
    TriggerFailed { job: String, cause: String },

    /// Resolving the queue item to a build failed (retryable)
    #[error("Failed to resolve queue item {queue_id}: {cause}")]
    ResolutionFailed { queue_id: i64, cause: String },

    /// Build reached a terminal state other than success
    #[error("Job {job} build number {number} did not complete successfully")]
    BuildFailed { job: String, number: i64 },

    /// Every poll attempt was used up before the build finished
    #[error("Job {job} still not finished after {attempts} poll attempt(s): {last}")]
    AttemptsExhausted {
        job: String,
        attempts: u32,
        last: String,
    },
}

impl TriggerError {
    /// Whether a poll attempt that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TriggerError::ResolutionFailed { .. })
    }
}

/// Result type for trigger operations
pub type TriggerResult<T> = std::result::Result<T, TriggerError>;

/// Errors reported by a [`CiClient`](crate::client::CiClient) implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Queue item exists but no build has been assigned yet
    #[error("Queue item {0} has not started a build yet")]
    NotYetScheduled(i64),

    /// Queue item was cancelled before a build started
    #[error("Queue item {0} was cancelled")]
    QueueItemCancelled(i64),

    /// Job, folder or queue item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing or rejected
    #[error("Authentication rejected: {0}")]
    Unauthorized(String),

    /// Network or HTTP-level failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Server answered with something we could not interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for CI client calls
pub type ClientResult<T> = std::result::Result<T, ClientError>;

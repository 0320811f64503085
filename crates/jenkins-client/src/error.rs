//! Error types for jenkins-client

use thiserror::Error;
use trigger_core::ClientError;

/// Errors that can occur talking to a Jenkins server
#[derive(Error, Debug)]
pub enum JenkinsError {
    /// Base URL or a URL returned by the server did not parse
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (connect, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Credentials missing or rejected (401/403)
    #[error("Unauthorized ({status}) for {url}")]
    Unauthorized { status: u16, url: String },

    /// Job, folder or queue item does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status
    #[error("Unexpected status {status} for {url}")]
    Status { status: u16, url: String },

    /// Build submission response had no usable `Location` header
    #[error("Invalid queue location: {0:?}")]
    InvalidQueueLocation(String),

    /// Queue item has no executable yet
    #[error("Queue item {0} has not started a build yet")]
    NotYetScheduled(i64),

    /// Queue item was cancelled
    #[error("Queue item {0} was cancelled")]
    QueueItemCancelled(i64),

    /// Response body did not decode
    #[error("JSON decoding error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for JenkinsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            JenkinsError::Json(err.to_string())
        } else {
            JenkinsError::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for JenkinsError {
    fn from(err: url::ParseError) -> Self {
        JenkinsError::InvalidUrl(err.to_string())
    }
}

impl From<JenkinsError> for ClientError {
    fn from(err: JenkinsError) -> Self {
        match err {
            JenkinsError::NotYetScheduled(id) => ClientError::NotYetScheduled(id),
            JenkinsError::QueueItemCancelled(id) => ClientError::QueueItemCancelled(id),
            JenkinsError::NotFound(what) => ClientError::NotFound(what),
            JenkinsError::Unauthorized { .. } => ClientError::Unauthorized(err.to_string()),
            JenkinsError::Http(_) => ClientError::Transport(err.to_string()),
            JenkinsError::InvalidUrl(_)
            | JenkinsError::Status { .. }
            | JenkinsError::InvalidQueueLocation(_)
            | JenkinsError::Json(_) => ClientError::UnexpectedResponse(err.to_string()),
        }
    }
}

/// Result type for Jenkins calls
pub type Result<T> = std::result::Result<T, JenkinsError>;

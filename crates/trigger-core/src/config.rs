//! Runtime configuration.
//!
//! Built once at startup (by the CLI or a caller embedding the library) and
//! passed down by reference. Nothing here is read from process-wide state
//! after construction.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TriggerError, TriggerResult};
use crate::params::Parameters;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Connection settings for the Jenkins server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server
    pub url: String,
    /// User name for basic auth
    pub user: Option<String>,
    /// Personal access token (API token) for basic auth
    pub token: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: DEFAULT_SERVER_URL.to_string(),
            user: None,
            token: None,
            insecure: false,
        }
    }
}

impl ServerConfig {
    /// Create config for a specific server
    pub fn new(url: &str) -> Self {
        ServerConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    /// Set basic auth credentials
    pub fn with_credentials(mut self, user: &str, token: &str) -> Self {
        self.user = Some(user.to_string());
        self.token = Some(token.to_string());
        self
    }

    /// Both user and token are present and non-empty.
    pub fn has_credentials(&self) -> bool {
        matches!((&self.user, &self.token), (Some(u), Some(t)) if !u.is_empty() && !t.is_empty())
    }
}

/// Whether and how to wait for the triggered build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Wait for the build to finish
    pub enabled: bool,
    /// Fixed delay between poll attempts
    pub poll_interval: Duration,
    /// Maximum number of poll attempts
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            enabled: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl WaitPolicy {
    /// Validated constructor: interval and attempt count must be non-zero.
    pub fn new(enabled: bool, poll_interval: Duration, max_attempts: u32) -> TriggerResult<Self> {
        if poll_interval.is_zero() {
            return Err(TriggerError::InvalidWaitPolicy(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(TriggerError::InvalidWaitPolicy(
                "max attempts must be greater than zero".to_string(),
            ));
        }
        Ok(WaitPolicy {
            enabled,
            poll_interval,
            max_attempts,
        })
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// What to build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name
    pub name: String,
    /// Folder segments, each possibly `/`-delimited
    pub folders: Vec<String>,
    /// Resolved build parameters
    pub params: Parameters,
}

/// Complete configuration for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub server: ServerConfig,
    pub job: JobConfig,
    pub wait: WaitPolicy,
}

/// Parse a duration such as `10s`, `1m30s`, `500ms` or `2h`.
///
/// Every number needs a unit; the total must be non-zero.
pub fn parse_duration(input: &str) -> TriggerResult<Duration> {
    let trimmed = input.trim();
    let invalid = |reason: &str| TriggerError::InvalidDuration {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(invalid("duration cannot be empty"));
    }

    let mut total = Duration::ZERO;
    let mut rest = trimmed;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(invalid("expected a number"));
        }
        let value: u64 = rest[..digits]
            .parse()
            .map_err(|_| invalid("number out of range"))?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.saturating_mul(60)),
            "h" => Duration::from_secs(value.saturating_mul(3600)),
            "" => return Err(invalid("missing unit (expected ms, s, m or h)")),
            _ => return Err(invalid(&format!("unknown unit '{}'", unit))),
        };
        total = total.saturating_add(part);
    }

    if total.is_zero() {
        return Err(invalid("duration must be greater than zero"));
    }

    Ok(total)
}

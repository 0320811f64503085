//! Build, queue and outcome types.

use serde::{Deserialize, Serialize};

/// Opaque queue item id returned when a build is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueHandle(pub i64);

impl QueueHandle {
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for QueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of a build as reported by the server.
///
/// Closed set of the results Jenkins reports, plus `Unknown` for anything
/// else (including a finished build with no result).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Success,
    Running,
    Failure,
    Aborted,
    Unstable,
    NotBuilt,
    Unknown(String),
}

impl BuildState {
    /// Classify the `building` flag and `result` field of a build.
    pub fn from_remote(building: bool, result: Option<&str>) -> Self {
        if building {
            return BuildState::Running;
        }
        match result {
            Some("SUCCESS") => BuildState::Success,
            Some("FAILURE") => BuildState::Failure,
            Some("ABORTED") => BuildState::Aborted,
            Some("UNSTABLE") => BuildState::Unstable,
            Some("NOT_BUILT") => BuildState::NotBuilt,
            Some(other) => BuildState::Unknown(other.to_string()),
            None => BuildState::Unknown(String::new()),
        }
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildState::Success => write!(f, "SUCCESS"),
            BuildState::Running => write!(f, "RUNNING"),
            BuildState::Failure => write!(f, "FAILURE"),
            BuildState::Aborted => write!(f, "ABORTED"),
            BuildState::Unstable => write!(f, "UNSTABLE"),
            BuildState::NotBuilt => write!(f, "NOT_BUILT"),
            BuildState::Unknown(raw) if raw.is_empty() => write!(f, "UNKNOWN"),
            BuildState::Unknown(raw) => write!(f, "UNKNOWN({})", raw),
        }
    }
}

/// One concrete execution of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Build number assigned by the server.
    pub number: i64,

    /// Current state.
    pub state: BuildState,

    /// Build URL, when the server reported one.
    pub url: Option<String>,
}

impl BuildRecord {
    pub fn new(number: i64, state: BuildState) -> Self {
        Self {
            number,
            state,
            url: None,
        }
    }

    /// Finished with a successful result.
    pub fn is_good(&self) -> bool {
        self.state == BuildState::Success
    }

    /// Not yet terminal.
    pub fn is_running(&self) -> bool {
        self.state == BuildState::Running
    }

    pub fn number(&self) -> i64 {
        self.number
    }
}

/// Classification of one poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    StillRunning(i64),
    Succeeded(i64),
    Failed(i64),
}

impl BuildOutcome {
    /// Fail-fast classification: only an explicit success or running state
    /// avoids `Failed`.
    pub fn classify(build: &BuildRecord) -> Self {
        if build.is_good() {
            BuildOutcome::Succeeded(build.number())
        } else if build.is_running() {
            BuildOutcome::StillRunning(build.number())
        } else {
            BuildOutcome::Failed(build.number())
        }
    }
}

//! Job addressing.
//!
//! Jenkins exposes two invocation shapes: a direct lookup by job name, and
//! an explicit folder-qualified path (`/job/a/job/b/job/name`). By-name
//! lookup does not traverse folders, so any folder segment forces the
//! nested form.

use serde::{Deserialize, Serialize};

/// Where a job lives on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobTarget {
    /// Job at the server root, addressed by name.
    TopLevel(String),

    /// Job inside one or more folders. The last segment is the job name.
    Nested { segments: Vec<String> },
}

impl JobTarget {
    /// Build the target for `job_name` inside `folders`.
    ///
    /// Each folder entry may itself contain `/`; pieces are trimmed and
    /// empty pieces dropped.
    pub fn resolve(folders: &[String], job_name: &str) -> Self {
        let mut segments = flatten_folders(folders);
        if segments.is_empty() {
            return JobTarget::TopLevel(job_name.to_string());
        }
        segments.push(job_name.to_string());
        JobTarget::Nested { segments }
    }

    /// Path segments, folders first and job name last.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            JobTarget::TopLevel(name) => vec![name.as_str()],
            JobTarget::Nested { segments } => segments.iter().map(String::as_str).collect(),
        }
    }

    /// Invocation path, e.g. `/job/team/job/sub/job/deploy`.
    pub fn path(&self) -> String {
        self.segments()
            .iter()
            .map(|segment| format!("/job/{}", segment))
            .collect()
    }

    pub fn is_nested(&self) -> bool {
        matches!(self, JobTarget::Nested { .. })
    }
}

impl std::fmt::Display for JobTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

fn flatten_folders(folders: &[String]) -> Vec<String> {
    folders
        .iter()
        .flat_map(|entry| entry.split('/'))
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

//! Build submission.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::build::QueueHandle;
use crate::client::CiClient;
use crate::config::JobConfig;
use crate::error::{TriggerError, TriggerResult};
use crate::job_path::JobTarget;
use crate::params::Parameters;

/// A single build submission: which job, where, with what parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    job_name: String,
    folders: Vec<String>,
    parameters: Parameters,
}

impl BuildRequest {
    /// Create a request. The job name must not be blank and must not contain
    /// `/`; folders go in `folders`.
    pub fn new(job_name: &str, folders: Vec<String>, parameters: Parameters) -> TriggerResult<Self> {
        if job_name.trim().is_empty() || job_name.contains('/') {
            return Err(TriggerError::InvalidJobName(job_name.to_string()));
        }
        Ok(Self {
            job_name: job_name.to_string(),
            folders,
            parameters,
        })
    }

    pub fn from_job_config(job: &JobConfig) -> TriggerResult<Self> {
        Self::new(&job.name, job.folders.clone(), job.params.clone())
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Resolve where the job lives.
    pub fn target(&self) -> JobTarget {
        JobTarget::resolve(&self.folders, &self.job_name)
    }
}

/// Submit `request` once and return the queue handle.
///
/// Failures are not retried: a failed submission may still have queued a
/// build on the server.
pub async fn trigger(client: &dyn CiClient, request: &BuildRequest) -> TriggerResult<QueueHandle> {
    let target = request.target();
    debug!(
        job = %target,
        nested = target.is_nested(),
        params = request.parameters().len(),
        "submitting build"
    );

    let submitted = match &target {
        JobTarget::TopLevel(name) => client.build_job(name, request.parameters()).await,
        JobTarget::Nested { .. } => {
            client
                .build_job_at_path(&target.path(), request.parameters())
                .await
        }
    };

    let handle = submitted.map_err(|e| TriggerError::TriggerFailed {
        job: target.to_string(),
        cause: e.to_string(),
    })?;

    info!(job = %target, queue_id = handle.id(), "build queued");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::fakes::{ScriptedClient, SubmitCall};

    fn params(items: &[(&str, &str)]) -> Parameters {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_job_name_rejected() {
        let err = BuildRequest::new("  ", vec![], Parameters::new()).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidJobName(_)));
    }

    #[test]
    fn test_job_name_with_slash_rejected() {
        for name in ["team/deploy", "/deploy", "deploy/"] {
            let err = BuildRequest::new(name, vec!["org".to_string()], Parameters::new()).unwrap_err();
            assert!(matches!(err, TriggerError::InvalidJobName(ref n) if n == name));
        }
        assert!(BuildRequest::new("team/deploy", vec![], Parameters::new()).is_err());
    }

    #[tokio::test]
    async fn test_top_level_job_uses_by_name_call() {
        let client = ScriptedClient::new(QueueHandle(11));
        let request = BuildRequest::new("deploy", vec![], params(&[("env", "prod")])).unwrap();

        let handle = trigger(&client, &request).await.unwrap();

        assert_eq!(handle, QueueHandle(11));
        assert_eq!(
            client.submissions(),
            vec![SubmitCall::ByName {
                name: "deploy".to_string(),
                params: params(&[("env", "prod")]),
            }]
        );
    }

    #[tokio::test]
    async fn test_folder_job_uses_path_call() {
        let client = ScriptedClient::new(QueueHandle(12));
        let request = BuildRequest::new(
            "deploy",
            vec!["team/sub".to_string()],
            params(&[("env", "prod")]),
        )
        .unwrap();

        assert_eq!(request.target().segments(), vec!["team", "sub", "deploy"]);
        trigger(&client, &request).await.unwrap();

        assert_eq!(
            client.submissions(),
            vec![SubmitCall::AtPath {
                path: "/job/team/job/sub/job/deploy".to_string(),
                params: params(&[("env", "prod")]),
            }]
        );
    }

    #[tokio::test]
    async fn test_submit_error_is_trigger_failed() {
        let client = ScriptedClient::new(QueueHandle(1))
            .failing_submit(ClientError::NotFound("job/missing".to_string()));
        let request = BuildRequest::new("missing", vec![], Parameters::new()).unwrap();

        let err = trigger(&client, &request).await.unwrap_err();

        match err {
            TriggerError::TriggerFailed { job, cause } => {
                assert_eq!(job, "missing");
                assert!(cause.contains("job/missing"));
            }
            other => panic!("expected TriggerFailed, got {:?}", other),
        }
        assert_eq!(client.submissions().len(), 1);
    }
}

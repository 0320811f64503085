//! Jenkins HTTP client
//!
//! Speaks the Jenkins remote access JSON API:
//!
//! - `POST {job}/build` or `{job}/buildWithParameters` to queue a build;
//!   the queue item id comes back in the `Location` header.
//! - `GET queue/item/{id}/api/json` to find the build a queue item started.
//! - `GET {build}/api/json` for the build's `building`/`result` fields.
//!
//! A CSRF crumb is fetched lazily before the first POST. Servers without
//! CSRF protection answer 404 on the crumb issuer and no header is sent.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

use trigger_core::{
    BuildRecord, BuildState, CiClient, ClientResult, Parameters, QueueHandle, ServerConfig,
};

use crate::error::{JenkinsError, Result};

/// CSRF protection header and value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crumb {
    pub crumb: String,
    pub crumb_request_field: String,
}

/// Basic facts about the server, from `GET api/json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    /// Value of the `X-Jenkins` response header.
    pub version: Option<String>,
    /// `nodeDescription` from the JSON body.
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootInfo {
    node_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueItem {
    #[serde(default)]
    cancelled: bool,
    executable: Option<Executable>,
}

#[derive(Debug, Deserialize)]
struct Executable {
    number: i64,
    url: String,
}

#[derive(Debug, Deserialize)]
struct BuildInfo {
    number: i64,
    #[serde(default)]
    building: bool,
    result: Option<String>,
    url: Option<String>,
}

/// Jenkins client for triggering and polling builds
pub struct JenkinsClient {
    base: Url,
    http: reqwest::Client,
    user: Option<String>,
    token: Option<String>,
    crumb: OnceCell<Option<Crumb>>,
}

impl JenkinsClient {
    /// Create a client for the server described by `config`.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let mut base = Url::parse(config.url.trim())?;
        if base.cannot_be_a_base() {
            return Err(JenkinsError::InvalidUrl(config.url.clone()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("jenkins-trigger/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        let (user, token) = if config.has_credentials() {
            (config.user.clone(), config.token.clone())
        } else {
            (None, None)
        };

        Ok(JenkinsClient {
            base,
            http,
            user,
            token,
            crumb: OnceCell::new(),
        })
    }

    /// Base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Check the server is reachable and the credentials are accepted.
    pub async fn ping(&self) -> Result<ServerInfo> {
        let url = self.base.join("api/json")?;
        let response = check_status(self.get(url).send().await?)?;

        let version = response
            .headers()
            .get("X-Jenkins")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let root: RootInfo = response.json().await?;

        debug!(?version, "connected to Jenkins");
        Ok(ServerInfo {
            version,
            description: root.node_description,
        })
    }

    /// URL of the job addressed by `segments` (folders first, job last).
    pub fn job_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| JenkinsError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push("job").push(segment);
            }
            // trailing slash
            path.push("");
        }
        Ok(url)
    }

    /// Queue a build of the job at `segments` and return its queue item id.
    pub async fn submit(&self, segments: &[&str], params: &Parameters) -> Result<QueueHandle> {
        let job_url = self.job_url(segments)?;
        let endpoint = if params.is_empty() {
            "build"
        } else {
            "buildWithParameters"
        };
        let url = job_url.join(endpoint)?;

        let mut request = self.with_crumb(self.http.post(url.clone())).await?;
        if !params.is_empty() {
            request = request.form(params);
        }

        let response = check_status(request.send().await?)?;
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| JenkinsError::InvalidQueueLocation(String::new()))?;

        let handle = parse_queue_location(location)?;
        info!(url = %url, queue_id = handle.id(), "build submitted");
        Ok(handle)
    }

    /// Find the build started by a queue item and fetch its state.
    pub async fn queued_build(&self, handle: QueueHandle) -> Result<BuildRecord> {
        let url = self
            .base
            .join(&format!("queue/item/{}/api/json", handle.id()))?;
        let item: QueueItem = check_status(self.get(url).send().await?)?.json().await?;

        if item.cancelled {
            return Err(JenkinsError::QueueItemCancelled(handle.id()));
        }
        let executable = item
            .executable
            .ok_or(JenkinsError::NotYetScheduled(handle.id()))?;

        let build_url = self.rebase(&executable.url)?.join("api/json")?;
        let info: BuildInfo = check_status(self.get(build_url).send().await?)?.json().await?;

        debug!(
            queue_id = handle.id(),
            number = info.number,
            building = info.building,
            result = ?info.result,
            "fetched build"
        );

        Ok(BuildRecord {
            number: if info.number > 0 { info.number } else { executable.number },
            state: BuildState::from_remote(info.building, info.result.as_deref()),
            url: info.url.or(Some(executable.url)),
        })
    }

    /// Crumb for CSRF-protected servers, fetched once.
    pub async fn crumb(&self) -> Result<Option<Crumb>> {
        self.crumb
            .get_or_try_init(|| self.fetch_crumb())
            .await
            .cloned()
    }

    async fn fetch_crumb(&self) -> Result<Option<Crumb>> {
        let url = self.base.join("crumbIssuer/api/json")?;
        let response = self.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("crumb issuer disabled");
            return Ok(None);
        }
        let crumb: Crumb = check_status(response)?.json().await?;
        Ok(Some(crumb))
    }

    fn get(&self, url: Url) -> RequestBuilder {
        self.authorize(self.http.get(url))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user {
            Some(user) => request.basic_auth(user, self.token.as_ref()),
            None => request,
        }
    }

    async fn with_crumb(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let request = self.authorize(request);
        Ok(match self.crumb().await? {
            Some(crumb) => request.header(crumb.crumb_request_field.as_str(), crumb.crumb),
            None => request,
        })
    }

    /// Point a server-reported URL at our configured origin. Jenkins reports
    /// URLs using its own root URL setting, which may differ from the address
    /// we reach it by.
    fn rebase(&self, remote: &str) -> Result<Url> {
        let remote = Url::parse(remote)?;
        let mut url = self.base.clone();
        url.set_path(remote.path());
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

#[async_trait]
impl CiClient for JenkinsClient {
    async fn build_job(&self, name: &str, params: &Parameters) -> ClientResult<QueueHandle> {
        Ok(self.submit(&[name], params).await?)
    }

    async fn build_job_at_path(
        &self,
        path: &str,
        params: &Parameters,
    ) -> ClientResult<QueueHandle> {
        let segments = segments_from_path(path)?;
        Ok(self.submit(&segments, params).await?)
    }

    async fn build_from_queue(&self, handle: QueueHandle) -> ClientResult<BuildRecord> {
        Ok(self.queued_build(handle).await?)
    }
}

/// Split `/job/a/job/b/job/name` into `["a", "b", "name"]`.
///
/// Every piece must sit in a `job/<segment>` pair; anything else is rejected
/// rather than skipped, so a malformed path never addresses a different job.
pub fn segments_from_path(path: &str) -> Result<Vec<&str>> {
    let invalid = || JenkinsError::InvalidUrl(path.to_string());
    let pieces: Vec<&str> = path.strip_prefix('/').ok_or_else(invalid)?.split('/').collect();
    if pieces.len() % 2 != 0 {
        return Err(invalid());
    }
    pieces
        .chunks(2)
        .map(|pair| match pair {
            ["job", segment] if !segment.is_empty() => Ok(*segment),
            _ => Err(invalid()),
        })
        .collect()
}

/// Extract the queue item id from a `Location` such as
/// `http://host/queue/item/123/`.
pub fn parse_queue_location(location: &str) -> Result<QueueHandle> {
    let invalid = || JenkinsError::InvalidQueueLocation(location.to_string());
    let mut pieces = location.trim_end_matches('/').rsplit('/');
    let id = pieces.next().ok_or_else(invalid)?;
    if pieces.next() != Some("item") {
        return Err(invalid());
    }
    id.parse::<i64>().map(QueueHandle).map_err(|_| invalid())
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => JenkinsError::Unauthorized {
            status: status.as_u16(),
            url,
        },
        StatusCode::NOT_FOUND => JenkinsError::NotFound(url),
        _ => JenkinsError::Status {
            status: status.as_u16(),
            url,
        },
    })
}

//! CI server client abstraction.
//!
//! The workflow only needs three calls: submit by name, submit by nested
//! path, and resolve a queue item to a build. Implementations own the
//! transport (HTTP, auth, TLS); an in-memory implementation lives in the
//! `fakes` module.

use async_trait::async_trait;

use crate::build::{BuildRecord, QueueHandle};
use crate::error::ClientResult;
use crate::params::Parameters;

/// Remote CI server operations used by the trigger workflow.
#[async_trait]
pub trait CiClient: Send + Sync {
    /// Submit a build of a top-level job looked up by name.
    async fn build_job(&self, name: &str, params: &Parameters) -> ClientResult<QueueHandle>;

    /// Submit a build of the job at an explicit nested path
    /// (`/job/folder/job/name`).
    async fn build_job_at_path(&self, path: &str, params: &Parameters)
        -> ClientResult<QueueHandle>;

    /// Resolve a queue item to its build and fetch the build's current state.
    ///
    /// Must query the server on every call.
    async fn build_from_queue(&self, handle: QueueHandle) -> ClientResult<BuildRecord>;
}

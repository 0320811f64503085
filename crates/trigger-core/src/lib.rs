//! trigger-core: trigger a Jenkins job and wait for its result
//!
//! The workflow is:
//! 1. resolve parameters ([`resolve_parameters`]),
//! 2. address the job, top-level or inside folders ([`JobTarget`]),
//! 3. submit the build once ([`trigger`]),
//! 4. optionally poll the queued build under a bounded fixed-delay retry
//!    loop ([`ResultPoller`], [`retry_fixed`]) until it succeeds, fails or
//!    the attempt budget runs out.
//!
//! The server itself sits behind the [`CiClient`] trait; the
//! `jenkins-client` crate provides the HTTP implementation and
//! [`fakes`] an in-memory one.

pub mod build;
pub mod client;
pub mod config;
pub mod error;
pub mod fakes;
pub mod job_path;
pub mod params;
pub mod poller;
pub mod progress;
pub mod retry;
pub mod telemetry;
pub mod trigger;
pub mod workflow;

pub use build::{BuildOutcome, BuildRecord, BuildState, QueueHandle};
pub use client::CiClient;
pub use config::{parse_duration, JobConfig, ServerConfig, TriggerConfig, WaitPolicy};
pub use error::{ClientError, ClientResult, TriggerError, TriggerResult};
pub use job_path::JobTarget;
pub use params::{resolve_parameters, Parameters};
pub use poller::ResultPoller;
pub use progress::{ProgressSink, SilentProgress, TriggerEvent};
pub use retry::{retry_fixed, Attempt, Retried, RetryError, RetryPolicy};
pub use telemetry::init_tracing;
pub use trigger::{trigger, BuildRequest};
pub use workflow::{run_trigger, TriggerReport};

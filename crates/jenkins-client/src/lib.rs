//! jenkins-client: Jenkins remote access API client
//!
//! Implements [`trigger_core::CiClient`] over HTTP with reqwest: build
//! submission (by name or folder path), queue item resolution and build
//! status lookup, with basic auth, CSRF crumbs and an optional TLS
//! verification bypass.

pub mod client;
pub mod error;

pub use client::{parse_queue_location, segments_from_path, Crumb, JenkinsClient, ServerInfo};
pub use error::{JenkinsError, Result};

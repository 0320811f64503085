//! In-memory fakes for the CI client (testing only)
//!
//! `ScriptedClient` records every submission and replays a scripted
//! sequence of queue resolutions, one per `build_from_queue` call. The
//! last scripted response repeats once the script runs out, which models
//! a server whose state has stopped changing. `RecordingProgress` keeps
//! every emitted progress event.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::build::{BuildRecord, BuildState, QueueHandle};
use crate::client::CiClient;
use crate::error::{ClientError, ClientResult};
use crate::params::Parameters;
use crate::progress::{ProgressSink, TriggerEvent};

/// A recorded submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitCall {
    ByName { name: String, params: Parameters },
    AtPath { path: String, params: Parameters },
}

/// Scripted `CiClient` backed by in-memory queues.
#[derive(Debug)]
pub struct ScriptedClient {
    handle: QueueHandle,
    submit_error: Option<ClientError>,
    script: Mutex<VecDeque<ClientResult<BuildRecord>>>,
    submissions: Mutex<Vec<SubmitCall>>,
    polls: Mutex<Vec<QueueHandle>>,
}

impl ScriptedClient {
    /// Client whose submissions succeed with `handle`.
    pub fn new(handle: QueueHandle) -> Self {
        Self {
            handle,
            submit_error: None,
            script: Mutex::new(VecDeque::new()),
            submissions: Mutex::new(Vec::new()),
            polls: Mutex::new(Vec::new()),
        }
    }

    /// Make every submission fail with `error`.
    pub fn failing_submit(mut self, error: ClientError) -> Self {
        self.submit_error = Some(error);
        self
    }

    /// Append a scripted resolution result.
    pub fn then(self, response: ClientResult<BuildRecord>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Append a build in `state` with `number`.
    pub fn then_build(self, number: i64, state: BuildState) -> Self {
        self.then(Ok(BuildRecord::new(number, state)))
    }

    pub fn submissions(&self) -> Vec<SubmitCall> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    pub fn polled_handles(&self) -> Vec<QueueHandle> {
        self.polls.lock().unwrap().clone()
    }

    fn submit(&self, call: SubmitCall) -> ClientResult<QueueHandle> {
        self.submissions.lock().unwrap().push(call);
        match &self.submit_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.handle),
        }
    }
}

#[async_trait]
impl CiClient for ScriptedClient {
    async fn build_job(&self, name: &str, params: &Parameters) -> ClientResult<QueueHandle> {
        self.submit(SubmitCall::ByName {
            name: name.to_string(),
            params: params.clone(),
        })
    }

    async fn build_job_at_path(
        &self,
        path: &str,
        params: &Parameters,
    ) -> ClientResult<QueueHandle> {
        self.submit(SubmitCall::AtPath {
            path: path.to_string(),
            params: params.clone(),
        })
    }

    async fn build_from_queue(&self, handle: QueueHandle) -> ClientResult<BuildRecord> {
        self.polls.lock().unwrap().push(handle);
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            return script
                .pop_front()
                .unwrap_or(Err(ClientError::NotYetScheduled(handle.id())));
        }
        script
            .front()
            .cloned()
            .unwrap_or(Err(ClientError::NotYetScheduled(handle.id())))
    }
}

/// Progress sink that keeps every event in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<TriggerEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TriggerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of `Polling` events seen.
    pub fn poll_attempts(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, TriggerEvent::Polling { .. }))
            .count()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: &TriggerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

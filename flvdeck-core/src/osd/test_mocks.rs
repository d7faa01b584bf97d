//! Mock overlay service client for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{OsdClient, OsdError};

const MOCK_ENDPOINT: &str = "mock://overlay";

/// One request seen by the mock, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsdCall {
    SetOsd(String),
    Close,
}

#[derive(Debug, Clone, Copy)]
enum FailureMode {
    None,
    Unreachable,
    Rejecting(u16),
}

#[derive(Debug)]
struct MockState {
    calls: Vec<OsdCall>,
    failure: FailureMode,
}

/// Mock overlay client.
///
/// Clones share state, so tests can inspect calls after handing a clone to a
/// session controller and switch failure modes mid-test.
#[derive(Debug, Clone)]
pub struct MockOsdClient {
    state: Arc<Mutex<MockState>>,
    delays: Arc<HashMap<String, Duration>>,
}

impl MockOsdClient {
    /// Creates a client that acknowledges every request.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                failure: FailureMode::None,
            })),
            delays: Arc::new(HashMap::new()),
        }
    }

    /// Creates a client whose requests fail at the transport level.
    pub fn new_unreachable() -> Self {
        let client = Self::new();
        client.state.lock().failure = FailureMode::Unreachable;
        client
    }

    /// Delays the response to pushes of exactly `effective`.
    pub fn with_delay(mut self, effective: &str, delay: Duration) -> Self {
        Arc::make_mut(&mut self.delays).insert(effective.to_string(), delay);
        self
    }

    /// Makes every following request answer with `status`.
    pub fn set_rejecting(&self, status: u16) {
        self.state.lock().failure = FailureMode::Rejecting(status);
    }

    /// Makes every following request succeed again.
    pub fn set_accepting(&self) {
        self.state.lock().failure = FailureMode::None;
    }

    pub fn calls(&self) -> Vec<OsdCall> {
        self.state.lock().calls.clone()
    }

    /// Effective strings pushed so far, in issue order.
    pub fn pushed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                OsdCall::SetOsd(effective) => Some(effective),
                OsdCall::Close => None,
            })
            .collect()
    }

    pub fn close_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == OsdCall::Close)
            .count()
    }

    fn record(&self, call: OsdCall) -> Result<String, OsdError> {
        let mut state = self.state.lock();
        state.calls.push(call);

        match state.failure {
            FailureMode::None => Ok("ok".to_string()),
            FailureMode::Unreachable => Err(OsdError::RemoteUnreachable {
                endpoint: MOCK_ENDPOINT.to_string(),
                reason: "Mock connection refused".to_string(),
            }),
            FailureMode::Rejecting(status) => Err(OsdError::RemoteRejected {
                status,
                body: "Mock rejection".to_string(),
            }),
        }
    }
}

impl Default for MockOsdClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OsdClient for MockOsdClient {
    async fn set_osd(&self, effective: &str) -> Result<String, OsdError> {
        let result = self.record(OsdCall::SetOsd(effective.to_string()));

        if let Some(delay) = self.delays.get(effective) {
            tokio::time::sleep(*delay).await;
        }

        result
    }

    async fn close(&self) -> Result<String, OsdError> {
        self.record(OsdCall::Close)
    }
}

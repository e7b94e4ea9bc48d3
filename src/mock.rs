use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use crate::transport::{
    WebhookBytes, WebhookError, WebhookFuture, WebhookRequest, WebhookResponse, WebhookResult,
    WebhookTransport,
};

/// What the mock does with the next delivery attempt.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    Pass,
    Delay(Duration),
    ConnectError { reason: String, retryable: bool },
    SendError { reason: String, retryable: bool },
    ReceiveError { reason: String, retryable: bool },
    TimeoutError { reason: String, retryable: bool },
    InternalError { reason: String },
}

impl MockBehavior {
    pub fn pass() -> Self {
        Self::Pass
    }

    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn connect_error(reason: impl Into<String>, retryable: bool) -> Self {
        Self::ConnectError {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn send_error(reason: impl Into<String>, retryable: bool) -> Self {
        Self::SendError {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn receive_error(reason: impl Into<String>, retryable: bool) -> Self {
        Self::ReceiveError {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn timeout_error(reason: impl Into<String>, retryable: bool) -> Self {
        Self::TimeoutError {
            reason: reason.into(),
            retryable,
        }
    }

    pub fn internal_error(reason: impl Into<String>) -> Self {
        Self::InternalError {
            reason: reason.into(),
        }
    }
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self::Pass
    }
}

/// Ordered behaviors, one consumed per delivery; an exhausted plan passes.
#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    queue: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.queue.push_back(behavior);
        self
    }

    fn pop(&mut self) -> MockBehavior {
        self.queue.pop_front().unwrap_or_default()
    }

    fn remaining(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, WebhookBytes)>,
    pub body: WebhookBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<WebhookBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<WebhookBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> WebhookResult<Self> {
        let body = to_vec(payload).map_err(WebhookError::from)?;
        Ok(Self::new(status, body))
    }
}

#[derive(Clone, Debug)]
pub struct MockStateSnapshot {
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
    pub route_queue_len: usize,
    pub outbound_count: usize,
    pub inbound_count: usize,
    pub elapsed_total: Duration,
}

#[derive(Debug, Default)]
struct MockState {
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<WebhookRequest>,
    inbound_log: Vec<WebhookResponse>,
    elapsed_total: Duration,
}

impl MockState {
    fn snapshot(&self) -> MockStateSnapshot {
        MockStateSnapshot {
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            behavior_remaining: self.behavior_plan.remaining(),
            response_queue_len: self.default_response_queue.len(),
            route_queue_len: self.route_response_queues.values().map(VecDeque::len).sum(),
            outbound_count: self.outbound_log.len(),
            inbound_count: self.inbound_log.len(),
            elapsed_total: self.elapsed_total,
        }
    }
}

/// In-memory [`WebhookTransport`] driven by scripted behaviors and queued
/// responses, with a log of what the probe put on the wire.
#[derive(Clone, Debug)]
pub struct MockWebhookTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockWebhookTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let transport = Self::new();
        transport.lock().behavior_plan = behavior_plan;
        transport
    }

    pub fn push_behavior(&self, behavior: MockBehavior) {
        self.lock().behavior_plan.push(behavior);
    }

    pub fn snapshot(&self) -> MockStateSnapshot {
        self.lock().snapshot()
    }

    /// Next response for any request that no route queue claims first.
    pub fn queue_response(&self, response: MockResponse) {
        self.lock().default_response_queue.push_back(response);
    }

    pub fn queue_response_for(
        &self,
        method: Method,
        url: impl Into<String>,
        response: MockResponse,
    ) {
        self.lock()
            .route_response_queues
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    /// Every request the mock has seen, in order.
    pub fn outbound_log(&self) -> Vec<WebhookRequest> {
        self.lock().outbound_log.clone()
    }

    pub fn last_outbound(&self) -> Option<WebhookRequest> {
        self.lock().outbound_log.last().cloned()
    }

    pub fn outbound_count(&self) -> usize {
        self.lock().outbound_log.len()
    }

    pub fn inbound_count(&self) -> usize {
        self.lock().inbound_log.len()
    }

    pub fn clear_logs(&self) {
        let mut state = self.lock();
        state.outbound_log.clear();
        state.inbound_log.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state
            .lock()
            .expect("mock webhook transport mutex poisoned")
    }

    fn fail(&self, error: WebhookError) -> WebhookError {
        let mut state = self.lock();
        state.last_error = Some(error.message().to_string());
        state.last_status = error.status();
        error
    }

    fn next_response(&self, request: &WebhookRequest) -> Option<MockResponse> {
        let mut state = self.lock();
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(queue) = state.route_response_queues.get_mut(&route_key) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        state.default_response_queue.pop_front()
    }
}

impl Default for MockWebhookTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookTransport for MockWebhookTransport {
    fn execute(&self, request: WebhookRequest) -> WebhookFuture<WebhookResult<WebhookResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let behavior = {
                let mut state = transport.lock();
                state.request_count += 1;
                state.last_url = Some(request.url.clone());
                state.last_error = None;
                state.outbound_log.push(request.clone());
                state.behavior_plan.pop()
            };

            let start = Instant::now();
            match behavior {
                MockBehavior::Delay(duration) => tokio::time::sleep(duration).await,
                MockBehavior::Pass => {}
                MockBehavior::ConnectError { reason, retryable } => {
                    return Err(transport.fail(WebhookError::connect(reason, retryable)));
                }
                MockBehavior::SendError { reason, retryable } => {
                    return Err(transport.fail(WebhookError::send(reason, retryable)));
                }
                MockBehavior::ReceiveError { reason, retryable } => {
                    return Err(transport.fail(WebhookError::receive(reason, retryable)));
                }
                MockBehavior::TimeoutError { reason, retryable } => {
                    return Err(transport.fail(WebhookError::timeout(reason, retryable)));
                }
                MockBehavior::InternalError { reason } => {
                    return Err(transport.fail(WebhookError::internal(reason)));
                }
            }

            // Empty queues fall back to an empty 200 so straight-line tests
            // need no setup.
            let queued = transport.next_response(&request);
            let elapsed = start.elapsed();
            let response = match queued {
                Some(queued) => WebhookResponse {
                    status: queued.status,
                    headers: queued.headers,
                    body: queued.body,
                    elapsed,
                },
                None => WebhookResponse {
                    status: 200,
                    headers: Vec::new(),
                    body: Bytes::new(),
                    elapsed,
                },
            };

            let mut state = transport.lock();
            state.last_status = Some(response.status);
            state.elapsed_total += elapsed;
            state.inbound_log.push(response.clone());
            drop(state);

            Ok(response)
        })
    }
}

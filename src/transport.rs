use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client as HttpClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub type WebhookBytes = Bytes;
pub type WebhookFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type WebhookResult<T> = Result<T, WebhookError>;

/// Media type stamped on every JSON delivery.
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WebhookErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Parse,
    Internal,
}

/// Transport-level fault. HTTP statuses are never errors here; a response
/// that arrives, whatever its status, is reported through [`WebhookResponse`].
#[derive(Clone, Debug, Error)]
#[error("webhook {kind:?} error status={status:?} retryable={retryable} {message}")]
pub struct WebhookError {
    kind: WebhookErrorKind,
    status: Option<u16>,
    message: String,
    retryable: bool,
}

impl WebhookError {
    pub fn new(
        kind: WebhookErrorKind,
        status: Option<u16>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            retryable,
        }
    }

    pub fn connect(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(WebhookErrorKind::Connect, None, message, retryable)
    }

    pub fn send(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(WebhookErrorKind::Send, None, message, retryable)
    }

    pub fn receive(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(WebhookErrorKind::Receive, None, message, retryable)
    }

    pub fn timeout(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(WebhookErrorKind::Timeout, None, message, retryable)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(WebhookErrorKind::Internal, None, message, false)
    }

    fn from_reqwest(kind: WebhookErrorKind, err: reqwest::Error) -> Self {
        // reqwest folds the interesting distinctions into predicates; recover
        // the kinds callers branch on before falling back to the call site's.
        let kind = if err.is_timeout() {
            WebhookErrorKind::Timeout
        } else if err.is_connect() {
            WebhookErrorKind::Connect
        } else {
            kind
        };
        let status = err.status().map(|s| s.as_u16());
        let retryable = err.is_timeout() || err.is_connect() || err.is_request();
        Self {
            kind,
            status,
            message: err.to_string(),
            retryable,
        }
    }

    pub fn kind(&self) -> WebhookErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl From<sonic_rs::Error> for WebhookError {
    fn from(err: sonic_rs::Error) -> Self {
        Self::new(WebhookErrorKind::Parse, None, err.to_string(), false)
    }
}

#[derive(Clone, Debug)]
pub struct WebhookRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, WebhookBytes)>,
    pub body: Option<WebhookBytes>,
    pub timeout: Option<Duration>,
}

impl WebhookRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<WebhookBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<WebhookBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Opt-in deadline. Without it the delivery blocks until the transport
    /// resolves one way or the other.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Debug)]
pub struct WebhookResponse {
    pub status: u16,
    pub headers: Vec<(String, WebhookBytes)>,
    pub body: WebhookBytes,
    pub elapsed: Duration,
}

impl WebhookResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body decoded as text, invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> WebhookResult<T> {
        sonic_rs::from_slice(&self.body).map_err(WebhookError::from)
    }
}

/// Seam between the probe and the wire. Production uses [`ReqwestTransport`];
/// tests swap in the in-memory mock.
pub trait WebhookTransport: Send + Sync {
    fn execute(&self, request: WebhookRequest) -> WebhookFuture<WebhookResult<WebhookResponse>>;
}

pub type SharedWebhookTransport = dyn WebhookTransport + Send + Sync;

#[derive(Clone)]
pub struct Client {
    transport: Arc<SharedWebhookTransport>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: WebhookTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: WebhookRequest) -> WebhookResult<WebhookResponse> {
        self.transport.execute(request).await
    }

    /// Serialize `payload`, stamp `Content-Type: application/json`, and POST.
    pub async fn post_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        payload: &T,
    ) -> WebhookResult<WebhookResponse> {
        let body = sonic_rs::to_vec(payload)?;
        let request = WebhookRequest::post(url)
            .with_header(CONTENT_TYPE.as_str(), JSON_CONTENT_TYPE)
            .with_body(body);
        self.execute(request).await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: HttpClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: HttpClient::new(),
        }
    }

    pub fn with_client(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookTransport for ReqwestTransport {
    fn execute(&self, request: WebhookRequest) -> WebhookFuture<WebhookResult<WebhookResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            debug!(method = %request.method, url = %request.url, "dispatching webhook request");

            let mut req = client.request(request.method.clone(), &request.url);

            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| WebhookError::internal(err.to_string()))?;
                req = req.header(key, value);
            }

            if let Some(body) = request.body {
                req = req.body(body);
            }

            if let Some(timeout) = request.timeout {
                req = req.timeout(timeout);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| WebhookError::from_reqwest(WebhookErrorKind::Send, err))?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|err| WebhookError::from_reqwest(WebhookErrorKind::Receive, err))?;
            let elapsed = start.elapsed();
            debug!(status, elapsed_ms = elapsed.as_millis() as u64, "webhook response received");

            Ok(WebhookResponse {
                status,
                headers,
                body,
                elapsed,
            })
        })
    }
}

//! Webhook delivery probe: sends one JSON POST to a configured endpoint and
//! reports the status verdict plus the raw response body, with an in-memory
//! mock transport for fully deterministic tests.

pub mod config;
pub mod mock;
pub mod payload;
pub mod probe;
pub mod transport;

pub use reqwest::Method;

pub use config::{ConfigError, ENDPOINT_ENV_VAR, resolve_endpoint, resolve_endpoint_with};
pub use mock::{
    MockBehavior, MockBehaviorPlan, MockResponse, MockStateSnapshot, MockWebhookTransport,
};
pub use payload::{DEFAULT_MESSAGE, DEFAULT_SESSION_ID, WebhookPayload};
pub use probe::{DeliveryReport, deliver};
pub use transport::{
    Client, JSON_CONTENT_TYPE, ReqwestTransport, WebhookBytes, WebhookError, WebhookErrorKind,
    WebhookFuture, WebhookRequest, WebhookResponse, WebhookResult, WebhookTransport,
};

use serde::{Deserialize, Serialize};

/// Stock message sent when the caller does not override it.
pub const DEFAULT_MESSAGE: &str = "Hello World, Welcome to the World of Tomorrow";

/// Stock session identifier paired with [`DEFAULT_MESSAGE`].
pub const DEFAULT_SESSION_ID: &str = "123";

/// Body of a probe delivery. `sessionId` keeps its camelCase wire name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

impl WebhookPayload {
    pub fn new(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: session_id.into(),
        }
    }
}

impl Default for WebhookPayload {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE, DEFAULT_SESSION_ID)
    }
}

use tracing::info;

use crate::payload::WebhookPayload;
use crate::transport::{Client, WebhookResponse, WebhookResult};

/// Outcome of a delivery that reached the endpoint. Captures the two things
/// the probe prints: the status verdict and the raw body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReport {
    status: u16,
    body: String,
}

impl DeliveryReport {
    pub fn from_response(response: &WebhookResponse) -> Self {
        Self {
            status: response.status(),
            body: response.text(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Success means exactly 200. A 201 or 204 still takes the failure
    /// branch with its literal status code.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// First output line: the status verdict.
    pub fn verdict(&self) -> String {
        if self.is_success() {
            "Request successful!".to_string()
        } else {
            format!("Request failed with status code: {}", self.status)
        }
    }

    /// Raw response body text, printed verbatim on both branches.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The two lines the probe writes to stdout.
    pub fn lines(&self) -> [String; 2] {
        [self.verdict(), self.body.clone()]
    }
}

/// Deliver `payload` to `endpoint` as a single JSON POST and fold whatever
/// comes back into a report. Blocks until the endpoint answers or the
/// transport fails; transport faults surface as typed errors.
pub async fn deliver(
    client: &Client,
    endpoint: &str,
    payload: &WebhookPayload,
) -> WebhookResult<DeliveryReport> {
    let response = client.post_json(endpoint, payload).await?;
    let report = DeliveryReport::from_response(&response);
    info!(
        status = report.status(),
        success = report.is_success(),
        "webhook delivery completed"
    );
    Ok(report)
}

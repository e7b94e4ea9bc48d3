use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use bytes::Bytes;
use tokio::net::TcpListener;

use webhook_probe::{
    Client, WebhookErrorKind, WebhookPayload, WebhookRequest, deliver,
};

#[tokio::test]
async fn e2e_success_roundtrip_produces_the_two_report_lines() {
    let server = TestServer::start().await;
    let client = Client::new();

    let report = deliver(
        &client,
        &server.url("/hooks/echo"),
        &WebhookPayload::default(),
    )
    .await
    .expect("echo endpoint should answer");

    assert_eq!(
        report.lines(),
        ["Request successful!".to_string(), r#"{"echo":"ok"}"#.to_string()]
    );
}

#[tokio::test]
async fn e2e_server_error_reports_status_and_body() {
    let server = TestServer::start().await;
    let client = Client::new();

    let report = deliver(
        &client,
        &server.url("/hooks/broken"),
        &WebhookPayload::default(),
    )
    .await
    .expect("broken endpoint still answers");

    assert_eq!(
        report.lines(),
        [
            "Request failed with status code: 500".to_string(),
            "Internal Error".to_string()
        ]
    );
}

#[tokio::test]
async fn e2e_stock_payload_reaches_the_endpoint_verbatim() {
    let server = TestServer::start().await;
    let client = Client::new();

    let report = deliver(
        &client,
        &server.url("/hooks/reflect"),
        &WebhookPayload::default(),
    )
    .await
    .expect("reflect endpoint should answer");

    assert!(report.is_success());
    assert_eq!(
        report.body(),
        r#"{"message":"Hello World, Welcome to the World of Tomorrow","sessionId":"123"}"#
    );
}

#[tokio::test]
async fn e2e_unreachable_endpoint_is_a_typed_connect_error() {
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind throwaway listener");
        let addr = listener.local_addr().expect("local addr");
        format!("http://{}/hooks/echo", addr)
    };

    let client = Client::new();
    let err = deliver(&client, &url, &WebhookPayload::default())
        .await
        .expect_err("nothing is listening on the dropped port");

    assert_eq!(err.kind(), WebhookErrorKind::Connect);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn e2e_per_request_timeout_is_honored() {
    let server = TestServer::start().await;
    let client = Client::new();

    let request = WebhookRequest::post(server.url("/hooks/slow"))
        .with_body(Bytes::from_static(b"{}"))
        .with_timeout(Duration::from_millis(200));
    let err = client
        .execute(request)
        .await
        .expect_err("slow endpoint should trip the opt-in timeout");

    assert_eq!(err.kind(), WebhookErrorKind::Timeout);
}

struct TestServer {
    base_url: String,
    task: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn start() -> Self {
        let app = Router::new()
            .route("/hooks/echo", post(echo_handler))
            .route("/hooks/broken", post(broken_handler))
            .route("/hooks/reflect", post(reflect_handler))
            .route("/hooks/slow", post(slow_handler));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{}", addr);

        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });

        Self { base_url, task }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn echo_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, r#"{"echo":"ok"}"#)
}

async fn broken_handler() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
}

async fn reflect_handler(body: Bytes) -> (StatusCode, Bytes) {
    (StatusCode::OK, body)
}

async fn slow_handler() -> (StatusCode, &'static str) {
    tokio::time::sleep(Duration::from_secs(2)).await;
    (StatusCode::OK, r#"{"echo":"late"}"#)
}

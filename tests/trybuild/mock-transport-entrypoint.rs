use webhook_probe::{Client, MockResponse, MockWebhookTransport};

fn main() {
    let transport = MockWebhookTransport::new();
    transport.queue_post_response("https://hooks.example.com/echo", MockResponse::text(200, "ok"));
    let _client = Client::with_transport(transport);
}

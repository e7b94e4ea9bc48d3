use webhook_probe::{Client, WebhookPayload};

fn main() {
    let client = Client::new();
    let payload = WebhookPayload::default();
    let _pending = client.post_json("https://hooks.example.com/v1/data", &payload);
}

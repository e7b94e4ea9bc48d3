use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use webhook_probe::payload::{DEFAULT_MESSAGE, DEFAULT_SESSION_ID};
use webhook_probe::{Client, WebhookPayload, config, probe};

/// Send one JSON POST to a webhook endpoint and report the outcome.
#[derive(Debug, Parser)]
#[command(name = "webhook-probe", version, about)]
struct Cli {
    /// Webhook endpoint URL; falls back to the WEBHOOK_URL environment variable
    url: Option<String>,

    /// message field of the JSON payload
    #[arg(long, default_value = DEFAULT_MESSAGE)]
    message: String,

    /// sessionId field of the JSON payload
    #[arg(long, default_value = DEFAULT_SESSION_ID)]
    session_id: String,
}

/// Events go to stderr; stdout carries only the two report lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let endpoint = match config::resolve_endpoint(cli.url) {
        Ok(endpoint) => endpoint,
        Err(err) => {
            eprintln!("webhook-probe: {err}");
            return ExitCode::FAILURE;
        }
    };

    let payload = WebhookPayload::new(cli.message, cli.session_id);
    let client = Client::new();

    match probe::deliver(&client, &endpoint, &payload).await {
        Ok(report) => {
            for line in report.lines() {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("webhook-probe: {err}");
            ExitCode::FAILURE
        }
    }
}

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Method;
use tokio_util::sync::CancellationToken;

use mwlocal_client::config::Config;
use mwlocal_client::dispatch::async_poll::TaskPoller;
use mwlocal_client::endpoints::sanitize_part_of_uri;
use mwlocal_client::error::ClientError;
use mwlocal_client::forms::try_parse_google_sheets_url;
use mwlocal_client::response::StatusMessage;

#[derive(Parser)]
#[command(name = "mwlocal-client", about = "Talk to the local media backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send one request and print the JSON response.
    Call {
        endpoint: String,
        #[arg(long, default_value = "GET")]
        method: String,
        /// JSON request body.
        #[arg(long)]
        body: Option<String>,
    },
    /// Poll a correction task until it completes or fails.
    Poll {
        task_id: String,
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Percent-encode a path for use as an endpoint segment.
    Sanitize { path: String },
    /// Extract the spreadsheet ID from a Google Sheets URL.
    SheetId { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load();

    let outcome = match cli.command {
        Command::Call {
            endpoint,
            method,
            body,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let body = body
                .map(|b| serde_json::from_str::<serde_json::Value>(&b))
                .transpose()?;
            config
                .client()
                .call(&endpoint, method, body.as_ref())
                .await
                .map(|v| v.to_string())
        }
        Command::Poll {
            task_id,
            interval_ms,
        } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.poll_interval());
            poll(&config, &task_id, interval).await
        }
        Command::Sanitize { path } => Ok(sanitize_part_of_uri(&path)),
        Command::SheetId { url } => try_parse_google_sheets_url(&url),
    };

    match outcome {
        Ok(out) => {
            println!("{out}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!(kind = e.kind(), "command failed");
            println!("{}", serde_json::to_string(&StatusMessage::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn poll(config: &Config, task_id: &str, interval: Duration) -> Result<String, ClientError> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, stopping poll");
            on_signal.cancel();
        }
    });

    let poller = TaskPoller::new(config.client()).with_interval(interval);
    let result = poller
        .poll_with_cancel(
            task_id,
            |status, _| tracing::info!(task_id = task_id, status = status, "task update"),
            &cancel,
        )
        .await;
    result.map(|data| data.to_string())
}

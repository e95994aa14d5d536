use anyhow::Result;
use clap::Parser;
use locals_cue::cli::{run, Cli};
use tracing::instrument::WithSubscriber;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `--stdout` output stays clean. The subscriber is handed to the
    // run explicitly rather than installed as the process-wide default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = tracing::Dispatch::new(subscriber);

    let cli = Cli::parse();
    let result = run(cli).with_subscriber(dispatch.clone()).await;

    tracing::dispatcher::with_default(&dispatch, || match &result {
        Ok(report) => tracing::info!(bytes = report.bytes_written, "CLI completed successfully"),
        Err(e) => tracing::error!(error = %format!("{e:#}"), "CLI exited with error"),
    });
    result.map(|_| ())
}

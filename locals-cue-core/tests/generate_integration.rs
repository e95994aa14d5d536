use std::fs;
use std::sync::{Arc, Mutex};

use locals_cue_core::config::{GenerateConfig, OutputConfig, WriteMode};
use locals_cue_core::contract::{FetchError, MockFetcher};
use locals_cue_core::emit::EmitTarget;
use locals_cue_core::generate::{generate, GenerateError};
use tempfile::tempdir;
use tracing::field::{Field, Visit};
use tracing::instrument::WithSubscriber;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

mod common;
use common::{FailingImporter, RenderingImporter, SAMPLE_MAIN_TF};

fn config_in(dir: &std::path::Path) -> GenerateConfig {
    GenerateConfig {
        output: OutputConfig {
            path: dir.join("static.cue"),
            mode: WriteMode::Atomic,
            ..OutputConfig::default()
        },
        ..GenerateConfig::default()
    }
}

fn fetcher_returning(body: &'static str) -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_origin()
        .returning(|| "https://example.test/main.tf".to_string());
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move || Ok(body.as_bytes().to_vec()));
    fetcher
}

#[tokio::test]
async fn generate_writes_static_package_from_fetched_source() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let fetcher = fetcher_returning(SAMPLE_MAIN_TF);
    let importer = RenderingImporter::default();

    let report = generate(&config, &fetcher, &importer)
        .await
        .expect("generation should succeed");

    assert_eq!(report.source, "https://example.test/main.tf");
    assert_eq!(report.bytes_fetched, SAMPLE_MAIN_TF.len());
    assert_eq!(
        (report.to_display_name, report.to_fixed, report.to_short),
        (2, 2, 2)
    );
    assert_eq!(report.target, EmitTarget::File(config.output.path.clone()));
    assert_eq!(report.output_path(), Some(&config.output.path));

    let written = fs::read_to_string(&config.output.path).unwrap();
    assert!(written.starts_with("// Copyright 2020-2024 [name of copyright owner]"));
    assert!(written.contains("package static"));
    assert!(written.contains("\"eu-west-1\": \"Europe (Ireland)\""));
}

#[tokio::test]
async fn fetch_failure_stops_before_any_output() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());

    let mut fetcher = MockFetcher::new();
    fetcher.expect_origin().returning(|| "https://example.test".into());
    fetcher.expect_fetch().returning(|| {
        Err(FetchError::Status {
            url: "https://example.test".into(),
            status: reqwest::StatusCode::NOT_FOUND,
        })
    });

    let err = generate(&config, &fetcher, &RenderingImporter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::Fetch(_)), "got {err:?}");
    assert!(err.to_string().contains("404"));
    assert!(!config.output.path.exists());
}

#[tokio::test]
async fn parse_failure_stops_before_import() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let fetcher = fetcher_returning("locals {\n  to_fixed = {\n");
    let importer = RenderingImporter::default();

    let err = generate(&config, &fetcher, &importer).await.unwrap_err();

    assert!(matches!(err, GenerateError::Extract(_)), "got {err:?}");
    assert!(
        err.to_string().starts_with("failed to parse HCL in config.hcl: "),
        "got {err}"
    );
    assert_eq!(err.to_string().matches("failed to parse").count(), 1);
    assert!(importer.received.lock().unwrap().is_none(), "importer never ran");
    assert!(!config.output.path.exists());
}

#[tokio::test]
async fn import_failure_is_wrapped_as_emit_error() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let fetcher = fetcher_returning(SAMPLE_MAIN_TF);

    let err = generate(&config, &fetcher, &FailingImporter)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::Emit(_)), "got {err:?}");
    assert!(err.to_string().contains("command failed"));
    assert!(!config.output.path.exists());
}

/// Collects the `message` field of every event it sees.
struct MessageCollector {
    messages: Arc<Mutex<Vec<String>>>,
}

struct MessageVisitor<'a>(&'a mut Option<String>);

impl Visit for MessageVisitor<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for MessageCollector {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = None;
        event.record(&mut MessageVisitor(&mut message));
        if let Some(message) = message {
            self.messages.lock().unwrap().push(message);
        }
    }
}

#[tokio::test]
async fn passed_subscriber_receives_events_from_the_producer_task() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let fetcher = fetcher_returning(SAMPLE_MAIN_TF);
    let importer = RenderingImporter::default();

    let messages = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(MessageCollector {
        messages: messages.clone(),
    });
    let dispatch = tracing::Dispatch::new(subscriber);

    generate(&config, &fetcher, &importer)
        .with_subscriber(dispatch)
        .await
        .expect("generation should succeed");

    let messages = messages.lock().unwrap();
    for expected in [
        "[GENERATE] Starting generation pipeline",
        "Starting encode",
        "Executing import",
        "[GENERATE] Generation complete",
    ] {
        assert!(
            messages.iter().any(|m| m == expected),
            "expected {expected:?} in {messages:?}"
        );
    }
}

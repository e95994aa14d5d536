//! High-level pipeline: fetch → parse → extract → (encode ∥ import) → finalize.
//!
//! Fail-fast: the first failing stage ends the run and its error is returned wrapped in
//! [`GenerateError`]. Nothing is retried and nothing persists besides the output file.

use std::path::PathBuf;

use tracing::{error, info};

use crate::config::GenerateConfig;
use crate::contract::{FetchError, Fetcher, SchemaImporter};
use crate::emit::{emit, EmitError, EmitTarget};
use crate::extract::{parse_locals, ExtractError};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    pub source: String,
    pub bytes_fetched: usize,
    pub to_display_name: usize,
    pub to_fixed: usize,
    pub to_short: usize,
    pub target: EmitTarget,
    pub bytes_written: u64,
}

impl GenerateReport {
    pub fn output_path(&self) -> Option<&PathBuf> {
        match &self.target {
            EmitTarget::File(path) => Some(path),
            EmitTarget::Stdout => None,
        }
    }
}

pub async fn generate<F, I>(
    config: &GenerateConfig,
    fetcher: &F,
    importer: &I,
) -> Result<GenerateReport, GenerateError>
where
    F: Fetcher + ?Sized,
    I: SchemaImporter + ?Sized,
{
    let source = fetcher.origin();
    info!(source = %source, "[GENERATE] Starting generation pipeline");

    // Step 1: Fetch
    let body = fetcher.fetch().await.map_err(|e| {
        error!(error = %e, "[GENERATE][ERROR] Fetch failed");
        e
    })?;
    info!(bytes = body.len(), "[GENERATE] Fetch succeeded");

    // Step 2: Parse and extract
    let locals = parse_locals(&body, &config.source.name).map_err(|e| {
        error!(error = %e, "[GENERATE][ERROR] Extraction failed");
        e
    })?;

    // Step 3: Encode and import
    let emitted = emit(&locals, importer, &config.output).await.map_err(|e| {
        error!(error = %e, "[GENERATE][ERROR] Emit failed");
        e
    })?;

    let report = GenerateReport {
        source,
        bytes_fetched: body.len(),
        to_display_name: locals.to_display_name.len(),
        to_fixed: locals.to_fixed.len(),
        to_short: locals.to_short.len(),
        target: emitted.target,
        bytes_written: emitted.bytes_written,
    };
    info!(?report, "[GENERATE] Generation complete");
    Ok(report)
}

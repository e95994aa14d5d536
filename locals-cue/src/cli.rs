//! CLI glue for locals-cue: argument parsing, config resolution and the async `run`
//! entrypoint. All pipeline logic lives in `locals-cue-core`.

use crate::load_config::load_config;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use locals_cue_core::config::{GenerateConfig, WriteMode};
use locals_cue_core::fetch::HttpFetcher;
use locals_cue_core::generate::{generate, GenerateReport};
use locals_cue_core::import::CueImporter;
use std::path::PathBuf;

/// CLI for locals-cue: regenerate a CUE package from terraform-aws-utils locals.
#[derive(Parser, Debug)]
#[clap(
    name = "locals-cue",
    version,
    about = "Extract the region maps from terraform-aws-utils and import them as a CUE package"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the upstream Terraform source and regenerate the CUE file
    Update(UpdateArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub struct UpdateArgs {
    /// Path to an optional YAML config file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Override the Terraform source URL
    #[clap(long)]
    pub url: Option<String>,

    /// Override the output file path
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Override the CUE package name
    #[clap(long)]
    pub package: Option<String>,

    /// Overwrite the output path directly instead of renaming a temp file into place
    #[clap(long)]
    pub force: bool,

    /// Write the generated file to standard output
    #[clap(long, conflicts_with = "force")]
    pub stdout: bool,

    /// Path to the `cue` binary
    #[clap(long)]
    pub cue_bin: Option<PathBuf>,
}

impl UpdateArgs {
    /// Loads the config file, if any, and applies the command-line overrides on top.
    pub fn resolve(&self) -> Result<GenerateConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GenerateConfig::default(),
        };

        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(package) = &self.package {
            config.output.package = package.clone();
        }
        if self.force {
            config.output.mode = WriteMode::Overwrite;
        }
        if self.stdout {
            config.output.mode = WriteMode::Stdout;
        }
        if let Some(cue_bin) = &self.cue_bin {
            config.import.cue_bin = cue_bin.clone();
        }
        Ok(config)
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<GenerateReport> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Update(args) => {
            let config = args.resolve()?;
            config.trace_loaded();
            tracing::info!(command = "update", "Starting generation");

            let fetcher = HttpFetcher::from_config(&config.source);
            let importer = CueImporter::new(config.import.clone());
            let report = generate(&config, &fetcher, &importer)
                .await
                .with_context(|| format!("update from {} failed", config.source.url))?;

            tracing::info!(command = "update", ?report, "Generation complete");
            Ok(report)
        }
    }
}

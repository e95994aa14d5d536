//! # config: settings for one generation run
//!
//! Every field defaults to the values that regenerate `static.cue` from the upstream
//! terraform-aws-utils `main.tf`, so an empty config file is a valid one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Upstream Terraform file the locals are read from.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/cloudposse/terraform-aws-utils/refs/heads/main/main.tf";

/// Nominal filename handed to the HCL parser for diagnostics.
pub const DEFAULT_SOURCE_NAME: &str = "config.hcl";

pub const DEFAULT_OUTPUT_PATH: &str = "static.cue";
pub const DEFAULT_PACKAGE: &str = "static";
pub const DEFAULT_REGENERATE_COMMAND: &str = "`locals-cue update`";
pub const DEFAULT_CUE_BIN: &str = "cue";

/// Everything a single generation run needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub import: ImportConfig,
}

impl GenerateConfig {
    pub fn trace_loaded(&self) {
        info!(
            url = %self.source.url,
            output = %self.output.path.display(),
            package = %self.output.package,
            mode = ?self.output.mode,
            "Loaded GenerateConfig"
        );
        debug!(?self, "GenerateConfig loaded (full debug)");
    }
}

/// Where the Terraform source comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub url: String,
    pub name: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }
}

/// Where and how the generated CUE file is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub package: String,
    pub mode: WriteMode,
    /// Command named in the license header as the way to regenerate the file.
    pub command: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            package: DEFAULT_PACKAGE.to_string(),
            mode: WriteMode::default(),
            command: DEFAULT_REGENERATE_COMMAND.to_string(),
        }
    }
}

/// How the output target is opened and finalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Write to a temp file next to the destination, then rename it into place.
    #[default]
    Atomic,
    /// Truncate and write the destination directly.
    Overwrite,
    /// Write to standard output; `path` is ignored.
    Stdout,
}

/// How the `cue` binary is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    pub cue_bin: PathBuf,
    pub verbose: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            cue_bin: PathBuf::from(DEFAULT_CUE_BIN),
            verbose: true,
        }
    }
}

//! `load_config`: reads an optional YAML file into a [`GenerateConfig`].
//!
//! Every key is optional; missing keys keep the defaults that reproduce the stock
//! `static.cue` generation. Unknown keys are rejected so typos do not silently fall
//! back to defaults.
//!
//! ```yaml
//! source:
//!   url: https://raw.githubusercontent.com/cloudposse/terraform-aws-utils/refs/heads/main/main.tf
//! output:
//!   path: config/static.cue
//!   package: config
//!   mode: overwrite
//! import:
//!   cue_bin: /usr/local/bin/cue
//! ```

use anyhow::Result;
use locals_cue_core::config::GenerateConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GenerateConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(GenerateConfig::default());
    }

    match serde_yaml::from_str::<GenerateConfig>(&config_content) {
        Ok(config) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(config)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

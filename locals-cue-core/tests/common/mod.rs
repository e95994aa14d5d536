#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use locals_cue_core::contract::{ImportError, ImportRequest, SchemaImporter};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const SAMPLE_MAIN_TF: &str = r#"
variable "enabled" {
  type    = bool
  default = true
}

locals {
  enabled = var.enabled

  to_display_name = {
    "us-east-1" = "US East (N. Virginia)"
    "eu-west-1" = "Europe (Ireland)"
  }

  to_fixed = {
    "us-east-1" = "use1"
    "eu-west-1" = "euw1"
  }

  to_short = {
    "us-east-1" = "ue1"
    "eu-west-1" = "ew1"
  }

  identity = { for k, v in local.to_fixed : k => k }
}
"#;

/// Renders the JSON it receives as a flat CUE-like file, the way `cue import` would.
#[derive(Default, Clone)]
pub struct RenderingImporter {
    pub received: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl SchemaImporter for RenderingImporter {
    async fn import(
        &self,
        request: &ImportRequest,
        mut input: Box<dyn AsyncRead + Send + Unpin>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ImportError> {
        let mut json = String::new();
        input.read_to_string(&mut json).await?;
        let doc: serde_json::Value = serde_json::from_str(&json)
            .map_err(|e| ImportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        let mut rendered = format!("package {}\n", request.package);
        if let Some(fields) = doc.as_object() {
            for (name, map) in fields {
                rendered.push_str(&format!("\n{name}: {{\n"));
                if let Some(entries) = map.as_object() {
                    for (k, v) in entries {
                        rendered.push_str(&format!("\t\"{k}\": {v}\n"));
                    }
                }
                rendered.push_str("}\n");
            }
        }

        *self.received.lock().unwrap() = Some(json);
        output.write_all(rendered.as_bytes()).await?;
        Ok(rendered.len() as u64)
    }
}

/// Fails without reading its input, like a missing or broken `cue` binary.
pub struct FailingImporter;

#[async_trait]
impl SchemaImporter for FailingImporter {
    async fn import(
        &self,
        _request: &ImportRequest,
        _input: Box<dyn AsyncRead + Send + Unpin>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ImportError> {
        output.write_all(b"partial").await?;
        Err(ImportError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "cue: cannot import",
        )))
    }
}

/// Drops its input unread and reports success, like an importer that exits early with 0.
pub struct AbandoningImporter;

#[async_trait]
impl SchemaImporter for AbandoningImporter {
    async fn import(
        &self,
        request: &ImportRequest,
        input: Box<dyn AsyncRead + Send + Unpin>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ImportError> {
        drop(input);
        tokio::task::yield_now().await;
        let rendered = format!("package {}\n", request.package);
        output.write_all(rendered.as_bytes()).await?;
        Ok(rendered.len() as u64)
    }
}

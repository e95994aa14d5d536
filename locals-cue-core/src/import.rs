//! # import: `cue import` as a child process
//!
//! [`CueImporter`] is the production [`SchemaImporter`]. JSON read from the pipe is copied
//! into the child's stdin while its stdout is copied into the output target. A non-zero
//! exit status is an error even when all bytes were transferred.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::ImportConfig;
use crate::contract::{ImportError, ImportRequest, SchemaImporter};

/// Runs `cue import` as a child process, reading JSON on stdin and writing CUE on stdout.
pub struct CueImporter {
    config: ImportConfig,
}

impl CueImporter {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the `cue` binary for `request`.
    pub fn args(&self, request: &ImportRequest) -> Vec<String> {
        let mut args = Vec::with_capacity(8);
        if self.config.verbose {
            args.push("--verbose".to_string());
        }
        args.extend(
            [
                "import",
                "--package",
                request.package.as_str(),
                "--outfile",
                "-",
                "json:",
                "-",
            ]
            .map(String::from),
        );
        args
    }
}

#[async_trait]
impl SchemaImporter for CueImporter {
    async fn import(
        &self,
        request: &ImportRequest,
        mut input: Box<dyn AsyncRead + Send + Unpin>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ImportError> {
        let program = self.config.cue_bin.display().to_string();
        let args = self.args(request);
        info!(program = %program, ?args, "Executing import command");

        let mut child = Command::new(&self.config.cue_bin)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(error = ?e, program = %program, "Failed to launch import command");
                ImportError::Spawn {
                    program: program.clone(),
                    source: e,
                }
            })?;

        let (Some(mut stdin), Some(mut stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(ImportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "import command started without piped stdio",
            )));
        };

        // Both directions at once, so a large output cannot stall a child still reading.
        let feed = async move {
            let copied = tokio::io::copy(&mut input, &mut stdin).await;
            if let Err(e) = stdin.shutdown().await {
                debug!(error = ?e, "Failed to close import command stdin");
            }
            copied
        };
        let drain = tokio::io::copy(&mut stdout, output);
        let (fed, drained) = tokio::join!(feed, drain);

        let status = child.wait().await?;
        if !status.success() {
            error!(
                program = %program,
                status = %status,
                "Import command exited with non-zero code"
            );
            return Err(ImportError::Exit { status });
        }

        let fed = fed.map_err(|e| {
            error!(error = ?e, "Failed to feed import command");
            ImportError::Io(e)
        })?;
        let written = drained.map_err(|e| {
            error!(error = ?e, "Failed to read import command output");
            ImportError::Io(e)
        })?;

        info!(program = %program, fed, written, status = %status, "Import command executed");
        Ok(written)
    }
}

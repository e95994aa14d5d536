//! # emit: stream the extracted locals through the schema importer into the output file
//!
//! The JSON document never exists as a file. A producer task encodes [`LocalVars`] into
//! one end of a bounded in-process pipe while the [`SchemaImporter`] reads the other end
//! and writes the package source into the output target:
//!
//! ```text
//!   producer task ──JSON──▶ duplex pipe ──▶ importer ──CUE──▶ target
//!        │                                                      ▲
//!        └──── oneshot: encode outcome ──▶ emit() ── header ────┘
//! ```
//!
//! The producer closes its end when it finishes, successfully or not; that close is the
//! only end-of-data signal the importer sees. The encode outcome travels on a one-slot
//! channel and is checked after the import returns, before the output is finalized.
//!
//! # Targets
//! - [`WriteMode::Atomic`]: a temp file in the destination directory, renamed into place
//!   only after everything succeeded. A failed run leaves the destination untouched.
//! - [`WriteMode::Overwrite`]: the destination is truncated and written directly.
//! - [`WriteMode::Stdout`]: standard output.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::sync::oneshot;
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Instrument};

use crate::config::{OutputConfig, WriteMode};
use crate::contract::{ImportError, ImportRequest, SchemaImporter};
use crate::extract::LocalVars;

/// Buffer between the JSON producer and the importer.
pub const PIPE_CAPACITY: usize = 64 * 1024;

const LICENSE_NOTICE: &str = "\
// Copyright 2020-2024 [name of copyright owner]
// Derived from terraform-aws-utils (https://github.com/cloudposse/terraform-aws-utils)
// Original work Copyright 2020-2024 Cloud Posse, LLC
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an \"AS IS\" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// This file is generated automatically.
// To update, run ";

/// The notice every generated file starts with, naming `command` as the way to regenerate it.
pub fn license_header(command: &str) -> String {
    format!("{LICENSE_NOTICE}{command}\n")
}

/// Where the generated source ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitTarget {
    File(PathBuf),
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub target: EmitTarget,
    pub package: String,
    /// Header plus importer output.
    pub bytes_written: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("failed to prepare output {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write generated output: {0}")]
    Write(#[source] io::Error),
    #[error("JSON encoding failed: {0}")]
    Encode(#[source] io::Error),
    #[error("command failed: {0}")]
    Import(#[from] ImportError),
    #[error("JSON producer stopped without reporting a result")]
    ProducerLost,
}

/// Writes the license header and the imported form of `locals` to the configured target.
pub async fn emit<I>(
    locals: &LocalVars,
    importer: &I,
    output: &OutputConfig,
) -> Result<EmitReport, EmitError>
where
    I: SchemaImporter + ?Sized,
{
    let header = license_header(&output.command);
    let request = ImportRequest {
        package: output.package.clone(),
    };
    info!(mode = ?output.mode, package = %output.package, "Emitting generated source");

    let (target, bytes_written) = match output.mode {
        WriteMode::Stdout => {
            let mut stdout = tokio::io::stdout();
            let written =
                write_generated(locals, importer, &request, &header, &mut stdout).await?;
            (EmitTarget::Stdout, written)
        }
        WriteMode::Overwrite => {
            let mut file = tokio::fs::File::create(&output.path)
                .await
                .map_err(|e| output_error(&output.path, e))?;
            let written =
                write_generated(locals, importer, &request, &header, &mut file).await?;
            (EmitTarget::File(output.path.clone()), written)
        }
        WriteMode::Atomic => {
            let written =
                write_atomically(locals, importer, &request, &header, &output.path).await?;
            (EmitTarget::File(output.path.clone()), written)
        }
    };

    info!(output = ?target, bytes = bytes_written, "Generated source written");
    Ok(EmitReport {
        target,
        package: request.package,
        bytes_written,
    })
}

async fn write_atomically<I>(
    locals: &LocalVars,
    importer: &I,
    request: &ImportRequest,
    header: &str,
    path: &Path,
) -> Result<u64, EmitError>
where
    I: SchemaImporter + ?Sized,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    let temp = tempfile::Builder::new()
        .prefix(&prefix)
        .tempfile_in(dir)
        .map_err(|e| output_error(path, e))?;
    debug!(temp = %temp.path().display(), "Created temporary output file");

    let handle = temp.as_file().try_clone().map_err(|e| output_error(path, e))?;
    let mut file = tokio::fs::File::from_std(handle);
    // The temp file is removed on drop if anything below fails.
    let written = write_generated(locals, importer, request, header, &mut file).await?;
    file.sync_all().await.map_err(EmitError::Write)?;
    drop(file);

    temp.persist(path).map_err(|e| {
        error!(error = ?e.error, path = %path.display(), "Failed to replace output file");
        output_error(path, e.error)
    })?;
    debug!(path = %path.display(), "Atomically replaced output file");
    Ok(written)
}

/// Header, then the importer fed by the producer task. Returns bytes written to `out`.
async fn write_generated<I>(
    locals: &LocalVars,
    importer: &I,
    request: &ImportRequest,
    header: &str,
    out: &mut (dyn AsyncWrite + Send + Unpin),
) -> Result<u64, EmitError>
where
    I: SchemaImporter + ?Sized,
{
    out.write_all(header.as_bytes())
        .await
        .map_err(EmitError::Write)?;

    let (writer, reader) = tokio::io::duplex(PIPE_CAPACITY);
    let (done_tx, done_rx) = oneshot::channel();
    let payload = locals.clone();
    tokio::spawn(
        async move {
            let outcome = encode_into(writer, &payload).await;
            let _ = done_tx.send(outcome);
        }
        .in_current_span()
        .with_current_subscriber(),
    );

    info!(package = %request.package, "Executing import");
    let imported = importer
        .import(request, Box::new(reader), &mut *out)
        .await
        .map_err(|e| {
            error!(error = %e, "Import failed");
            EmitError::Import(e)
        })?;
    info!(bytes = imported, "Import executed");

    match done_rx.await {
        Ok(Ok(encoded)) => debug!(bytes = encoded, "JSON producer finished"),
        Ok(Err(e)) => {
            error!(error = %e, "JSON encoding failed");
            return Err(EmitError::Encode(e));
        }
        Err(_) => {
            error!("JSON producer dropped its completion channel");
            return Err(EmitError::ProducerLost);
        }
    }

    out.flush().await.map_err(EmitError::Write)?;
    Ok(header.len() as u64 + imported)
}

/// Encodes `locals` as one JSON document followed by a newline, then closes the pipe.
///
/// The write half is dropped on every path, so the reader always sees end-of-stream.
async fn encode_into(mut writer: DuplexStream, locals: &LocalVars) -> io::Result<usize> {
    info!("Starting encode");
    let mut encoded = serde_json::to_vec(locals).map_err(io::Error::from)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.shutdown().await?;
    Ok(encoded.len())
}

fn output_error(path: &Path, source: io::Error) -> EmitError {
    error!(error = ?source, path = %path.display(), "Failed to prepare output");
    EmitError::Output {
        path: path.to_path_buf(),
        source,
    }
}

//! # contract: the seams of the generation pipeline
//!
//! Two traits separate the pure extraction logic from the outside world:
//! - [`Fetcher`] retrieves the raw Terraform source.
//! - [`SchemaImporter`] turns a JSON byte stream into a package-declared schema file.
//!
//! Real implementations live in [`crate::fetch`] and [`crate::import`]. Tests plug in
//! `MockFetcher` (generated by `mockall`) or small in-process importers.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Errors raised while retrieving the source document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to fetch {url}: {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Errors raised by a [`SchemaImporter`].
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to start importer {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("importer exited with {status}")]
    Exit { status: std::process::ExitStatus },
    #[error("importer i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieves the raw bytes of the source document.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// URL or other human-readable origin, for logs and reports.
    fn origin(&self) -> String;

    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Parameters of one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// Package name declared at the top of the generated file.
    pub package: String,
}

/// Converts a JSON document read from `input` into a schema source written to `output`.
///
/// `input` reaches end-of-stream only once the producer has written the whole document and
/// closed its end. Implementations return the number of bytes written to `output`.
#[async_trait]
pub trait SchemaImporter: Send + Sync {
    async fn import(
        &self,
        request: &ImportRequest,
        input: Box<dyn AsyncRead + Send + Unpin>,
        output: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ImportError>;
}

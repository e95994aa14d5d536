//! # fetch: retrieve the upstream Terraform source over HTTP
//!
//! [`HttpFetcher`] is the production [`Fetcher`]. Redirects are followed by the client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use crate::config::SourceConfig;
use crate::contract::{FetchError, Fetcher};

/// Fetches a single document with a plain HTTP GET.
///
/// No retries, no caching headers, no timeout beyond the client defaults. Any status of
/// 400 or above is an error.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.url.clone())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn origin(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        info!(url = %self.url, "Fetching source document");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            error!(error = ?e, url = %self.url, "Failed to send request");
            FetchError::Transport {
                url: self.url.clone(),
                source: e,
            }
        })?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            error!(status = %status, url = %self.url, "Source request returned error status");
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, url = %self.url, "Failed to read response body");
            FetchError::Transport {
                url: self.url.clone(),
                source: e,
            }
        })?;

        info!(url = %self.url, status = %status, bytes = body.len(), "Fetched source document");
        Ok(body.to_vec())
    }
}

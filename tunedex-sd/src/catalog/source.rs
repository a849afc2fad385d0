//! Data source capability for catalog fetches
//!
//! The chunk loader never knows whether bytes come from a CDN or a local
//! folder; it talks to [`DataSource`] and the concrete transport is
//! selected from configuration once, at process start.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use tunedex_common::config::DataLocation;

const USER_AGENT: &str = concat!("tunedex/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Data source errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unexpected status {status} for '{path}'")]
    Status { status: u16, path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One retrieval capability: fetch the raw bytes behind a data path
///
/// Paths are relative, forward-slash separated, and shared between
/// transports (`artists-chunks/index.json` means the same thing on disk
/// and over HTTP).
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the bytes at `path`, or an error describing why not
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    /// Human-readable description for startup logging
    fn describe(&self) -> String;
}

/// Fetches catalog data over HTTP from a base URL
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(url = %url, "fetching catalog data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("remote ({})", self.base_url)
    }
}

/// Reads catalog data from a local folder
pub struct FileDataSource {
    root: PathBuf,
}

impl FileDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.root.join(path);
        debug!(path = %full.display(), "reading catalog data");
        Ok(tokio::fs::read(&full).await?)
    }

    fn describe(&self) -> String {
        format!("local ({})", self.root.display())
    }
}

/// Build the data source the configuration selected
pub fn select_source(location: &DataLocation) -> Result<Arc<dyn DataSource>, FetchError> {
    match location {
        DataLocation::Remote { base_url } => Ok(Arc::new(HttpDataSource::new(base_url)?)),
        DataLocation::Local { root } => Ok(Arc::new(FileDataSource::new(root))),
    }
}

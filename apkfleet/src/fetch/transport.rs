//! HTTP transport abstraction for probes and artifact transfers.
//!
//! The [`ArtifactTransport`] trait is the only place the library touches the
//! network. It allows dependency injection and easier testing by enabling
//! mock transports in tests; production code uses [`HttpTransport`] backed by
//! `reqwest`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::BoxFuture;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Progress callback for artifact transfers.
/// Arguments: (bytes_downloaded, total_bytes); total is 0 when unknown.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Errors raised by the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to construct the HTTP client.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// Request failed before or during transfer.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// Request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Failed to write the transfer to disk.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Network operations needed by the pipeline.
///
/// Dyn-compatible: async methods return [`BoxFuture`] so the transport can be
/// shared as a trait object between the mirror resolver and the fetcher.
pub trait ArtifactTransport: Send + Sync {
    /// Lightweight existence check (HEAD), no content transfer.
    ///
    /// `Ok(true)` means the URL answered with a success status. A non-success
    /// status is `Ok(false)`; transport failures are `Err`.
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<bool, TransportError>>;

    /// Streams `url` to `dest`, creating parent directories as needed.
    ///
    /// Reports progress as bytes transferred via `progress`. Returns the
    /// number of bytes written. A partially written file may remain on error;
    /// callers own cleanup.
    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        progress: Option<ProgressCallback>,
    ) -> BoxFuture<'a, Result<u64, TransportError>>;
}

/// Real transport implementation using `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    fn request_error(&self, url: &str, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            TransportError::Request {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl ArtifactTransport for HttpTransport {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<bool, TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .head(url)
                .send()
                .await
                .map_err(|e| self.request_error(url, e))?;

            Ok(response.status().is_success())
        })
    }

    fn download<'a>(
        &'a self,
        url: &'a str,
        dest: &'a Path,
        progress: Option<ProgressCallback>,
    ) -> BoxFuture<'a, Result<u64, TransportError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.request_error(url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let total_size = response.content_length().unwrap_or(0);

            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| TransportError::Write {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
            }

            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| TransportError::Write {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            let mut stream = response.bytes_stream();
            let mut downloaded = 0u64;

            while let Some(chunk) = stream.next().await {
                let chunk: bytes::Bytes = chunk.map_err(|e| self.request_error(url, e))?;

                file.write_all(&chunk)
                    .await
                    .map_err(|e| TransportError::Write {
                        path: dest.to_path_buf(),
                        source: e,
                    })?;

                downloaded += chunk.len() as u64;

                if let Some(ref cb) = progress {
                    cb(downloaded, total_size);
                }
            }

            file.flush().await.map_err(|e| TransportError::Write {
                path: dest.to_path_buf(),
                source: e,
            })?;

            Ok(downloaded)
        })
    }
}

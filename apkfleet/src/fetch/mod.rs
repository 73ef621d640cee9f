//! Artifact fetching: integrity-checked downloads with cache reuse.
//!
//! This module provides:
//! - Streaming SHA-256 digests for local files (`checksum`)
//! - The HTTP transport seam used for probes and downloads (`transport`)
//! - The fetch stage itself: cache reuse, mirror resolution, streamed
//!   transfer, and post-download verification (`fetcher`)

pub mod checksum;
pub mod fetcher;
pub mod transport;

use std::path::PathBuf;

use thiserror::Error;

pub use fetcher::ArtifactFetcher;
pub use transport::{ArtifactTransport, HttpTransport, ProgressCallback, TransportError};

/// Errors that fail a single package's fetch stage.
///
/// None of these abort the run; each is captured into the owning package's
/// pipeline result.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No mirror in the list serves the artifact.
    #[error("no mirror serves {artifact}")]
    NoMirror { artifact: String },

    /// Network or HTTP failure during the transfer.
    #[error(transparent)]
    Transfer(#[from] TransportError),

    /// Downloaded or cached file does not match the expected digest.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// Local filesystem failure while verifying or cleaning up.
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

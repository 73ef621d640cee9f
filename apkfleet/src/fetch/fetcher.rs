//! The fetch stage: cache reuse, mirror resolution, streamed transfer, and
//! post-download verification.
//!
//! On success the returned path points to a file whose digest matches the
//! descriptor's expected digest at the moment of return. Failed verification
//! always deletes the offending file, so a corrupted artifact is never left
//! on disk for a later run to mistake for a valid cache entry.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::ArtifactDescriptor;
use crate::mirror::{MirrorList, MirrorResolver};
use crate::telemetry::PipelineMetrics;

use super::checksum;
use super::transport::{ArtifactTransport, ProgressCallback};
use super::FetchError;

/// Downloads artifacts to local storage with integrity verification.
pub struct ArtifactFetcher {
    transport: Arc<dyn ArtifactTransport>,
    resolver: MirrorResolver,
    metrics: Arc<PipelineMetrics>,
}

impl ArtifactFetcher {
    /// Creates a fetcher probing and transferring through `transport`.
    pub fn new(transport: Arc<dyn ArtifactTransport>, metrics: Arc<PipelineMetrics>) -> Self {
        let resolver = MirrorResolver::new(Arc::clone(&transport));
        Self {
            transport,
            resolver,
            metrics,
        }
    }

    /// Fetches the descriptor's artifact into local storage.
    ///
    /// 1. A file already present at the local storage path is verified
    ///    first: valid means cache hit (no network), invalid means the file
    ///    is deleted and the download proceeds.
    /// 2. The artifact's relative path is resolved against the mirror list;
    ///    exhaustion fails with [`FetchError::NoMirror`].
    /// 3. The transfer streams to the storage path, reporting byte progress.
    /// 4. The fresh download is verified; a mismatch deletes the file and
    ///    fails with [`FetchError::ChecksumMismatch`].
    ///
    /// Transport errors during 2-3 leave no partial file behind.
    pub async fn fetch(
        &self,
        descriptor: &ArtifactDescriptor,
        mirrors: &MirrorList,
    ) -> Result<PathBuf, FetchError> {
        let local = descriptor.local_path();

        if local.exists() {
            if checksum::digest_matches(local, &descriptor.expected_digest).await? {
                debug!(
                    package = %descriptor.package_id,
                    path = %local.display(),
                    "local artifact valid, reusing without download"
                );
                self.metrics.cache_hit();
                return Ok(local.to_path_buf());
            }

            warn!(
                package = %descriptor.package_id,
                path = %local.display(),
                "local artifact failed verification, discarding"
            );
            tokio::fs::remove_file(local)
                .await
                .map_err(|e| FetchError::Io {
                    path: local.to_path_buf(),
                    source: e,
                })?;
        }

        let url = self
            .resolver
            .resolve(&descriptor.artifact_name, mirrors)
            .await
            .ok_or_else(|| FetchError::NoMirror {
                artifact: descriptor.artifact_name.clone(),
            })?;

        info!(
            package = %descriptor.package_id,
            version = %descriptor.version,
            url = %url,
            "downloading artifact"
        );
        self.metrics.download_started();

        let progress = self.byte_progress();
        if let Err(e) = self.transport.download(&url, local, Some(progress)).await {
            // Clean up partial writes so the next run never sees them.
            let _ = tokio::fs::remove_file(local).await;
            self.metrics.download_failed();
            return Err(FetchError::Transfer(e));
        }

        let actual = checksum::calculate_file_digest(local).await?;
        if !actual.eq_ignore_ascii_case(&descriptor.expected_digest) {
            warn!(
                package = %descriptor.package_id,
                expected = %descriptor.expected_digest,
                actual = %actual,
                "downloaded artifact failed verification, deleting"
            );
            let _ = tokio::fs::remove_file(local).await;
            self.metrics.download_failed();
            return Err(FetchError::ChecksumMismatch {
                filename: descriptor.artifact_name.clone(),
                expected: descriptor.expected_digest.clone(),
                actual,
            });
        }

        self.metrics.download_completed();
        info!(
            package = %descriptor.package_id,
            path = %local.display(),
            "artifact downloaded and verified"
        );
        Ok(local.to_path_buf())
    }

    /// Progress callback feeding transferred-byte deltas into the metrics.
    ///
    /// The transport reports cumulative bytes per transfer; the callback
    /// tracks the last value to record only the delta.
    fn byte_progress(&self) -> ProgressCallback {
        let metrics = Arc::clone(&self.metrics);
        let last = AtomicU64::new(0);
        Box::new(move |downloaded, _total| {
            let previous = last.swap(downloaded, Ordering::Relaxed);
            metrics.bytes_downloaded(downloaded.saturating_sub(previous));
        })
    }
}

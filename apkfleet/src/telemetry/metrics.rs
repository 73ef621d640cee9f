//! Atomic counters recorded by the pipeline stages.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use super::snapshot::TelemetrySnapshot;

/// Lock-free metrics shared by all stages of one provisioning run.
///
/// Created at run start and dropped at run end; never global.
#[derive(Debug)]
pub struct PipelineMetrics {
    started_at: Instant,
    catalog_misses: AtomicUsize,
    cache_hits: AtomicUsize,
    downloads_started: AtomicUsize,
    downloads_completed: AtomicUsize,
    downloads_failed: AtomicUsize,
    bytes_downloaded: AtomicU64,
    installs_completed: AtomicUsize,
    installs_failed: AtomicUsize,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    /// Creates zeroed metrics; the uptime clock starts now.
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            catalog_misses: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            downloads_started: AtomicUsize::new(0),
            downloads_completed: AtomicUsize::new(0),
            downloads_failed: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
            installs_completed: AtomicUsize::new(0),
            installs_failed: AtomicUsize::new(0),
        }
    }

    /// Records a requested package missing from the catalog.
    pub fn catalog_miss(&self) {
        self.catalog_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a still-valid local artifact reused without network traffic.
    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a download entering the transfer stage.
    pub fn download_started(&self) {
        self.downloads_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a download that transferred and verified successfully.
    pub fn download_completed(&self) {
        self.downloads_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a download that failed at any point (no mirror, transfer,
    /// verification).
    pub fn download_failed(&self) {
        self.downloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds transferred bytes. Called with deltas as transfers progress.
    pub fn bytes_downloaded(&self, bytes: u64) {
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Records a successful install.
    pub fn install_completed(&self) {
        self.installs_completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a failed install.
    pub fn install_failed(&self) {
        self.installs_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of all counters for display.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime: self.started_at.elapsed(),
            catalog_misses: self.catalog_misses.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            downloads_started: self.downloads_started.load(Ordering::Relaxed),
            downloads_completed: self.downloads_completed.load(Ordering::Relaxed),
            downloads_failed: self.downloads_failed.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
            installs_completed: self.installs_completed.load(Ordering::Relaxed),
            installs_failed: self.installs_failed.load(Ordering::Relaxed),
        }
    }
}

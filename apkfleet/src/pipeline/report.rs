//! Per-package terminal statuses and the aggregate run report.

use std::fmt;

use crate::fetch::FetchError;
use crate::install::InstallError;

/// Terminal status of one package's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    /// Fetched, verified, and installed.
    Installed,
    /// Requested identifier had no entry in the catalog.
    CatalogMiss,
    /// Download stage failed (no mirror or transfer error).
    FetchFailed,
    /// Downloaded or cached artifact failed integrity verification.
    VerifyFailed,
    /// Device reported an install failure.
    InstallFailed,
    /// Never started: the run was interrupted before this package was
    /// admitted.
    Interrupted,
}

impl PackageStatus {
    /// Human-readable status label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Installed => "installed",
            Self::CatalogMiss => "skipped (not in catalog)",
            Self::FetchFailed => "fetch failed",
            Self::VerifyFailed => "verification failed",
            Self::InstallFailed => "install failed",
            Self::Interrupted => "skipped (interrupted)",
        }
    }
}

impl fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one package's pipeline.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// The requested package identifier.
    pub package_id: String,
    /// Terminal status.
    pub status: PackageStatus,
    /// Optional diagnostic for failures.
    pub diagnostic: Option<String>,
}

impl PipelineResult {
    /// Successful fetch-verify-install.
    pub fn installed(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            status: PackageStatus::Installed,
            diagnostic: None,
        }
    }

    /// Requested but absent from the catalog.
    pub fn catalog_miss(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            status: PackageStatus::CatalogMiss,
            diagnostic: None,
        }
    }

    /// Not admitted because the run was interrupted.
    pub fn interrupted(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            status: PackageStatus::Interrupted,
            diagnostic: None,
        }
    }

    /// Maps a fetch-stage error onto the owning package's terminal status.
    pub fn from_fetch_error(package_id: impl Into<String>, error: FetchError) -> Self {
        let status = match error {
            FetchError::ChecksumMismatch { .. } => PackageStatus::VerifyFailed,
            _ => PackageStatus::FetchFailed,
        };
        Self {
            package_id: package_id.into(),
            status,
            diagnostic: Some(error.to_string()),
        }
    }

    /// Maps an install-stage error onto the owning package's terminal status.
    pub fn from_install_error(package_id: impl Into<String>, error: InstallError) -> Self {
        Self {
            package_id: package_id.into(),
            status: PackageStatus::InstallFailed,
            diagnostic: Some(error.to_string()),
        }
    }

    /// True only for a fully installed package.
    pub fn is_success(&self) -> bool {
        self.status == PackageStatus::Installed
    }
}

/// Aggregate outcome of a provisioning run.
///
/// Results are in completion order, not submission order; every requested
/// identifier appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Per-package outcomes, completion order.
    pub results: Vec<PipelineResult>,
}

impl RunReport {
    /// Number of fully installed packages.
    pub fn installed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    /// Number of packages with any non-installed terminal status.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.installed_count()
    }

    /// True when every requested package installed.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

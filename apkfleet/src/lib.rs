//! APKFleet - Fleet provisioning for Android devices from F-Droid-style repositories.
//!
//! This library resolves a curated list of package identifiers against a
//! repository catalog (`index.xml`), downloads the highest-versioned APK for
//! each package from a prioritized mirror list with SHA-256 verification, and
//! installs each verified APK onto a connected device over ADB.
//!
//! # Architecture
//!
//! ```text
//! package ids ──► catalog ──► ArtifactDescriptor ──► fetch ──► verified APK ──► install
//!                (resolve)                        (bounded N)               (bounded M)
//! ```
//!
//! Downloads and installs run under two independent concurrency limiters.
//! A failure in any one package's pipeline never blocks the remaining
//! packages; every requested identifier ends the run with a terminal status.

use std::future::Future;
use std::pin::Pin;

pub mod catalog;
pub mod config;
pub mod device;
pub mod fetch;
pub mod install;
pub mod mirror;
pub mod pipeline;
pub mod telemetry;

/// Library version, sourced from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Boxed future type for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

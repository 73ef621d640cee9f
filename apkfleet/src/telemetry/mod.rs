//! Run telemetry for observability and user feedback.
//!
//! This module provides metrics collection and reporting for the provisioning
//! pipeline. It uses lock-free atomic counters for low-overhead
//! instrumentation.
//!
//! # Architecture
//!
//! ```text
//! Pipeline Stages ─────► PipelineMetrics ─────► TelemetrySnapshot ─────► Views
//!                        (atomic counters)     (point-in-time copy)      (CLI)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use apkfleet::telemetry::PipelineMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(PipelineMetrics::new());
//!
//! metrics.download_started();
//! metrics.bytes_downloaded(768_000);
//! metrics.download_completed();
//!
//! let snapshot = metrics.snapshot();
//! println!("Downloaded: {}", snapshot.bytes_downloaded_human());
//! ```

mod metrics;
mod snapshot;

pub use metrics::PipelineMetrics;
pub use snapshot::TelemetrySnapshot;

//! Point-in-time telemetry views.

use std::time::Duration;

/// Immutable copy of the pipeline counters at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    /// Time elapsed since the run's metrics were created.
    pub uptime: Duration,
    /// Requested packages with no catalog entry.
    pub catalog_misses: usize,
    /// Valid local artifacts reused without network traffic.
    pub cache_hits: usize,
    /// Downloads that entered the transfer stage.
    pub downloads_started: usize,
    /// Downloads that transferred and verified successfully.
    pub downloads_completed: usize,
    /// Downloads that failed (no mirror, transfer error, or verification).
    pub downloads_failed: usize,
    /// Total bytes transferred.
    pub bytes_downloaded: u64,
    /// Successful installs.
    pub installs_completed: usize,
    /// Failed installs.
    pub installs_failed: usize,
}

impl TelemetrySnapshot {
    /// Bytes transferred, formatted with a binary-prefix unit.
    pub fn bytes_downloaded_human(&self) -> String {
        format_bytes(self.bytes_downloaded)
    }

    /// Average transfer rate over the run, formatted per second.
    pub fn throughput_human(&self) -> String {
        let secs = self.uptime.as_secs_f64();
        if secs <= 0.0 {
            return "0 B/s".to_string();
        }
        format!(
            "{}/s",
            format_bytes((self.bytes_downloaded as f64 / secs) as u64)
        )
    }

    /// Uptime as `XmYs`.
    pub fn uptime_human(&self) -> String {
        let total = self.uptime.as_secs();
        let minutes = total / 60;
        let seconds = total % 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

/// Formats a byte count with binary-prefix units.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_bytes(bytes: u64, uptime: Duration) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime,
            catalog_misses: 0,
            cache_hits: 0,
            downloads_started: 0,
            downloads_completed: 0,
            downloads_failed: 0,
            bytes_downloaded: bytes,
            installs_completed: 0,
            installs_failed: 0,
        }
    }

    #[test]
    fn test_format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.0 GiB");
    }

    #[test]
    fn test_throughput_over_uptime() {
        let snapshot = snapshot_with_bytes(10 * 1024, Duration::from_secs(10));
        assert_eq!(snapshot.throughput_human(), "1.0 KiB/s");
    }

    #[test]
    fn test_uptime_human() {
        assert_eq!(
            snapshot_with_bytes(0, Duration::from_secs(42)).uptime_human(),
            "42s"
        );
        assert_eq!(
            snapshot_with_bytes(0, Duration::from_secs(135)).uptime_human(),
            "2m 15s"
        );
    }
}

//! ADB-backed implementation of the device collaborator.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info};

use crate::BoxFuture;

use super::{DeviceCommands, DeviceError};

/// Device commands implemented by spawning the `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbCommands {
    adb_path: PathBuf,
}

impl Default for AdbCommands {
    fn default() -> Self {
        Self::new()
    }
}

impl AdbCommands {
    /// Uses `adb` from `PATH`.
    pub fn new() -> Self {
        Self {
            adb_path: PathBuf::from("adb"),
        }
    }

    /// Uses an explicit `adb` binary path.
    pub fn with_path(adb_path: impl Into<PathBuf>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    /// Preflight check that the `adb` binary can be executed at all.
    ///
    /// Run once before a provisioning run so a missing tool surfaces as a
    /// configuration error instead of failing every package.
    pub async fn ensure_available(&self) -> Result<(), DeviceError> {
        let output = Command::new(&self.adb_path)
            .arg("version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DeviceError::AdbNotFound
                } else {
                    DeviceError::Spawn(e.to_string())
                }
            })?;

        if output.status.success() {
            debug!(adb = %self.adb_path.display(), "adb preflight ok");
            Ok(())
        } else {
            Err(DeviceError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    fn spawn_error(e: std::io::Error) -> DeviceError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DeviceError::AdbNotFound
        } else {
            DeviceError::Spawn(e.to_string())
        }
    }
}

impl DeviceCommands for AdbCommands {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, DeviceError>> {
        Box::pin(async move {
            let output = Command::new(&self.adb_path)
                .arg("devices")
                .output()
                .await
                .map_err(Self::spawn_error)?;

            if !output.status.success() {
                return Err(DeviceError::CommandFailed(
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ));
            }

            let listing = String::from_utf8_lossy(&output.stdout);
            Ok(parse_device_list(&listing))
        })
    }

    fn install_package<'a>(
        &'a self,
        serial: &'a str,
        apk_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), DeviceError>> {
        Box::pin(async move {
            info!(serial, path = %apk_path.display(), "adb install");

            // -r replaces an existing install, -d allows a version downgrade;
            // fleet provisioning may reinstall a known-good build over a
            // newer one.
            let output = Command::new(&self.adb_path)
                .arg("-s")
                .arg(serial)
                .arg("install")
                .arg("-r")
                .arg("-d")
                .arg(apk_path)
                .output()
                .await
                .map_err(Self::spawn_error)?;

            if output.status.success() {
                Ok(())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let diagnostic = if stderr.trim().is_empty() {
                    String::from_utf8_lossy(&output.stdout).trim().to_string()
                } else {
                    stderr.trim().to_string()
                };
                Err(DeviceError::CommandFailed(diagnostic))
            }
        })
    }
}

/// Parses `adb devices` output into ready-state serials.
///
/// The first line is a banner; each following line is `<serial>\t<state>`.
/// Only devices in the `device` state are usable; `offline` and
/// `unauthorized` entries are skipped.
fn parse_device_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            (state == "device").then(|| serial.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_list() {
        let listing = "List of devices attached\nemulator-5554\tdevice\nR58M123ABC\tdevice\n";
        assert_eq!(
            parse_device_list(listing),
            vec!["emulator-5554".to_string(), "R58M123ABC".to_string()]
        );
    }

    #[test]
    fn test_parse_skips_unauthorized_and_offline() {
        let listing =
            "List of devices attached\nemulator-5554\tdevice\nR58M123ABC\tunauthorized\nXYZ\toffline\n";
        assert_eq!(parse_device_list(listing), vec!["emulator-5554".to_string()]);
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(parse_device_list("List of devices attached\n").is_empty());
        assert!(parse_device_list("").is_empty());
    }
}

//! The install stage: hands a verified local artifact to the device.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::device::{DeviceCommands, DeviceError};
use crate::telemetry::PipelineMetrics;

/// Errors that fail a single package's install stage.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The device tool reported a failure; `diagnostic` carries its output
    /// verbatim.
    #[error("install failed for {package}: {diagnostic}")]
    CommandFailed { package: String, diagnostic: String },
}

/// Installs verified artifacts onto one target device.
///
/// Installs are never retried automatically; the caller records the failure
/// and moves on.
pub struct InstallExecutor {
    device: Arc<dyn DeviceCommands>,
    serial: String,
    metrics: Arc<PipelineMetrics>,
}

impl InstallExecutor {
    /// Creates an executor installing onto the device with `serial`.
    pub fn new(
        device: Arc<dyn DeviceCommands>,
        serial: impl Into<String>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            device,
            serial: serial.into(),
            metrics,
        }
    }

    /// Installs a local artifact with replace-existing and allow-downgrade
    /// semantics.
    pub async fn install(&self, package_id: &str, apk_path: &Path) -> Result<(), InstallError> {
        match self.device.install_package(&self.serial, apk_path).await {
            Ok(()) => {
                self.metrics.install_completed();
                info!(package = package_id, serial = %self.serial, "package installed");
                Ok(())
            }
            Err(e) => {
                self.metrics.install_failed();
                let diagnostic = match e {
                    DeviceError::CommandFailed(text) => text,
                    other => other.to_string(),
                };
                error!(package = package_id, diagnostic = %diagnostic, "install failed");
                Err(InstallError::CommandFailed {
                    package: package_id.to_string(),
                    diagnostic,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::BoxFuture;

    /// Mock device that fails installs with a fixed diagnostic.
    struct FailingDevice {
        diagnostic: &'static str,
    }

    impl DeviceCommands for FailingDevice {
        fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, DeviceError>> {
            Box::pin(async move { Ok(vec!["emulator-5554".to_string()]) })
        }

        fn install_package<'a>(
            &'a self,
            _serial: &'a str,
            _apk_path: &'a Path,
        ) -> BoxFuture<'a, Result<(), DeviceError>> {
            Box::pin(async move { Err(DeviceError::CommandFailed(self.diagnostic.to_string())) })
        }
    }

    /// Mock device that accepts every install.
    struct AcceptingDevice;

    impl DeviceCommands for AcceptingDevice {
        fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, DeviceError>> {
            Box::pin(async move { Ok(vec!["emulator-5554".to_string()]) })
        }

        fn install_package<'a>(
            &'a self,
            _serial: &'a str,
            _apk_path: &'a Path,
        ) -> BoxFuture<'a, Result<(), DeviceError>> {
            Box::pin(async move { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_successful_install_records_metric() {
        let metrics = Arc::new(PipelineMetrics::new());
        let executor =
            InstallExecutor::new(Arc::new(AcceptingDevice), "emulator-5554", Arc::clone(&metrics));

        executor
            .install("com.example.app", &PathBuf::from("/tmp/app.apk"))
            .await
            .unwrap();

        assert_eq!(metrics.snapshot().installs_completed, 1);
    }

    #[tokio::test]
    async fn test_failure_surfaces_diagnostic_verbatim() {
        let metrics = Arc::new(PipelineMetrics::new());
        let executor = InstallExecutor::new(
            Arc::new(FailingDevice {
                diagnostic: "INSTALL_FAILED_INSUFFICIENT_STORAGE",
            }),
            "emulator-5554",
            Arc::clone(&metrics),
        );

        let err = executor
            .install("com.example.app", &PathBuf::from("/tmp/app.apk"))
            .await
            .unwrap_err();

        match err {
            InstallError::CommandFailed {
                package,
                diagnostic,
            } => {
                assert_eq!(package, "com.example.app");
                assert_eq!(diagnostic, "INSTALL_FAILED_INSUFFICIENT_STORAGE");
            }
        }
        assert_eq!(metrics.snapshot().installs_failed, 1);
    }
}

//! Device command collaborator boundary.
//!
//! The pipeline consumes exactly two device operations: enumerating connected
//! devices and installing a package file. Both sit behind the
//! [`DeviceCommands`] trait so tests can swap in mock devices; production
//! code uses [`AdbCommands`] which shells out to `adb`.

mod adb;

use std::path::Path;

use thiserror::Error;

use crate::BoxFuture;

pub use adb::AdbCommands;

/// Errors raised by the device collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The `adb` executable is not installed or not on `PATH`.
    #[error("adb executable not found; install platform-tools and add adb to PATH")]
    AdbNotFound,

    /// Failed to spawn or communicate with the device tool.
    #[error("failed to run adb: {0}")]
    Spawn(String),

    /// The device tool exited with a failure; carries its diagnostic output
    /// verbatim.
    #[error("{0}")]
    CommandFailed(String),

    /// No devices are connected.
    #[error("no connected devices; attach a device or start an emulator")]
    NoDevices,

    /// More than one device is connected and none was selected explicitly.
    #[error("multiple devices connected ({}); select one with a serial", .0.join(", "))]
    MultipleDevices(Vec<String>),

    /// An explicitly requested serial is not among the connected devices.
    #[error("device {serial} is not connected")]
    DeviceNotFound { serial: String },
}

/// Operations the pipeline needs from the device tool.
pub trait DeviceCommands: Send + Sync {
    /// Lists serials of connected devices in the ready state.
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<String>, DeviceError>>;

    /// Installs a package file onto the device with replace-existing and
    /// allow-downgrade semantics.
    ///
    /// A non-zero outcome surfaces the tool's diagnostic text verbatim as
    /// [`DeviceError::CommandFailed`].
    fn install_package<'a>(
        &'a self,
        serial: &'a str,
        apk_path: &'a Path,
    ) -> BoxFuture<'a, Result<(), DeviceError>>;
}

/// Picks the target device from the connected set.
///
/// With an explicit serial the device must be connected. Without one,
/// exactly one connected device is required: zero is [`DeviceError::NoDevices`],
/// several is [`DeviceError::MultipleDevices`].
pub fn select_device(connected: &[String], requested: Option<&str>) -> Result<String, DeviceError> {
    match requested {
        Some(serial) => {
            if connected.iter().any(|s| s == serial) {
                Ok(serial.to_string())
            } else {
                Err(DeviceError::DeviceNotFound {
                    serial: serial.to_string(),
                })
            }
        }
        None => match connected {
            [] => Err(DeviceError::NoDevices),
            [only] => Ok(only.clone()),
            many => Err(DeviceError::MultipleDevices(many.to_vec())),
        },
    }
}

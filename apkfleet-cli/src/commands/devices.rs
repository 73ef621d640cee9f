//! Devices command - enumerate connected devices.

use apkfleet::device::{AdbCommands, DeviceCommands};

use crate::error::CliError;

/// Run the devices command.
pub async fn run() -> Result<i32, CliError> {
    let adb = AdbCommands::new();
    adb.ensure_available().await?;

    let devices = adb.list_devices().await?;
    if devices.is_empty() {
        println!("No devices connected.");
        return Ok(1);
    }

    println!("Connected devices:");
    for serial in &devices {
        println!("  {serial}");
    }
    Ok(0)
}

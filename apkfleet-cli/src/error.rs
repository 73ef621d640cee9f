//! CLI error type.

use apkfleet::catalog::CatalogError;
use apkfleet::device::DeviceError;
use apkfleet::fetch::TransportError;

/// Fatal errors that abort a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem (file, arguments, or validation).
    Config(String),

    /// Catalog could not be obtained or parsed.
    Catalog(CatalogError),

    /// Device tool failure or device selection problem.
    Device(DeviceError),

    /// HTTP client could not be constructed.
    Transport(TransportError),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {}", msg),
            Self::Catalog(e) => write!(f, "{}", e),
            Self::Device(e) => write!(f, "{}", e),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(_) => None,
            Self::Catalog(e) => Some(e),
            Self::Device(e) => Some(e),
            Self::Transport(e) => Some(e),
        }
    }
}

impl From<CatalogError> for CliError {
    fn from(e: CatalogError) -> Self {
        Self::Catalog(e)
    }
}

impl From<DeviceError> for CliError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

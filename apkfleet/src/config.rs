//! Run configuration: repository location, mirrors, storage, concurrency,
//! and the curated package list.
//!
//! Configuration is layered: command-line values override the config file,
//! which overrides the built-in defaults. The file format is INI.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::mirror::MirrorList;

/// Default catalog index location.
pub const DEFAULT_INDEX_URL: &str = "https://f-droid.org/repo/index.xml";

/// Default maximum number of simultaneous downloads.
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 5;

/// Default maximum number of simultaneous installs.
///
/// The device interface is a single shared resource; a small pool keeps it
/// responsive.
pub const DEFAULT_INSTALL_CONCURRENCY: usize = 3;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Built-in repository mirrors, highest priority first.
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://f-droid.org/repo",
    "https://mirror.cyberbits.eu/fdroid/repo",
    "https://mirror.fcix.net/fdroid/repo",
    "https://mirror.kumi.systems/fdroid/repo",
    "https://mirror.level66.network/fdroid/repo",
    "https://mirror.ossplanet.net/fdroid/repo",
    "https://mirrors.dotsrc.org/fdroid/repo",
    "https://opencolo.mm.fcix.net/fdroid/repo",
    "https://plug-mirror.rcac.purdue.edu/fdroid/repo",
    "https://mirror.init7.net/fdroid/repo",
    "https://mirror.freedif.org/fdroid/repo",
    "https://de.freedif.org/fdroid/repo",
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or parsed.
    #[error("failed to load config {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    /// A setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything one provisioning run needs to know.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Catalog index source: a URL or a local file path.
    pub index_url: String,
    /// Mirror base URLs, highest priority first.
    pub mirrors: MirrorList,
    /// Directory holding downloaded artifacts (doubles as the cache).
    pub artifact_dir: PathBuf,
    /// Curated package identifiers to provision.
    pub packages: Vec<String>,
    /// Maximum simultaneous downloads.
    pub download_concurrency: usize,
    /// Maximum simultaneous installs.
    pub install_concurrency: usize,
    /// Explicit target device serial; auto-selected when absent.
    pub device_serial: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvisionConfig {
    /// Creates a config with built-in defaults and an empty package list.
    pub fn new() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            mirrors: DEFAULT_MIRRORS.iter().copied().collect(),
            artifact_dir: default_artifact_dir(),
            packages: Vec::new(),
            download_concurrency: DEFAULT_DOWNLOAD_CONCURRENCY,
            install_concurrency: DEFAULT_INSTALL_CONCURRENCY,
            device_serial: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Loads a config file over the defaults.
    ///
    /// Recognized sections: `[repo]` (`index_url`, `mirrors`), `[storage]`
    /// (`artifact_dir`), `[download]` (`parallel`, `timeout`), `[install]`
    /// (`parallel`), `[device]` (`serial`), `[packages]` (`install`).
    /// Unrecognized keys are ignored; list values are comma-separated.
    pub fn from_ini(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config = Self::new();

        if let Some(repo) = ini.section(Some("repo")) {
            if let Some(url) = repo.get("index_url") {
                config.index_url = url.to_string();
            }
            if let Some(mirrors) = repo.get("mirrors") {
                config.mirrors = split_list(mirrors).into_iter().collect();
            }
        }

        if let Some(storage) = ini.section(Some("storage")) {
            if let Some(dir) = storage.get("artifact_dir") {
                config.artifact_dir = PathBuf::from(dir);
            }
        }

        if let Some(download) = ini.section(Some("download")) {
            if let Some(parallel) = download.get("parallel") {
                config.download_concurrency = parse_number(parallel, "download.parallel")?;
            }
            if let Some(timeout) = download.get("timeout") {
                config.timeout_secs = parse_number(timeout, "download.timeout")?;
            }
        }

        if let Some(install) = ini.section(Some("install")) {
            if let Some(parallel) = install.get("parallel") {
                config.install_concurrency = parse_number(parallel, "install.parallel")?;
            }
        }

        if let Some(device) = ini.section(Some("device")) {
            if let Some(serial) = device.get("serial") {
                config.device_serial = Some(serial.to_string());
            }
        }

        if let Some(packages) = ini.section(Some("packages")) {
            if let Some(list) = packages.get("install") {
                config.packages = split_list(list);
            }
        }

        Ok(config)
    }

    /// Sets the catalog index source.
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    /// Replaces the mirror list.
    pub fn with_mirrors(mut self, mirrors: MirrorList) -> Self {
        self.mirrors = mirrors;
        self
    }

    /// Sets the artifact storage directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Replaces the package list.
    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self
    }

    /// Sets the download concurrency bound.
    pub fn with_download_concurrency(mut self, limit: usize) -> Self {
        self.download_concurrency = limit;
        self
    }

    /// Sets the install concurrency bound.
    pub fn with_install_concurrency(mut self, limit: usize) -> Self {
        self.install_concurrency = limit;
        self
    }

    /// Sets the explicit target device serial.
    pub fn with_device_serial(mut self, serial: impl Into<String>) -> Self {
        self.device_serial = Some(serial.into());
        self
    }

    /// Checks the config is runnable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packages.is_empty() {
            return Err(ConfigError::Invalid(
                "no packages configured; add --package or a [packages] section".to_string(),
            ));
        }
        if self.mirrors.is_empty() {
            return Err(ConfigError::Invalid("mirror list is empty".to_string()));
        }
        if self.download_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "download.parallel must be at least 1".to_string(),
            ));
        }
        if self.install_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "install.parallel must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default artifact directory under the platform data directory.
fn default_artifact_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("apkfleet").join("apks"))
        .unwrap_or_else(|| PathBuf::from("apkfleet_apks"))
}

/// Splits a comma-separated list value, dropping empty items.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ProvisionConfig::new();
        assert_eq!(config.index_url, DEFAULT_INDEX_URL);
        assert_eq!(config.download_concurrency, DEFAULT_DOWNLOAD_CONCURRENCY);
        assert_eq!(config.install_concurrency, DEFAULT_INSTALL_CONCURRENCY);
        assert_eq!(config.mirrors.len(), DEFAULT_MIRRORS.len());
        assert!(config.packages.is_empty());
        assert!(config.device_serial.is_none());
    }

    #[test]
    fn test_from_ini_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[repo]\n\
             index_url = https://repo.example/index.xml\n\
             mirrors = https://a.example/repo, https://b.example/repo\n\
             \n\
             [storage]\n\
             artifact_dir = /var/cache/apks\n\
             \n\
             [download]\n\
             parallel = 8\n\
             timeout = 60\n\
             \n\
             [install]\n\
             parallel = 2\n\
             \n\
             [device]\n\
             serial = emulator-5554\n\
             \n\
             [packages]\n\
             install = com.termux, org.fdroid.fdroid"
        )
        .unwrap();

        let config = ProvisionConfig::from_ini(&path).unwrap();
        assert_eq!(config.index_url, "https://repo.example/index.xml");
        assert_eq!(config.mirrors.len(), 2);
        assert_eq!(config.artifact_dir, PathBuf::from("/var/cache/apks"));
        assert_eq!(config.download_concurrency, 8);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.install_concurrency, 2);
        assert_eq!(config.device_serial.as_deref(), Some("emulator-5554"));
        assert_eq!(config.packages, vec!["com.termux", "org.fdroid.fdroid"]);
    }

    #[test]
    fn test_from_ini_missing_file() {
        let result = ProvisionConfig::from_ini(Path::new("/nonexistent/config.ini"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_from_ini_rejects_non_numeric_concurrency() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[download]\nparallel = many\n").unwrap();

        let result = ProvisionConfig::from_ini(&path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_requires_packages() {
        let config = ProvisionConfig::new();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = config.with_packages(vec!["com.termux".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = ProvisionConfig::new()
            .with_packages(vec!["com.termux".to_string()])
            .with_download_concurrency(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_builder_setters() {
        let config = ProvisionConfig::new()
            .with_index_url("https://repo.example/index.xml")
            .with_artifact_dir("/tmp/apks")
            .with_device_serial("R58M123ABC")
            .with_install_concurrency(1);

        assert_eq!(config.index_url, "https://repo.example/index.xml");
        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/apks"));
        assert_eq!(config.device_serial.as_deref(), Some("R58M123ABC"));
        assert_eq!(config.install_concurrency, 1);
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" a.example , , b.example "),
            vec!["a.example", "b.example"]
        );
    }
}

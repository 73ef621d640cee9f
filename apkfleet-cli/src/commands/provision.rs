//! Provision command - run the full fetch-verify-install pipeline.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::info;

use apkfleet::catalog::CatalogSource;
use apkfleet::config::ProvisionConfig;
use apkfleet::device::{self, AdbCommands, DeviceCommands};
use apkfleet::fetch::{ArtifactTransport, HttpTransport};
use apkfleet::pipeline::{PipelineOrchestrator, RunReport};

use crate::error::CliError;

/// Arguments for the provision command.
#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Config file (INI). Defaults to the platform config directory.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Package identifier to provision (repeatable).
    #[arg(long = "package", value_name = "ID")]
    pub packages: Vec<String>,

    /// Catalog index URL or local file path.
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,

    /// Mirror base URL, highest priority first (repeatable).
    #[arg(long = "mirror", value_name = "URL")]
    pub mirrors: Vec<String>,

    /// Directory for downloaded artifacts.
    #[arg(long, value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Maximum simultaneous downloads.
    #[arg(long, value_name = "N")]
    pub download_concurrency: Option<usize>,

    /// Maximum simultaneous installs.
    #[arg(long, value_name = "N")]
    pub install_concurrency: Option<usize>,

    /// Target device serial.
    #[arg(long, value_name = "SERIAL")]
    pub serial: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Run the provision command.
///
/// Returns the process exit code: zero only when every requested package
/// installed.
pub async fn run(args: ProvisionArgs) -> Result<i32, CliError> {
    let config = resolve_config(&args)?;
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;

    // Preflight: a missing adb should fail the run up front, not per package.
    let adb = Arc::new(AdbCommands::new());
    adb.ensure_available().await?;

    let connected = adb.list_devices().await?;
    let serial = device::select_device(&connected, config.device_serial.as_deref())?;

    println!("APKFleet v{}", apkfleet::VERSION);
    println!("================");
    println!();
    println!("Device:    {serial}");
    println!("Catalog:   {}", config.index_url);
    println!("Mirrors:   {}", config.mirrors.len());
    println!("Packages:  {}", config.packages.len());
    println!("Artifacts: {}", config.artifact_dir.display());
    println!();

    let transport: Arc<dyn ArtifactTransport> = Arc::new(HttpTransport::with_timeout(
        Duration::from_secs(config.timeout_secs),
    )?);

    let source = CatalogSource::parse(&config.index_url);
    let raw_index = source
        .load(transport.as_ref(), &config.artifact_dir)
        .await?;

    // Ctrl+C stops admitting new packages; in-flight work drains naturally.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            println!();
            println!("Interrupt received; finishing in-flight packages...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| CliError::Config(format!("failed to set signal handler: {e}")))?;
    }

    info!(packages = config.packages.len(), device = %serial, "starting provisioning run");

    let orchestrator =
        PipelineOrchestrator::new(config, transport, adb).with_shutdown_flag(shutdown);
    let metrics = orchestrator.metrics();

    let report = orchestrator.run(&serial, &raw_index).await?;

    print!("{}", format_summary(&report));

    let snapshot = metrics.snapshot();
    println!(
        "  Downloaded {} ({} transfers, {} cache hits) in {}",
        snapshot.bytes_downloaded_human(),
        snapshot.downloads_completed,
        snapshot.cache_hits,
        snapshot.uptime_human()
    );
    println!();

    Ok(if report.is_success() { 0 } else { 1 })
}

/// Layers CLI arguments over the config file over built-in defaults.
fn resolve_config(args: &ProvisionArgs) -> Result<ProvisionConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            ProvisionConfig::from_ini(path).map_err(|e| CliError::Config(e.to_string()))?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                ProvisionConfig::from_ini(&path).map_err(|e| CliError::Config(e.to_string()))?
            }
            _ => ProvisionConfig::new(),
        },
    };

    if !args.packages.is_empty() {
        config.packages = args.packages.clone();
    }
    if let Some(url) = &args.index_url {
        config.index_url = url.clone();
    }
    if !args.mirrors.is_empty() {
        config.mirrors = args.mirrors.iter().cloned().collect();
    }
    if let Some(dir) = &args.artifact_dir {
        config.artifact_dir = dir.clone();
    }
    if let Some(limit) = args.download_concurrency {
        config.download_concurrency = limit;
    }
    if let Some(limit) = args.install_concurrency {
        config.install_concurrency = limit;
    }
    if let Some(serial) = &args.serial {
        config.device_serial = Some(serial.clone());
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }

    Ok(config)
}

/// Default config file location under the platform config directory.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("apkfleet").join("config.ini"))
}

/// Per-package status lines plus aggregate counts.
fn format_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("\nProvisioning Summary\n");
    out.push_str("--------------------\n");

    for result in &report.results {
        match &result.diagnostic {
            Some(diagnostic) => out.push_str(&format!(
                "  {:<40} {} ({})\n",
                result.package_id, result.status, diagnostic
            )),
            None => out.push_str(&format!("  {:<40} {}\n", result.package_id, result.status)),
        }
    }

    out.push_str(&format!(
        "\n  {} installed, {} failed of {} requested\n",
        report.installed_count(),
        report.failed_count(),
        report.results.len()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use apkfleet::pipeline::PipelineResult;
    use tempfile::TempDir;

    fn args() -> ProvisionArgs {
        ProvisionArgs {
            config: None,
            packages: Vec::new(),
            index_url: None,
            mirrors: Vec::new(),
            artifact_dir: None,
            download_concurrency: None,
            install_concurrency: None,
            serial: None,
            timeout: None,
        }
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[download]\nparallel = 8\n\n[packages]\ninstall = com.termux"
        )
        .unwrap();

        let mut args = args();
        args.config = Some(path);
        args.download_concurrency = Some(2);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.download_concurrency, 2);
        assert_eq!(config.packages, vec!["com.termux"]);
    }

    #[test]
    fn test_cli_packages_replace_file_packages() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        std::fs::write(&path, "[packages]\ninstall = com.termux\n").unwrap();

        let mut args = args();
        args.config = Some(path);
        args.packages = vec!["org.fdroid.fdroid".to_string()];

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.packages, vec!["org.fdroid.fdroid"]);
    }

    #[test]
    fn test_summary_lists_every_package() {
        let report = RunReport {
            results: vec![
                PipelineResult::installed("pkg.a"),
                PipelineResult::catalog_miss("pkg.b"),
            ],
        };

        let summary = format_summary(&report);
        assert!(summary.contains("pkg.a"));
        assert!(summary.contains("installed"));
        assert!(summary.contains("pkg.b"));
        assert!(summary.contains("not in catalog"));
        assert!(summary.contains("1 installed, 1 failed of 2 requested"));
    }
}

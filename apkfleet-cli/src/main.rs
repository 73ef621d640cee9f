//! APKFleet CLI - command-line interface to the provisioning pipeline.

mod commands;
mod error;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "apkfleet",
    version = apkfleet::VERSION,
    about = "Provision Android devices from an F-Droid-style repository"
)]
struct Cli {
    /// Directory for run log files.
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, download, verify, and install the configured packages.
    Provision(commands::provision::ProvisionArgs),
    /// List connected devices.
    Devices,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // The guard flushes buffered log lines on exit.
    let _guard = match logging::init(cli.log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Commands::Provision(args) => commands::provision::run(args).await,
        Commands::Devices => commands::devices::run().await,
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

use clap::Parser;
use oastscan::cli::{self, Commands};
use oastscan::errors::ScanError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    let config = cli.config;
    let result = match cli.command {
        Commands::Scan(args) => cli::scan::handle_scan(config, args).await,
        Commands::Check(args) => cli::check::handle_check(config, args).await,
        Commands::Config(args) => cli::config::handle_config(config, args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            ScanError::Config(_) => 2,
            ScanError::Network(_) | ScanError::Timeout(_) => 3,
            ScanError::Authentication(_) => 4,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

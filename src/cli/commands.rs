use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OASTSCAN_GIT_HASH"),
    ", built ",
    env!("OASTSCAN_BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "oastscan",
    version,
    long_version = LONG_VERSION,
    about = "Probe captured traffic for FastJson, Log4j and Spring exposures, confirmed out of band"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (default: ~/.burp/dnslog_config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay requests through the scanners and confirm callbacks
    Scan(ScanArgs),
    /// Poll the confirmation backend once
    Check(CheckArgs),
    /// Show, create or validate the configuration file
    Config(ConfigArgs),
}

#[derive(Args, Clone)]
pub struct ScanArgs {
    /// JSON Lines file with one captured request per line
    #[arg(short, long, conflicts_with = "url", required_unless_present = "url")]
    pub requests: Option<PathBuf>,

    /// Scan a plain GET of this URL (repeatable)
    #[arg(short, long)]
    pub url: Vec<String>,

    /// Seconds to wait for late callbacks before the final check
    #[arg(long, default_value = "10")]
    pub settle: u64,

    /// Seconds in-flight work gets at shutdown before it is aborted
    #[arg(long, default_value = "30")]
    pub grace: u64,

    /// Write findings as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write a Markdown report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    /// Print every interaction, not just the count
    #[arg(long)]
    pub list: bool,
}

#[derive(Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets masked
    Show {
        path: Option<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check a configuration file strictly
    Validate {
        path: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_needs_input() {
        assert!(Cli::try_parse_from(["oastscan", "scan"]).is_err());
        assert!(Cli::try_parse_from(["oastscan", "scan", "--requests", "a.jsonl", "--url", "http://x"]).is_err());
    }

    #[test]
    fn test_scan_urls_and_globals() {
        let cli = Cli::try_parse_from([
            "oastscan", "-vv", "scan", "--url", "http://a.test/", "--url", "http://b.test/", "--settle", "0",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.url.len(), 2);
        assert_eq!(args.settle, 0);
        assert!(args.requests.is_none());
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::try_parse_from(["oastscan", "config", "init", "/tmp/c.json", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigArgs { action: ConfigAction::Init { path, force } }) => {
                assert_eq!(path, Some(PathBuf::from("/tmp/c.json")));
                assert!(force);
            }
            _ => panic!("expected config init"),
        }
    }
}

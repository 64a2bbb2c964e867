use std::path::PathBuf;
use crate::cli::commands::{ConfigAction, ConfigArgs};
use crate::config::{default_config_path, load_or_default, parse_config, save_config, ScanConfig};
use crate::errors::ScanError;

const MASK: &str = "********";

pub async fn handle_config(config_path: Option<PathBuf>, args: ConfigArgs) -> Result<(), ScanError> {
    let resolve = |path: Option<PathBuf>| path.or_else(|| config_path.clone()).unwrap_or_else(default_config_path);

    match args.action {
        ConfigAction::Show { path } => {
            let path = resolve(path);
            let config = load_or_default(&path).await;
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&masked(config))?);
        }
        ConfigAction::Init { path, force } => {
            let path = resolve(path);
            if path.exists() && !force {
                return Err(ScanError::Config(format!(
                    "{} already exists, pass --force to overwrite",
                    path.display()
                )));
            }
            save_config(&path, &ScanConfig::default()).await?;
            println!("Wrote default configuration to {}", path.display());
        }
        ConfigAction::Validate { path } => {
            let path = resolve(path);
            let config = parse_config(&path).await?;
            println!("Configuration is valid: {} (backend {})", path.display(), config.dnslog_type);
        }
    }
    Ok(())
}

/// Literal keys are hidden; `$VAR` references are shown as written.
fn masked(mut config: ScanConfig) -> ScanConfig {
    if !config.ceye_api_key.is_empty() && !config.ceye_api_key.starts_with('$') {
        config.ceye_api_key = MASK.to_string();
    }
    config
}

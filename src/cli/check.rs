use std::path::PathBuf;
use crate::cli::commands::CheckArgs;
use crate::config::{default_config_path, load_or_default};
use crate::errors::ScanError;
use crate::oast::create_backend;

/// Poll the backend directly so credential and network problems surface as
/// errors instead of an empty result.
pub async fn handle_check(config_path: Option<PathBuf>, args: CheckArgs) -> Result<(), ScanError> {
    let config_path = config_path.unwrap_or_else(default_config_path);
    let config = load_or_default(&config_path).await;
    let backend = create_backend(&config, None)?;

    let domain = backend.payload_domain()?;
    let interactions = backend.fetch_all_interactions().await?;

    println!("Backend:      {}", backend.backend_name());
    println!("Payload zone: {}", domain);
    println!("Interactions: {}", interactions.len());
    if args.list {
        for interaction in &interactions {
            println!("  {}", interaction);
        }
    }
    Ok(())
}

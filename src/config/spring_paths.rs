use std::path::Path;
use crate::errors::ScanError;
use crate::scanners::payloads::DEFAULT_SPRING_PATHS;
use tracing::{debug, info};

/// Load the Spring probe path list, writing the default list first when the
/// file is missing or empty.
pub async fn load_spring_paths(path: &Path) -> Result<Vec<String>, ScanError> {
    let empty = match tokio::fs::metadata(path).await {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    if empty {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = DEFAULT_SPRING_PATHS.join("\n") + "\n";
        tokio::fs::write(path, content).await?;
        info!(path = %path.display(), count = DEFAULT_SPRING_PATHS.len(), "Created default Spring path list");
    }

    let content = tokio::fs::read_to_string(path).await?;
    let paths = parse_spring_paths(&content);
    debug!(path = %path.display(), count = paths.len(), "Loaded Spring path list");
    Ok(paths)
}

pub fn parse_spring_paths(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

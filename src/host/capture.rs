use std::path::Path;
use crate::errors::ScanError;
use super::types::HttpRequest;
use tracing::info;

/// Load captured requests from a JSON Lines file, one request per line.
/// Blank lines and `#` comments are skipped.
pub async fn load_captured_requests(path: &Path) -> Result<Vec<HttpRequest>, ScanError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        ScanError::Config(format!("Cannot read capture file {}: {}", path.display(), e))
    })?;
    let requests = parse_captured_requests(&content)?;
    info!(path = %path.display(), count = requests.len(), "Loaded captured requests");
    Ok(requests)
}

pub fn parse_captured_requests(content: &str) -> Result<Vec<HttpRequest>, ScanError> {
    let mut requests = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let request: HttpRequest = serde_json::from_str(line).map_err(|e| {
            ScanError::Config(format!("Capture line {} is not a valid request: {}", idx + 1, e))
        })?;
        requests.push(request);
    }
    Ok(requests)
}

use async_trait::async_trait;
use crate::errors::ScanError;

/// An out-of-band interaction backend.
#[async_trait]
pub trait OastBackend: Send + Sync {
    /// Every interaction the backend currently holds, reduced to its
    /// lowercase query/name text.
    async fn fetch_all_interactions(&self) -> Result<Vec<String>, ScanError>;

    /// Domain that probe payloads call back to.
    fn payload_domain(&self) -> Result<String, ScanError>;

    /// Backend name for logging
    fn backend_name(&self) -> &str;
}

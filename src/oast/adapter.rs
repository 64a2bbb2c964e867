use std::sync::Arc;
use std::time::Duration;
use crate::errors::ScanError;
use super::provider::OastBackend;
use tracing::{debug, error, warn};

/// Boundary between the confirmation core and a backend. Nothing past this
/// point sees a backend error: failures become an empty result and a log line.
#[derive(Clone)]
pub struct BackendAdapter {
    backend: Arc<dyn OastBackend>,
    timeout: Duration,
}

impl BackendAdapter {
    pub fn new(backend: Arc<dyn OastBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    pub async fn fetch_all(&self) -> Vec<String> {
        let backend = self.backend.backend_name();
        let result = match tokio::time::timeout(self.timeout, self.backend.fetch_all_interactions()).await {
            Ok(result) => result,
            Err(_) => Err(ScanError::Timeout(format!(
                "{} did not answer within {:?}",
                backend, self.timeout
            ))),
        };

        match result {
            Ok(interactions) => {
                debug!(backend, count = interactions.len(), "Fetched interactions");
                interactions
            }
            Err(e) => {
                let class = e.classify();
                if class.transient {
                    warn!(backend, error_type = class.error_type, error = %e, "Interaction fetch failed");
                } else {
                    error!(backend, error_type = class.error_type, error = %e, "Interaction fetch failed");
                }
                Vec::new()
            }
        }
    }

    pub fn payload_domain(&self) -> Result<String, ScanError> {
        self.backend.payload_domain()
    }
}

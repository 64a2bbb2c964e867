use std::sync::Arc;
use std::time::Duration;
use crate::config::{OastPlatform, ScanConfig};
use crate::errors::ScanError;
use super::ceye::CeyeBackend;
use super::collaborator::{CollaboratorBackend, CollaboratorProvider};
use super::provider::OastBackend;

/// Build the backend selected in the configuration. The collaboration
/// backend needs a client factory from the embedding host.
pub fn create_backend(
    config: &ScanConfig,
    collaborator: Option<Arc<dyn CollaboratorProvider>>,
) -> Result<Arc<dyn OastBackend>, ScanError> {
    match config.dnslog_type {
        OastPlatform::Ceye => {
            let backend = CeyeBackend::new(
                &config.ceye_api_key,
                &config.ceye_api_domain,
                &config.ceye_base_url,
                Duration::from_secs(config.backend_timeout_secs),
            )?
            .with_filter(config.ceye_filter.trim());
            Ok(Arc::new(backend))
        }
        OastPlatform::Collaborator => match collaborator {
            Some(provider) => Ok(Arc::new(CollaboratorBackend::new(provider))),
            None => Err(ScanError::Config(
                "Collaborator backend selected but no collaborator client is available; \
                 set dnslogType to CEYE"
                    .into(),
            )),
        },
    }
}

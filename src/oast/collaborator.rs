use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};
use crate::errors::ScanError;
use super::provider::OastBackend;
use tracing::info;

pub const COLLABORATOR_SUFFIX: &str = "oastify.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionType {
    Dns,
    Http,
    Smtp,
}

#[derive(Debug, Clone)]
pub struct Interaction {
    pub kind: InteractionType,
    /// Query name for DNS interactions.
    pub dns_query: Option<String>,
}

/// A collaboration-service client owned by the embedding host.
#[async_trait]
pub trait CollaboratorClient: Send + Sync {
    /// Mint a new payload label tied to this client.
    fn generate_payload(&self) -> Result<String, ScanError>;

    /// Every interaction seen since the client was created.
    async fn all_interactions(&self) -> Result<Vec<Interaction>, ScanError>;
}

/// Host hook that creates collaboration clients.
pub trait CollaboratorProvider: Send + Sync {
    fn create_client(&self) -> Result<Arc<dyn CollaboratorClient>, ScanError>;
}

struct CollaboratorSession {
    address: String,
    client: Arc<dyn CollaboratorClient>,
}

/// Managed interaction-collection backend. The client and the address minted
/// from it are created on first use and kept for the life of the process.
pub struct CollaboratorBackend {
    provider: Arc<dyn CollaboratorProvider>,
    session: RwLock<Option<CollaboratorSession>>,
}

impl CollaboratorBackend {
    pub fn new(provider: Arc<dyn CollaboratorProvider>) -> Self {
        Self {
            provider,
            session: RwLock::new(None),
        }
    }

    /// Address minted so far, if any.
    pub fn address(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.address.clone())
    }

    fn client(&self) -> Option<Arc<dyn CollaboratorClient>> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.client.clone())
    }
}

#[async_trait]
impl OastBackend for CollaboratorBackend {
    async fn fetch_all_interactions(&self) -> Result<Vec<String>, ScanError> {
        let Some(client) = self.client() else {
            return Err(ScanError::Config("Collaborator client has not been created yet".into()));
        };
        let interactions = client.all_interactions().await?;
        Ok(interactions
            .into_iter()
            .filter(|i| i.kind == InteractionType::Dns)
            .filter_map(|i| i.dns_query)
            .map(|q| q.to_ascii_lowercase())
            .collect())
    }

    fn payload_domain(&self) -> Result<String, ScanError> {
        if let Some(address) = self.address() {
            return Ok(address);
        }
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = session.as_ref() {
            return Ok(existing.address.clone());
        }
        let client = self.provider.create_client()?;
        let payload = client.generate_payload()?;
        let address = format!("{}.{}", payload.trim_end_matches('.'), COLLABORATOR_SUFFIX).to_ascii_lowercase();
        info!(address = %address, "Collaborator address created");
        *session = Some(CollaboratorSession {
            address: address.clone(),
            client,
        });
        Ok(address)
    }

    fn backend_name(&self) -> &str {
        "collaborator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient;

    #[async_trait]
    impl CollaboratorClient for FakeClient {
        fn generate_payload(&self) -> Result<String, ScanError> {
            Ok("Q7x9k2".into())
        }

        async fn all_interactions(&self) -> Result<Vec<Interaction>, ScanError> {
            Ok(vec![
                Interaction { kind: InteractionType::Dns, dns_query: Some("0ABC.q7x9k2.oastify.com".into()) },
                Interaction { kind: InteractionType::Http, dns_query: None },
                Interaction { kind: InteractionType::Dns, dns_query: None },
                Interaction { kind: InteractionType::Smtp, dns_query: Some("mail.q7x9k2.oastify.com".into()) },
            ])
        }
    }

    #[derive(Default)]
    struct FakeProvider {
        created: AtomicUsize,
    }

    impl CollaboratorProvider for FakeProvider {
        fn create_client(&self) -> Result<Arc<dyn CollaboratorClient>, ScanError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(FakeClient))
        }
    }

    #[tokio::test]
    async fn test_fetch_before_address_is_config_error() {
        let backend = CollaboratorBackend::new(Arc::new(FakeProvider::default()));
        let err = backend.fetch_all_interactions().await.unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }

    #[tokio::test]
    async fn test_address_minted_once() {
        let provider = Arc::new(FakeProvider::default());
        let backend = CollaboratorBackend::new(provider.clone());
        assert_eq!(backend.payload_domain().unwrap(), "q7x9k2.oastify.com");
        assert_eq!(backend.payload_domain().unwrap(), "q7x9k2.oastify.com");
        assert_eq!(provider.created.load(Ordering::SeqCst), 1);
        assert_eq!(backend.address().as_deref(), Some("q7x9k2.oastify.com"));
    }

    #[tokio::test]
    async fn test_only_dns_queries_returned() {
        let backend = CollaboratorBackend::new(Arc::new(FakeProvider::default()));
        backend.payload_domain().unwrap();
        let names = backend.fetch_all_interactions().await.unwrap();
        assert_eq!(names, vec!["0abc.q7x9k2.oastify.com"]);
    }
}

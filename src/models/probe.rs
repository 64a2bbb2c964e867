use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use crate::host::HttpExchange;
use super::finding::VulnKind;

/// Opaque identifier minted once per scan invocation and embedded in every
/// payload domain of that invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(String);

impl ProbeId {
    /// 128 random bits as 32 lowercase hex characters, safe inside a DNS label.
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProbeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProbeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Reference to an already-sent probe, tagged with the scanner that sent it.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    pub kind: VulnKind,
    pub exchange: Arc<HttpExchange>,
}

impl RequestHandle {
    pub fn new(kind: VulnKind, exchange: HttpExchange) -> Self {
        Self { kind, exchange: Arc::new(exchange) }
    }
}

/// A probe whose identifier showed up in the OAST backend's interaction log.
#[derive(Debug, Clone)]
pub struct ConfirmedHit<H = RequestHandle> {
    pub probe_id: ProbeId,
    pub handle: H,
    pub interaction: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mint_is_dns_safe() {
        let id = ProbeId::mint();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_mint_is_unique() {
        let ids: HashSet<ProbeId> = (0..10_000).map(|_| ProbeId::mint()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = ProbeId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::utils::truncation::truncate_evidence;
use super::probe::{ConfirmedHit, RequestHandle};

/// Severity level for a security finding, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Returns a numeric rank where lower values indicate higher severity.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 0,
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
            Severity::Info => 4,
        }
    }
}

/// Vulnerability class a scanner probes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnKind {
    #[serde(rename = "fastjson")]
    FastJson,
    Log4j,
    SpringUnauth,
}

impl VulnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VulnKind::FastJson => "fastjson",
            VulnKind::Log4j => "log4j",
            VulnKind::SpringUnauth => "spring",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            VulnKind::FastJson => "FastJson deserialization (DNS callback)",
            VulnKind::Log4j => "Log4j JNDI injection (DNS callback)",
            VulnKind::SpringUnauth => "Unauthenticated Spring/Swagger endpoint",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            VulnKind::FastJson | VulnKind::Log4j => Severity::Critical,
            VulnKind::SpringUnauth => Severity::Medium,
        }
    }
}

impl std::fmt::Display for VulnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A confirmed vulnerability observation, one per originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub kind: VulnKind,
    pub severity: Severity,
    pub method: String,
    pub url: String,
    pub status: Option<u16>,
    /// Interaction string for OAST findings, response excerpt for Spring.
    pub evidence: String,
    pub probe_id: Option<String>,
    pub discovered_at: DateTime<Utc>,
    #[serde(skip)]
    pub exchange: Option<RequestHandle>,
}

impl Finding {
    pub fn from_hit(hit: &ConfirmedHit) -> Self {
        let exchange = &hit.handle.exchange;
        Self {
            title: hit.handle.kind.title().to_string(),
            kind: hit.handle.kind,
            severity: hit.handle.kind.severity(),
            method: exchange.request.method.clone(),
            url: exchange.request.url.clone(),
            status: exchange.status(),
            evidence: truncate_evidence(&hit.interaction),
            probe_id: Some(hit.probe_id.to_string()),
            discovered_at: Utc::now(),
            exchange: Some(hit.handle.clone()),
        }
    }

    /// Finding for a probe path that answered without authentication.
    pub fn unauthenticated(handle: &RequestHandle) -> Self {
        let exchange = &handle.exchange;
        let excerpt = exchange
            .response
            .as_ref()
            .map(|r| truncate_evidence(&r.body))
            .unwrap_or_default();
        Self {
            title: VulnKind::SpringUnauth.title().to_string(),
            kind: VulnKind::SpringUnauth,
            severity: VulnKind::SpringUnauth.severity(),
            method: exchange.request.method.clone(),
            url: exchange.request.url.clone(),
            status: exchange.status(),
            evidence: excerpt,
            probe_id: None,
            discovered_at: Utc::now(),
            exchange: Some(handle.clone()),
        }
    }
}

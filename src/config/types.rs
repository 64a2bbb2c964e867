use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persisted scanner configuration.
///
/// Keys are camelCase so an existing `dnslog_config.json` written by earlier
/// releases loads unchanged. Every field has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    #[serde(alias = "donlogType")]
    pub dnslog_type: OastPlatform,
    pub ceye_api_key: String,
    pub ceye_api_domain: String,
    pub ceye_base_url: String,
    /// Sent as `filter=` on CEYE polls when non-empty.
    pub ceye_filter: String,
    pub collaborator_domain: String,
    pub target_domain: String,
    pub fast_json_scan_enabled: bool,
    pub log4j_scan_enabled: bool,
    pub spring_scan_enabled: bool,
    pub log_enabled: bool,
    pub log_path: String,
    pub log_retention_days: u32,
    pub filter_extensions: String,
    pub filter_keywords: String,
    pub spring_scan_keywords: String,
    pub spring_scan_file_path: String,
    /// Payloads go into parameters verbatim instead of percent-encoded.
    pub crypto_enabled: bool,
    pub probe_timeout_secs: u64,
    pub backend_timeout_secs: u64,
    pub executor: ExecutorSettings,
    pub confirmation: ConfirmationSettings,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let burp_dir = burp_dir();
        Self {
            dnslog_type: OastPlatform::default(),
            ceye_api_key: String::new(),
            ceye_api_domain: String::new(),
            ceye_base_url: "http://api.ceye.io".to_string(),
            ceye_filter: String::new(),
            collaborator_domain: String::new(),
            target_domain: String::new(),
            fast_json_scan_enabled: true,
            log4j_scan_enabled: true,
            spring_scan_enabled: true,
            log_enabled: true,
            log_path: burp_dir.join("jaysenscanlog").to_string_lossy().into_owned(),
            log_retention_days: 7,
            filter_extensions: "js,css,png,jpg,jpeg,pdf,gif,ico,svg,doc,docx,xls,xlsx".to_string(),
            filter_keywords: "static,assets,images,fonts,download,upload".to_string(),
            spring_scan_keywords: "api,rest,service,webapi,backend,server,v1,v2,v3".to_string(),
            spring_scan_file_path: burp_dir.join("springapiscan.txt").to_string_lossy().into_owned(),
            crypto_enabled: false,
            probe_timeout_secs: 10,
            backend_timeout_secs: 5,
            executor: ExecutorSettings::default(),
            confirmation: ConfirmationSettings::default(),
        }
    }
}

/// Which out-of-band backend confirms probes.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum OastPlatform {
    #[serde(rename = "CEYE", alias = "ceye")]
    Ceye,
    #[default]
    #[serde(rename = "COLLABORATOR", alias = "collaborator")]
    Collaborator,
}

impl OastPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ceye => "ceye",
            Self::Collaborator => "collaborator",
        }
    }
}

impl std::fmt::Display for OastPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorSettings {
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub keep_alive_secs: u64,
    pub queue_capacity: usize,
    /// Probe requests per second across all scanners. Non-positive disables the limit.
    pub qps: f64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            core_pool_size: 28,
            max_pool_size: 112,
            keep_alive_secs: 60,
            queue_capacity: 2000,
            qps: 500.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfirmationSettings {
    pub initial_delay_secs: u64,
    pub period_secs: u64,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: 60,
            period_secs: 60,
        }
    }
}

/// `~/.burp`, or the working directory when no home directory can be resolved.
pub fn burp_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".burp"))
        .unwrap_or_else(|| PathBuf::from(".burp"))
}

/// Well-known location of the persisted configuration document.
pub fn default_config_path() -> PathBuf {
    burp_dir().join("dnslog_config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_sizing() {
        let config = ScanConfig::default();
        assert_eq!(config.executor.core_pool_size, 28);
        assert_eq!(config.executor.max_pool_size, 112);
        assert_eq!(config.executor.queue_capacity, 2000);
        assert_eq!(config.confirmation.initial_delay_secs, 60);
        assert_eq!(config.confirmation.period_secs, 60);
        assert_eq!(config.dnslog_type, OastPlatform::Collaborator);
    }

    #[test]
    fn test_legacy_document_loads() {
        let json = r#"{
            "platform": "collaborator",
            "ceyeApiKey": "k3y",
            "ceyeApiDomain": "abc123.ceye.io",
            "donlogType": "CEYE",
            "fastJsonScanEnabled": false,
            "logRetentionDays": 3
        }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dnslog_type, OastPlatform::Ceye);
        assert_eq!(config.ceye_api_key, "k3y");
        assert_eq!(config.ceye_api_domain, "abc123.ceye.io");
        assert!(!config.fast_json_scan_enabled);
        assert!(config.log4j_scan_enabled);
        assert_eq!(config.log_retention_days, 3);
        assert_eq!(config.ceye_base_url, "http://api.ceye.io");
    }

    #[test]
    fn test_platform_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&OastPlatform::Ceye).unwrap(), "\"CEYE\"");
        let parsed: OastPlatform = serde_json::from_str("\"collaborator\"").unwrap();
        assert_eq!(parsed, OastPlatform::Collaborator);
    }

    #[test]
    fn test_partial_executor_block_keeps_defaults() {
        let config: ScanConfig =
            serde_json::from_str(r#"{"executor": {"qps": 2.5}}"#).unwrap();
        assert_eq!(config.executor.qps, 2.5);
        assert_eq!(config.executor.core_pool_size, 28);
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(format!("{}", OastPlatform::Ceye), "ceye");
        assert_eq!(format!("{}", OastPlatform::Collaborator), "collaborator");
    }
}

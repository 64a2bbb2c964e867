use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;
use crate::config::security::{redact_credentials, resolve_credential};
use crate::errors::ScanError;
use super::provider::OastBackend;
use tracing::debug;

/// Polling backend for the ceye.io records API.
pub struct CeyeBackend {
    client: Client,
    api_key: String,
    api_domain: String,
    base_url: String,
    filter: Option<String>,
}

impl CeyeBackend {
    pub fn new(api_key: &str, api_domain: &str, base_url: &str, timeout: Duration) -> Result<Self, ScanError> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ScanError::Internal(format!("Failed to build CEYE client: {}", e)))?;
        Ok(Self {
            client,
            api_key: resolve_credential(api_key.trim()),
            api_domain: api_domain.trim().trim_start_matches('.').to_ascii_lowercase(),
            base_url: base_url.trim_end_matches('/').to_string(),
            filter: None,
        })
    }

    /// Only return records whose name contains `keyword`.
    pub fn with_filter(mut self, keyword: impl Into<String>) -> Self {
        let keyword = keyword.into();
        self.filter = (!keyword.is_empty()).then_some(keyword);
        self
    }

    fn records_url(&self) -> Result<Url, ScanError> {
        let mut params = vec![("token", self.api_key.as_str()), ("type", "dns")];
        if let Some(filter) = &self.filter {
            params.push(("filter", filter.as_str()));
        }
        Ok(Url::parse_with_params(&format!("{}/v1/records", self.base_url), &params)?)
    }
}

#[async_trait]
impl OastBackend for CeyeBackend {
    async fn fetch_all_interactions(&self) -> Result<Vec<String>, ScanError> {
        if self.api_key.is_empty() || self.api_key.starts_with('$') {
            return Err(ScanError::Config("CEYE API key is not configured".into()));
        }
        let url = self.records_url()?;
        let shown = redact_credentials(url.as_str(), &[&self.api_key]);
        debug!(url = %shown, "Polling CEYE records");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ScanError::Authentication(format!("CEYE rejected the API key ({})", status)));
        }
        if status != StatusCode::OK {
            return Err(ScanError::Backend(format!("CEYE returned status {}", status)));
        }

        let body = resp.text().await?;
        parse_records(&body)
    }

    fn payload_domain(&self) -> Result<String, ScanError> {
        if self.api_domain.is_empty() {
            return Err(ScanError::Config("CEYE API domain is not configured".into()));
        }
        Ok(self.api_domain.clone())
    }

    fn backend_name(&self) -> &str {
        "ceye"
    }
}

/// Extract `data[].name` from a records response. A response without `data`
/// holds no records.
pub fn parse_records(body: &str) -> Result<Vec<String>, ScanError> {
    let json: Value = serde_json::from_str(body)?;
    let Some(data) = json.get("data") else {
        return Ok(Vec::new());
    };
    let Some(records) = data.as_array() else {
        return Err(ScanError::Backend("CEYE `data` field is not a list".into()));
    };
    Ok(records
        .iter()
        .filter_map(|record| record.get("name").and_then(Value::as_str))
        .map(str::to_ascii_lowercase)
        .collect())
}

use async_trait::async_trait;
use reqwest::{redirect, Client, Method};
use std::time::Duration;
use tracing::debug;
use crate::errors::ScanError;
use super::types::{HttpExchange, HttpHeader, HttpRequest, HttpResponse};

/// Sends a (possibly modified) request on behalf of a scanner.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpExchange, ScanError>;
}

/// Headers reqwest derives from the request itself.
const MANAGED_HEADERS: &[&str] = &["host", "content-length"];

pub struct ReqwestSender {
    client: Client,
}

impl ReqwestSender {
    pub fn new(timeout: Duration) -> Result<Self, ScanError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ScanError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSender for ReqwestSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpExchange, ScanError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| ScanError::InvalidRequest(format!("Bad HTTP method: {}", request.method)))?;
        let url = request.parsed_url()?;

        let mut builder = self.client.request(method, url);
        for header in &request.headers {
            if MANAGED_HEADERS.iter().any(|m| header.name.eq_ignore_ascii_case(m)) {
                continue;
            }
            builder = builder.header(header.name.as_str(), header.value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(name, value)| {
                HttpHeader::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
            })
            .collect();
        let body = resp.text().await.unwrap_or_default();
        debug!(url = %request.url, status, "Probe response received");

        Ok(HttpExchange {
            request,
            response: Some(HttpResponse { status, headers, body }),
        })
    }
}

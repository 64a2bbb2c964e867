use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use crate::errors::ScanError;
use crate::host::HttpExchange;

/// Bodies longer than this are stored gzip-compressed and base64-encoded.
pub const INLINE_BODY_LIMIT: usize = 1024;
const COMPRESSED_MARKER: &str = "gzip:";

/// Request headers worth keeping, matched as substrings of the lowercase name.
const KEPT_HEADERS: &[&str] = &["host", "cookie", "content-type", "user-agent"];

/// One archived probe, written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub method: String,
    pub url: String,
    /// Unix milliseconds.
    pub timestamp: i64,
    pub req_headers: BTreeMap<String, String>,
    pub req_body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resp_body: Option<String>,
}

impl ArchiveRecord {
    pub fn from_exchange(exchange: &HttpExchange) -> Self {
        let request = &exchange.request;
        let req_headers = request
            .headers
            .iter()
            .filter(|h| {
                let name = h.name.to_ascii_lowercase();
                KEPT_HEADERS.iter().any(|kept| name.contains(kept))
            })
            .map(|h| (h.name.clone(), h.value.clone()))
            .collect();

        Self {
            method: request.method.clone(),
            url: request.url.clone(),
            timestamp: Utc::now().timestamp_millis(),
            req_headers,
            req_body: compress_if_large(&request.body),
            resp_status: exchange.response.as_ref().map(|r| r.status),
            resp_body: exchange.response.as_ref().map(|r| compress_if_large(&r.body)),
        }
    }
}

pub fn compress_if_large(content: &str) -> String {
    if content.chars().count() <= INLINE_BODY_LIMIT {
        return content.to_string();
    }
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder
        .write_all(content.as_bytes())
        .and_then(|_| encoder.finish());
    match compressed {
        Ok(bytes) => format!("{}{}", COMPRESSED_MARKER, STANDARD.encode(bytes)),
        Err(_) => content.to_string(),
    }
}

/// Inverse of [`compress_if_large`].
pub fn expand_body(stored: &str) -> Result<String, ScanError> {
    let Some(encoded) = stored.strip_prefix(COMPRESSED_MARKER) else {
        return Ok(stored.to_string());
    };
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| ScanError::Archive(format!("Bad base64 body: {}", e)))?;
    let mut decoded = String::new();
    GzDecoder::new(bytes.as_slice()).read_to_string(&mut decoded)?;
    Ok(decoded)
}

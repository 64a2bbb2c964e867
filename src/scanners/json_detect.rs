use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::form_urlencoded;
use crate::host::HttpRequest;

static JNDI_LOOKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$\{.*j.*n.*d.*i.*:").unwrap());

/// Where a JSON document was found in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonSource {
    Body,
    /// Query parameter, by raw name.
    Query(String),
    /// Url-encoded form field, by raw name.
    Form(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonField {
    pub source: JsonSource,
    pub raw: String,
}

/// Every place in the request that carries a JSON object or array.
pub fn find_json_fields(request: &HttpRequest) -> Vec<JsonField> {
    let mut fields = Vec::new();

    if is_candidate(&request.body) {
        fields.push(JsonField {
            source: JsonSource::Body,
            raw: request.body.clone(),
        });
    }

    for (name, value) in request.query_pairs() {
        if is_candidate(&value) {
            fields.push(JsonField { source: JsonSource::Query(name), raw: value });
        }
    }

    for (name, value) in request.form_pairs() {
        if is_candidate(&value) {
            fields.push(JsonField { source: JsonSource::Form(name), raw: value });
        }
    }

    fields
}

fn is_candidate(value: &str) -> bool {
    is_json_value(value) && !looks_like_jndi(value)
}

/// A JSON object or array, either as-is or after percent-decoding.
pub fn is_json_value(value: &str) -> bool {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return false;
    }
    if parses_as_container(trimmed) {
        return true;
    }
    let decoded = decode_component(trimmed);
    decoded != trimmed && parses_as_container(decoded.trim())
}

fn parses_as_container(text: &str) -> bool {
    matches!(
        serde_json::from_str::<Value>(text),
        Ok(Value::Object(_)) | Ok(Value::Array(_))
    )
}

/// Already a JNDI lookup, raw or encoded. Such values are our own probes
/// echoed back and are never probed again.
pub fn looks_like_jndi(value: &str) -> bool {
    JNDI_LOOKUP.is_match(value) || JNDI_LOOKUP.is_match(&decode_component(value))
}

/// Percent-decode one url component, `+` meaning space.
pub fn decode_component(raw: &str) -> String {
    let escaped = raw.replace('&', "%26").replace('=', "%3D");
    form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

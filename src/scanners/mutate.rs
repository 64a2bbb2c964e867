use serde_json::Value;
use url::form_urlencoded;
use crate::host::{HttpRequest, ParamSelector};
use super::json_detect::{JsonField, JsonSource};

/// Headers the Log4j scanner leaves alone so the probe still reaches the
/// same handler.
pub const RESERVED_HEADERS: &[&str] = &[
    "Host",
    "Content-Length",
    "Content-Type",
    "Connection",
    "Accept",
    "Accept-Encoding",
    "Accept-Language",
    "Transfer-Encoding",
    "Content-Encoding",
    "Content-Language",
];

/// Payload as it goes into a url or form parameter: percent-encoded with
/// spaces as `%20`, or verbatim when an encryption layer rewrites the
/// parameters downstream.
pub fn encode_param(payload: &str, verbatim: bool) -> String {
    if verbatim {
        return payload.to_string();
    }
    form_urlencoded::byte_serialize(payload.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Replace one detected JSON document with a FastJson payload.
pub fn fastjson_variant(request: &HttpRequest, field: &JsonField, payload: &str, verbatim: bool) -> HttpRequest {
    match &field.source {
        JsonSource::Body => request.clone().with_body(payload),
        JsonSource::Query(name) => {
            request.with_query_value(ParamSelector::Named(name), &encode_param(payload, verbatim))
        }
        JsonSource::Form(name) => {
            request.with_form_value(ParamSelector::Named(name), &encode_param(payload, verbatim))
        }
    }
}

/// Put a Log4j payload into every non-reserved header, every url and form
/// parameter and every leaf value of a JSON body.
pub fn log4j_variant(request: &HttpRequest, payload: &str, verbatim: bool) -> HttpRequest {
    let mut next = request.clone();
    for header in next.headers.iter_mut() {
        if !RESERVED_HEADERS.iter().any(|r| header.name.eq_ignore_ascii_case(r)) {
            header.value = payload.to_string();
        }
    }
    if let Some(body) = replace_json_leaves(&next.body, payload) {
        next.body = body;
    }
    let encoded = encode_param(payload, verbatim);
    next.with_query_value(ParamSelector::All, &encoded)
        .with_form_value(ParamSelector::All, &encoded)
}

/// `None` unless the body is a JSON object or array. Keys are kept; every
/// scalar becomes the payload string.
fn replace_json_leaves(body: &str, payload: &str) -> Option<String> {
    let mut doc: Value = serde_json::from_str(body.trim()).ok()?;
    if !(doc.is_object() || doc.is_array()) {
        return None;
    }
    set_leaves(&mut doc, payload);
    serde_json::to_string(&doc).ok()
}

fn set_leaves(value: &mut Value, payload: &str) {
    match value {
        Value::Object(map) => map.values_mut().for_each(|v| set_leaves(v, payload)),
        Value::Array(items) => items.iter_mut().for_each(|v| set_leaves(v, payload)),
        leaf => *leaf = Value::String(payload.to_string()),
    }
}

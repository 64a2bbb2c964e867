use serde::{Deserialize, Serialize};
use url::Url;
use crate::errors::ScanError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpHeader {
    pub name: String,
    pub value: String,
}

impl HttpHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// An HTTP request as seen by the interception boundary.
///
/// The URL is kept as text so probe mutation never re-encodes parts of the
/// request it did not touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Vec<HttpHeader>,
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Which parameters a value replacement applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSelector<'a> {
    Named(&'a str),
    All,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Case-insensitive header lookup; the first match wins.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Replace every header with this name, or append it when absent.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        let mut found = false;
        for header in self.headers.iter_mut().filter(|h| h.name.eq_ignore_ascii_case(name)) {
            header.value = value.clone();
            found = true;
        }
        if !found {
            self.headers.push(HttpHeader::new(name, value));
        }
        self
    }

    /// Append a header, keeping any existing ones with the same name.
    pub fn with_added_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push(HttpHeader::new(name, value));
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn parsed_url(&self) -> Result<Url, ScanError> {
        Ok(Url::parse(&self.url)?)
    }

    pub fn host(&self) -> Option<String> {
        self.parsed_url().ok()?.host_str().map(|h| h.to_ascii_lowercase())
    }

    pub fn path(&self) -> String {
        self.parsed_url()
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| "/".to_string())
    }

    /// Point the request at another path on the same origin. The query and
    /// fragment are dropped.
    pub fn with_path(&self, path: &str) -> Result<Self, ScanError> {
        let mut url = self.parsed_url()?;
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        let mut next = self.clone();
        next.url = url.to_string();
        Ok(next)
    }

    pub fn is_form(&self) -> bool {
        self.header_value("Content-Type")
            .map(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false)
    }

    /// Raw (still percent-encoded) query parameters in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let (_, query, _) = split_url(&self.url);
        query.map(split_pairs).unwrap_or_default()
    }

    /// Raw form fields, empty unless the body is url-encoded.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        if !self.is_form() {
            return Vec::new();
        }
        split_pairs(&self.body)
    }

    /// Set query parameter values. `value` is inserted verbatim.
    pub fn with_query_value(&self, selector: ParamSelector<'_>, value: &str) -> Self {
        let (base, query, fragment) = split_url(&self.url);
        let Some(query) = query else {
            return self.clone();
        };
        let mut url = format!("{}?{}", base, replace_pairs(query, selector, value));
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }
        let mut next = self.clone();
        next.url = url;
        next
    }

    /// Set url-encoded form field values. `value` is inserted verbatim.
    pub fn with_form_value(&self, selector: ParamSelector<'_>, value: &str) -> Self {
        if !self.is_form() {
            return self.clone();
        }
        let mut next = self.clone();
        next.body = replace_pairs(&self.body, selector, value);
        next
    }
}

fn split_url(url: &str) -> (&str, Option<&str>, Option<&str>) {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };
    match rest.split_once('?') {
        Some((base, query)) => (base, Some(query), fragment),
        None => (rest, None, fragment),
    }
}

fn split_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (part.to_string(), String::new()),
        })
        .collect()
}

fn replace_pairs(raw: &str, selector: ParamSelector<'_>, value: &str) -> String {
    raw.split('&')
        .map(|part| {
            if part.is_empty() {
                return part.to_string();
            }
            let key = part.split_once('=').map(|(k, _)| k).unwrap_or(part);
            let selected = match selector {
                ParamSelector::All => true,
                ParamSelector::Named(name) => key == name,
            };
            if selected {
                format!("{}={}", key, value)
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<HttpHeader>,
    #[serde(default)]
    pub body: String,
}

/// A sent request and, when the send completed, its response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpExchange {
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
}

impl HttpExchange {
    pub fn unanswered(request: HttpRequest) -> Self {
        Self { request, response: None }
    }

    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

use dashmap::DashSet;
use std::sync::Arc;
use url::Url;
use crate::config::ScanConfig;
use crate::host::HttpRequest;
use crate::models::VulnKind;
use crate::oast::BackendAdapter;
use super::json_detect::find_json_fields;
use super::{fastjson, log4j, spring, ProbeContext, UrlFilter, PROBE_MARKER_HEADER};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct ScannerToggles {
    pub fastjson: bool,
    pub log4j: bool,
    pub spring: bool,
}

impl ScannerToggles {
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            fastjson: config.fast_json_scan_enabled,
            log4j: config.log4j_scan_enabled,
            spring: config.spring_scan_enabled,
        }
    }

    fn any(&self) -> bool {
        self.fastjson || self.log4j || self.spring
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ProbeTraffic,
    FilteredUrl,
    OutOfScope,
    AllScannersDisabled,
}

/// What the dispatcher did with one intercepted request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub skipped: Option<SkipReason>,
    pub fastjson_probes: usize,
    pub log4j_probes: usize,
    pub spring_probes: usize,
}

impl DispatchReport {
    fn skipped(reason: SkipReason) -> Self {
        Self { skipped: Some(reason), ..Default::default() }
    }

    pub fn total_probes(&self) -> usize {
        self.fastjson_probes + self.log4j_probes + self.spring_probes
    }
}

/// Traffic-interception callback: decides which scanners see a request and
/// makes sure each scanner sees a given endpoint once per mark window.
pub struct ScanDispatcher {
    ctx: ProbeContext,
    adapter: BackendAdapter,
    filter: UrlFilter,
    toggles: ScannerToggles,
    target_domain: String,
    spring_paths: Arc<Vec<String>>,
    marks: DashSet<String>,
}

impl ScanDispatcher {
    pub fn new(
        ctx: ProbeContext,
        adapter: BackendAdapter,
        filter: UrlFilter,
        toggles: ScannerToggles,
        target_domain: &str,
        spring_paths: Vec<String>,
    ) -> Self {
        Self {
            ctx,
            adapter,
            filter,
            toggles,
            target_domain: target_domain.trim().to_ascii_lowercase(),
            spring_paths: Arc::new(spring_paths),
            marks: DashSet::new(),
        }
    }

    pub async fn handle_request(&self, request: &HttpRequest) -> DispatchReport {
        if request.header_value(PROBE_MARKER_HEADER).is_some() {
            return DispatchReport::skipped(SkipReason::ProbeTraffic);
        }
        if !self.toggles.any() {
            return DispatchReport::skipped(SkipReason::AllScannersDisabled);
        }
        if !self.filter.is_potential_url(&request.url) {
            debug!(url = %request.url, "Filtered out");
            return DispatchReport::skipped(SkipReason::FilteredUrl);
        }
        if !self.in_scope(request) {
            return DispatchReport::skipped(SkipReason::OutOfScope);
        }

        let standard = standardize_url(&request.url);
        let mut report = DispatchReport::default();
        let oast_domain = if self.toggles.fastjson || self.toggles.log4j {
            match self.adapter.payload_domain() {
                Ok(domain) => Some(domain),
                Err(e) => {
                    warn!(backend = self.adapter.backend_name(), error = %e, "No OAST domain, skipping callback scanners");
                    None
                }
            }
        } else {
            None
        };

        if let Some(domain) = &oast_domain {
            if self.toggles.fastjson {
                let fields = find_json_fields(request);
                if !fields.is_empty() && self.mark(VulnKind::FastJson, &standard) {
                    report.fastjson_probes = fastjson::scan(&self.ctx, domain, request, &fields).await;
                }
            }
            if self.toggles.log4j && self.mark(VulnKind::Log4j, &standard) {
                report.log4j_probes = log4j::scan(&self.ctx, domain, request).await;
            }
        }

        if self.toggles.spring
            && self.filter.is_potential_api_url(&request.url)
            && self.mark(VulnKind::SpringUnauth, &standard)
        {
            report.spring_probes = spring::scan(&self.ctx, &self.spring_paths, request).await;
        }

        report
    }

    /// Empty target, `*`, or a host containing the target.
    fn in_scope(&self, request: &HttpRequest) -> bool {
        if self.target_domain.is_empty() || self.target_domain == "*" {
            return true;
        }
        let host = request
            .host()
            .or_else(|| request.header_value("Host").map(|h| h.to_ascii_lowercase()))
            .unwrap_or_default();
        host.contains(&self.target_domain)
    }

    /// True the first time this scanner sees this endpoint.
    fn mark(&self, kind: VulnKind, standard_url: &str) -> bool {
        self.marks.insert(format!("{}_{}", kind.as_str(), standard_url))
    }

    pub fn clear_marks(&self) -> usize {
        let cleared = self.marks.len();
        self.marks.clear();
        debug!(cleared, "Scan marks cleared");
        cleared
    }

    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }
}

/// `scheme://host/path`, lowercase, repeated slashes collapsed, query dropped.
pub fn standardize_url(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return raw.to_string();
    };
    let mut path = String::new();
    for ch in url.path().to_ascii_lowercase().chars() {
        if ch == '/' && path.ends_with('/') {
            continue;
        }
        path.push(ch);
    }
    if path.is_empty() {
        path.push('/');
    }
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default().to_ascii_lowercase(),
        path
    )
}

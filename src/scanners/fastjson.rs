use crate::host::HttpRequest;
use crate::models::{ProbeId, VulnKind};
use super::json_detect::JsonField;
use super::mutate::fastjson_variant;
use super::payloads::{fastjson_payloads, probe_domain, FASTJSON_PREFIX};
use super::ProbeContext;
use tracing::debug;

/// Send every FastJson payload into every detected JSON field, all under one
/// probe identifier.
pub async fn scan(ctx: &ProbeContext, oast_domain: &str, request: &HttpRequest, fields: &[JsonField]) -> usize {
    if fields.is_empty() {
        return 0;
    }
    let probe_id = ProbeId::mint();
    let domain = probe_domain(FASTJSON_PREFIX, &probe_id, oast_domain);
    let payloads = fastjson_payloads(&domain);

    let mut submitted = 0;
    for field in fields {
        for payload in &payloads {
            let probe = fastjson_variant(request, field, payload, ctx.verbatim_params);
            ctx.submit_oast_probe(VulnKind::FastJson, probe_id.clone(), probe).await;
            submitted += 1;
        }
    }
    debug!(probe_id = %probe_id, url = %request.url, fields = fields.len(), submitted, "FastJson probes queued");
    submitted
}

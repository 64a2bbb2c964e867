use crate::host::HttpRequest;
use crate::models::{ProbeId, VulnKind};
use super::mutate::log4j_variant;
use super::payloads::{log4j_payloads, probe_domain, LOG4J_PREFIX};
use super::ProbeContext;
use tracing::debug;

/// One probe per JNDI payload variant, each with the payload in every header
/// and parameter.
pub async fn scan(ctx: &ProbeContext, oast_domain: &str, request: &HttpRequest) -> usize {
    let probe_id = ProbeId::mint();
    let domain = probe_domain(LOG4J_PREFIX, &probe_id, oast_domain);

    let mut submitted = 0;
    for payload in log4j_payloads(&domain) {
        let probe = log4j_variant(request, &payload, ctx.verbatim_params);
        ctx.submit_oast_probe(VulnKind::Log4j, probe_id.clone(), probe).await;
        submitted += 1;
    }
    debug!(probe_id = %probe_id, url = %request.url, submitted, "Log4j probes queued");
    submitted
}

use crate::models::finding::Finding;

/// One-line console rendering of a finding.
pub fn format_finding_line(finding: &Finding) -> String {
    let status = finding
        .status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{:?}] {} {} {} (status {})",
        finding.severity, finding.kind, finding.method, finding.url, status
    )
}

pub fn format_finding_markdown(finding: &Finding) -> String {
    let probe = finding
        .probe_id
        .as_deref()
        .map(|id| format!("**Probe:** `{}`\n", id))
        .unwrap_or_default();
    format!(
        "### {}\n\n**Severity:** {:?}\n**Request:** `{} {}`\n{}\n**Evidence:**\n```\n{}\n```\n",
        finding.title,
        finding.severity,
        finding.method,
        finding.url,
        probe,
        finding.evidence,
    )
}

pub fn format_executive_summary(findings: &[Finding]) -> String {
    let critical = findings.iter().filter(|f| f.severity.rank() == 0).count();
    let high = findings.iter().filter(|f| f.severity.rank() == 1).count();
    let medium = findings.iter().filter(|f| f.severity.rank() == 2).count();
    let low = findings.iter().filter(|f| f.severity.rank() == 3).count();
    let info = findings.iter().filter(|f| f.severity.rank() == 4).count();

    format!(
        "## Summary\n\n| Severity | Count |\n|---|---|\n| Critical | {} |\n| High | {} |\n| Medium | {} |\n| Low | {} |\n| Info | {} |\n| **Total** | **{}** |\n",
        critical, high, medium, low, info, findings.len()
    )
}

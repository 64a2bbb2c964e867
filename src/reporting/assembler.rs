use std::path::Path;
use crate::errors::ScanError;
use crate::models::finding::Finding;
use crate::reporting::formatter::{format_executive_summary, format_finding_markdown};
use crate::utils::fs::atomic_write;
use tracing::info;

/// Write findings as a JSON array, most severe first.
pub async fn write_findings_json(path: &Path, findings: &[Finding]) -> Result<(), ScanError> {
    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by_key(|f| f.severity.rank());
    let json = serde_json::to_string_pretty(&sorted)?;
    atomic_write(path, &json).await?;
    info!(path = %path.display(), count = findings.len(), "Findings written");
    Ok(())
}

pub fn assemble_report(findings: &[Finding]) -> String {
    if findings.is_empty() {
        return "# Scan Report\n\nNo vulnerabilities were confirmed.\n".to_string();
    }
    let mut report = String::new();
    report.push_str("# Scan Report\n\n");
    report.push_str(&format_executive_summary(findings));
    report.push_str("\n\n---\n\n");
    for finding in findings {
        report.push_str(&format_finding_markdown(finding));
        report.push_str("\n---\n\n");
    }
    report
}

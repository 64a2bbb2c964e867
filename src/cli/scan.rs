use std::path::PathBuf;
use std::time::Duration;
use crate::cli::commands::ScanArgs;
use crate::config::{default_config_path, load_or_default};
use crate::correlation::TickOutcome;
use crate::errors::ScanError;
use crate::host::capture::load_captured_requests;
use crate::host::HttpRequest;
use crate::pipeline::ScanEngine;
use crate::reporting::assembler::{assemble_report, write_findings_json};
use crate::reporting::formatter::{format_executive_summary, format_finding_line};
use crate::utils::formatting::format_duration;
use crate::utils::fs::atomic_write;
use tracing::{debug, info, warn};

pub async fn handle_scan(config_path: Option<PathBuf>, args: ScanArgs) -> Result<(), ScanError> {
    let started = std::time::Instant::now();
    let config_path = config_path.unwrap_or_else(default_config_path);
    let config = load_or_default(&config_path).await;

    let requests = match &args.requests {
        Some(path) => load_captured_requests(path).await?,
        None => args.url.iter().map(|url| HttpRequest::new("GET", url.as_str())).collect(),
    };
    if requests.is_empty() {
        return Err(ScanError::Config("No requests to scan".into()));
    }

    let (engine, mut findings_rx) = ScanEngine::from_config(&config, None).await?;
    engine.start();

    let collector = tokio::spawn(async move {
        let mut findings = Vec::new();
        while let Some(finding) = findings_rx.recv().await {
            println!("{}", format_finding_line(&finding));
            findings.push(finding);
        }
        findings
    });

    info!(requests = requests.len(), backend = engine.backend_name(), "Replaying requests");
    let mut probes = 0;
    for request in &requests {
        let report = engine.handle_request(request).await;
        match report.skipped {
            Some(reason) => debug!(url = %request.url, ?reason, "Request skipped"),
            None => probes += report.total_probes(),
        }
    }

    engine.wait_idle().await;
    info!(probes, "All probes sent");
    debug!("{}", engine.status().summary_line());

    if args.settle > 0 {
        info!(secs = args.settle, "Waiting for late callbacks");
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.settle)) => {}
            _ = tokio::signal::ctrl_c() => warn!("Interrupted, checking now"),
        }
    }

    match engine.confirm_now().await {
        TickOutcome::Checked(summary) => {
            info!(checked = summary.checked_ids, hits = summary.hits, "Final confirmation cycle")
        }
        TickOutcome::Idle | TickOutcome::InProgress => debug!("Nothing left to confirm"),
    }

    let clean = engine.shutdown(Duration::from_secs(args.grace)).await;
    if !clean {
        warn!("Shutdown was not clean, some probes or archive records may be missing");
    }
    drop(engine);

    let findings = collector
        .await
        .map_err(|e| ScanError::Internal(format!("Finding collector failed: {}", e)))?;

    if let Some(output) = &args.output {
        write_findings_json(output, &findings).await?;
    }
    if let Some(report) = &args.report {
        atomic_write(report, &assemble_report(&findings)).await?;
        info!(path = %report.display(), "Report written");
    }

    println!("\n{}", format_executive_summary(&findings));
    println!(
        "{} requests, {} probes, {} findings in {}",
        requests.len(),
        probes,
        findings.len(),
        format_duration(started.elapsed().as_millis() as u64)
    );
    Ok(())
}

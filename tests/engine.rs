use async_trait::async_trait;
use oastscan::config::{ExecutorSettings, ScanConfig};
use oastscan::correlation::TickOutcome;
use oastscan::errors::ScanError;
use oastscan::host::{HttpExchange, HttpRequest, HttpResponse, HttpSender};
use oastscan::models::{Finding, VulnKind};
use oastscan::oast::OastBackend;
use oastscan::pipeline::{EngineParts, ScanEngine};
use oastscan::scanners::{SkipReason, PROBE_MARKER_HEADER};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

/// Answers 200 for `/actuator/env` paths and 404 for everything else,
/// remembering every request it sees.
#[derive(Default)]
struct FakeSite {
    sent: Mutex<Vec<HttpRequest>>,
}

#[async_trait]
impl HttpSender for FakeSite {
    async fn send(&self, request: HttpRequest) -> Result<HttpExchange, ScanError> {
        self.sent.lock().unwrap().push(request.clone());
        let status = if request.path().ends_with("/actuator/env") { 200 } else { 404 };
        Ok(HttpExchange {
            request,
            response: Some(HttpResponse { status, headers: vec![], body: String::new() }),
        })
    }
}

/// Reports a DNS lookup for every probe the site received, as if each
/// payload had been resolved.
struct EchoBackend {
    site: Arc<FakeSite>,
}

#[async_trait]
impl OastBackend for EchoBackend {
    async fn fetch_all_interactions(&self) -> Result<Vec<String>, ScanError> {
        let sent = self.site.sent.lock().unwrap();
        Ok(sent
            .iter()
            .map(|r| {
                let headers: Vec<String> = r.headers.iter().map(|h| h.value.clone()).collect();
                format!("{} {} {}", r.url, headers.join(" "), r.body).to_ascii_lowercase()
            })
            .collect())
    }

    fn payload_domain(&self) -> Result<String, ScanError> {
        Ok("x1y2.ceye.io".into())
    }

    fn backend_name(&self) -> &str {
        "echo"
    }
}

fn config(fastjson: bool, log4j: bool, spring: bool) -> ScanConfig {
    ScanConfig {
        fast_json_scan_enabled: fastjson,
        log4j_scan_enabled: log4j,
        spring_scan_enabled: spring,
        log_enabled: false,
        executor: ExecutorSettings {
            core_pool_size: 4,
            max_pool_size: 8,
            keep_alive_secs: 1,
            queue_capacity: 16,
            qps: 0.0,
        },
        ..Default::default()
    }
}

fn engine(config: &ScanConfig, spring_paths: &[&str]) -> (ScanEngine, UnboundedReceiver<Finding>, Arc<FakeSite>) {
    let site = Arc::new(FakeSite::default());
    let parts = EngineParts {
        sender: site.clone(),
        backend: Arc::new(EchoBackend { site: site.clone() }),
        spring_paths: spring_paths.iter().map(|p| p.to_string()).collect(),
        archive: None,
    };
    let (engine, rx) = ScanEngine::assemble(config, parts);
    (engine, rx, site)
}

fn drain(rx: &mut UnboundedReceiver<Finding>) -> Vec<Finding> {
    let mut findings = Vec::new();
    while let Ok(finding) = rx.try_recv() {
        findings.push(finding);
    }
    findings
}

fn json_post() -> HttpRequest {
    HttpRequest::new("POST", "http://shop.test/api/order")
        .with_header("Host", "shop.test")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"sku":"a1","qty":2}"#)
}

#[tokio::test]
async fn fastjson_probes_are_confirmed_out_of_band() {
    let (engine, mut rx, site) = engine(&config(true, false, false), &[]);

    let report = engine.handle_request(&json_post()).await;
    assert_eq!(report.skipped, None);
    assert!(report.fastjson_probes > 0);
    engine.wait_idle().await;

    let status = engine.status();
    assert_eq!(status.pending_ids, 1);
    assert_eq!(status.pending_handles, report.fastjson_probes);
    assert_eq!(site.sent.lock().unwrap().len(), report.fastjson_probes);

    let TickOutcome::Checked(summary) = engine.confirm_now().await else {
        panic!("expected a checked cycle");
    };
    assert_eq!(summary.hit_ids, 1);
    assert_eq!(summary.hits, report.fastjson_probes);

    let findings = drain(&mut rx);
    assert_eq!(findings.len(), report.fastjson_probes);
    assert!(findings.iter().all(|f| f.kind == VulnKind::FastJson && f.probe_id.is_some()));
    assert!(engine.shutdown(Duration::from_secs(5)).await);
}

#[tokio::test]
async fn every_probe_carries_the_marker_and_is_not_rescanned() {
    let (engine, _rx, site) = engine(&config(true, true, false), &[]);
    engine.handle_request(&json_post()).await;
    engine.wait_idle().await;

    let sent = site.sent.lock().unwrap().clone();
    assert!(!sent.is_empty());
    assert!(sent.iter().all(|r| {
        r.headers.iter().filter(|h| h.name == PROBE_MARKER_HEADER).count() == 1
    }));

    let report = engine.handle_request(&sent[0]).await;
    assert_eq!(report.skipped, Some(SkipReason::ProbeTraffic));
}

#[tokio::test]
async fn endpoint_is_scanned_once_per_mark_window() {
    let (engine, _rx, _site) = engine(&config(true, true, false), &[]);
    let first = engine.handle_request(&json_post()).await;
    let second = engine
        .handle_request(&json_post().with_body(r#"{"sku":"b2"}"#))
        .await;

    assert!(first.fastjson_probes > 0 && first.log4j_probes > 0);
    assert_eq!(second.total_probes(), 0);
    assert_eq!(engine.status().scan_marks, 2);
}

#[tokio::test]
async fn out_of_scope_and_static_requests_are_skipped() {
    let mut scoped = config(true, true, true);
    scoped.target_domain = "shop.test".into();
    let (engine, _rx, site) = engine(&scoped, &["/actuator/env"]);

    let other = HttpRequest::new("GET", "http://cdn.other.test/api/x");
    assert_eq!(engine.handle_request(&other).await.skipped, Some(SkipReason::OutOfScope));

    let image = HttpRequest::new("GET", "http://shop.test/logo.png?v=3");
    assert_eq!(engine.handle_request(&image).await.skipped, Some(SkipReason::FilteredUrl));

    let (idle, _rx, _) = self::engine(&config(false, false, false), &[]);
    assert_eq!(
        idle.handle_request(&json_post()).await.skipped,
        Some(SkipReason::AllScannersDisabled)
    );

    engine.wait_idle().await;
    assert!(site.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn spring_exposure_reported_without_callback() {
    let (engine, mut rx, _site) = engine(&config(false, false, true), &["/actuator/env", "/swagger-ui.html"]);

    let report = engine
        .handle_request(&HttpRequest::new("GET", "http://shop.test/api/users"))
        .await;
    assert_eq!(report.spring_probes, 6);
    engine.wait_idle().await;

    let mut urls: Vec<String> = drain(&mut rx).into_iter().map(|f| f.url).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "http://shop.test/actuator/env",
            "http://shop.test/api/actuator/env",
            "http://shop.test/api/users/actuator/env",
        ]
    );
    assert!(engine.status().pending_ids == 0);
    assert_eq!(engine.confirm_now().await, TickOutcome::Idle);
}

#[tokio::test]
async fn shutdown_rejects_late_requests() {
    let (engine, _rx, site) = engine(&config(true, false, false), &[]);
    engine.start();
    assert!(engine.status().running);
    assert!(engine.shutdown(Duration::from_secs(5)).await);
    assert!(!engine.status().running);

    let report = engine.handle_request(&json_post()).await;
    assert!(report.fastjson_probes > 0);
    engine.wait_idle().await;
    assert!(site.sent.lock().unwrap().is_empty());
    assert_eq!(engine.status().executor.rejected as usize, report.fastjson_probes);
}

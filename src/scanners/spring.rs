use std::collections::HashSet;
use crate::host::HttpRequest;
use super::ProbeContext;
use tracing::{debug, warn};

/// Probe each configured path under every ancestor of the request path.
pub async fn scan(ctx: &ProbeContext, spring_paths: &[String], request: &HttpRequest) -> usize {
    let mut submitted = 0;
    for path in candidate_paths(&request.path(), spring_paths) {
        match request.with_path(&path) {
            Ok(probe) => {
                ctx.submit_status_probe(probe).await;
                submitted += 1;
            }
            Err(e) => {
                warn!(url = %request.url, path = %path, error = %e, "Cannot build Spring probe");
            }
        }
    }
    debug!(url = %request.url, submitted, "Spring probes queued");
    submitted
}

/// For `/api/v1/users` and path `actuator`: `/actuator`, `/api/actuator`,
/// `/api/v1/actuator`, `/api/v1/users/actuator`. Duplicates are dropped,
/// first occurrence wins.
pub fn candidate_paths(request_path: &str, spring_paths: &[String]) -> Vec<String> {
    let mut prefixes = vec![String::new()];
    let mut current = String::new();
    for segment in request_path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        prefixes.push(current.clone());
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for prefix in &prefixes {
        for suffix in spring_paths {
            let joined = join_path(prefix, suffix);
            if seen.insert(joined.clone()) {
                candidates.push(joined);
            }
        }
    }
    candidates
}

fn join_path(prefix: &str, suffix: &str) -> String {
    let raw = format!("{}/{}", prefix, suffix);
    let mut joined = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch == '/' && joined.ends_with('/') {
            continue;
        }
        joined.push(ch);
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidates_walk_every_prefix() {
        let got = candidate_paths("/api/v1/users", &paths(&["/actuator"]));
        assert_eq!(got, vec!["/actuator", "/api/actuator", "/api/v1/actuator", "/api/v1/users/actuator"]);
    }

    #[test]
    fn test_single_slashes_and_trailing_slash_kept() {
        let got = candidate_paths("//api//", &paths(&["druid/", "/swagger-ui.html"]));
        assert_eq!(got, vec!["/druid/", "/swagger-ui.html", "/api/druid/", "/api/swagger-ui.html"]);
    }

    #[test]
    fn test_duplicates_dropped() {
        let got = candidate_paths("/", &paths(&["/actuator", "actuator", "//actuator"]));
        assert_eq!(got, vec!["/actuator"]);
    }
}

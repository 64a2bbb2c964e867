use crate::config::ScanConfig;

/// Decides which intercepted URLs are worth probing.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    extensions: Vec<String>,
    exclude_keywords: Vec<String>,
    api_keywords: Vec<String>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

impl UrlFilter {
    pub fn new(extensions: &str, exclude_keywords: &str, api_keywords: &str) -> Self {
        Self {
            extensions: split_list(extensions),
            exclude_keywords: split_list(exclude_keywords),
            api_keywords: split_list(api_keywords),
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.filter_extensions, &config.filter_keywords, &config.spring_scan_keywords)
    }

    /// False for static resources and URLs containing an excluded keyword.
    pub fn is_potential_url(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        let resource = lower
            .split(['?', '#'])
            .next()
            .unwrap_or(lower.as_str());
        if self
            .extensions
            .iter()
            .any(|ext| resource.ends_with(&format!(".{}", ext)))
        {
            return false;
        }
        !self.exclude_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }

    /// True when the URL looks like it belongs to an API service.
    pub fn is_potential_api_url(&self, url: &str) -> bool {
        let lower = url.to_ascii_lowercase();
        self.api_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> UrlFilter {
        UrlFilter::new("js, css ,png,,", "static,logout", "api,v1")
    }

    #[test]
    fn test_static_extension_rejected() {
        let f = filter();
        assert!(!f.is_potential_url("http://a.test/app.JS"));
        assert!(!f.is_potential_url("http://a.test/logo.png?v=3"));
        assert!(f.is_potential_url("http://a.test/json?format=js2"));
    }

    #[test]
    fn test_excluded_keyword_rejected() {
        let f = filter();
        assert!(!f.is_potential_url("http://a.test/static/index"));
        assert!(!f.is_potential_url("http://a.test/user/LOGOUT"));
        assert!(f.is_potential_url("http://a.test/user/profile"));
    }

    #[test]
    fn test_api_keywords() {
        let f = filter();
        assert!(f.is_potential_api_url("http://a.test/API/users"));
        assert!(f.is_potential_api_url("http://a.test/v1/users"));
        assert!(!f.is_potential_api_url("http://a.test/home"));
    }

    #[test]
    fn test_empty_lists_accept_everything_but_apis() {
        let f = UrlFilter::new("", "", "");
        assert!(f.is_potential_url("http://a.test/a.js"));
        assert!(!f.is_potential_api_url("http://a.test/api"));
    }
}

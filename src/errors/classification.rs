use super::types::ScanError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Transient failures are expected to clear up on their own by the next cycle.
    pub transient: bool,
}

impl ScanError {
    /// Classify this error so callers at a component boundary can pick a log level.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Transient errors
            ScanError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                transient: true,
            },
            ScanError::Timeout(_) => ErrorClassification {
                error_type: "TimeoutError",
                transient: true,
            },
            ScanError::Backend(_) => ErrorClassification {
                error_type: "BackendError",
                transient: true,
            },
            ScanError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                transient: true,
            },
            ScanError::Io(_) => ErrorClassification {
                error_type: "IoError",
                transient: true,
            },
            ScanError::Archive(_) => ErrorClassification {
                error_type: "ArchiveError",
                transient: true,
            },

            // Operator has to fix these
            ScanError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                transient: false,
            },
            ScanError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                transient: false,
            },
            ScanError::InvalidRequest(_) => ErrorClassification {
                error_type: "InvalidRequestError",
                transient: false,
            },
            ScanError::Url(_) => ErrorClassification {
                error_type: "UrlError",
                transient: false,
            },
            ScanError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                transient: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_failures_are_transient() {
        assert!(ScanError::Network("connection reset".into()).classify().transient);
        assert!(ScanError::Timeout("5s elapsed".into()).classify().transient);
        assert!(ScanError::Backend("status 502".into()).classify().transient);
    }

    #[test]
    fn test_missing_credentials_are_not_transient() {
        let class = ScanError::Config("CEYE API key is not configured".into()).classify();
        assert_eq!(class.error_type, "ConfigError");
        assert!(!class.transient);
    }

    #[test]
    fn test_malformed_json_is_transient() {
        let err: ScanError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        let class = err.classify();
        assert_eq!(class.error_type, "JsonError");
        assert!(class.transient);
    }
}

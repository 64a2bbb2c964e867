use std::path::Path;
use crate::errors::ScanError;
use crate::utils::fs::atomic_write;
use super::types::ScanConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::{info, warn};

const MAX_CONFIG_BYTES: u64 = 1_048_576;

/// Load the configuration for startup. A missing or unreadable document falls
/// back to defaults so the scanner always comes up.
pub async fn load_or_default(path: &Path) -> ScanConfig {
    if !path.exists() {
        info!(path = %path.display(), "No configuration file, using defaults");
        return ScanConfig::default();
    }
    match parse_config(path).await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load configuration, using defaults");
            ScanConfig::default()
        }
    }
}

pub async fn parse_config(path: &Path) -> Result<ScanConfig, ScanError> {
    if !path.exists() {
        return Err(ScanError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(ScanError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

/// Parse a configuration document already held in memory.
pub fn parse_config_str(content: &str) -> Result<ScanConfig, ScanError> {
    let json: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ScanError::Config(format!("Config is not valid JSON: {}", e)))?;

    validate_schema(&json)?;

    let config: ScanConfig = serde_json::from_value(json)
        .map_err(|e| ScanError::Config(format!("Config has an invalid value: {}", e)))?;

    validate_semantics(&config)?;

    Ok(config)
}

/// Persist the configuration as pretty JSON. The write is atomic so a crash
/// never leaves a half-written document behind.
pub async fn save_config(path: &Path, config: &ScanConfig) -> Result<(), ScanError> {
    validate_semantics(config)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let content = serde_json::to_string_pretty(config)?;
    atomic_write(path, &content).await?;
    info!(path = %path.display(), "Configuration saved");
    Ok(())
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(json: &serde_json::Value) -> Result<(), ScanError> {
    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| ScanError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(json);
    if let Err(errors) = result {
        let messages: Vec<String> = errors
            .map(|e| format!("{} at {}", e, e.instance_path))
            .collect();
        // Advisory only; typed parsing below is the authority.
        for msg in &messages {
            warn!(validation_error = %msg, "Config schema warning");
        }
    }

    Ok(())
}

/// Reject settings the executor and scheduler cannot run with.
pub fn validate_semantics(config: &ScanConfig) -> Result<(), ScanError> {
    let executor = &config.executor;
    if executor.core_pool_size == 0 {
        return Err(ScanError::Config("executor.corePoolSize must be at least 1".into()));
    }
    if executor.core_pool_size > executor.max_pool_size {
        return Err(ScanError::Config(format!(
            "executor.corePoolSize ({}) exceeds executor.maxPoolSize ({})",
            executor.core_pool_size, executor.max_pool_size
        )));
    }
    if executor.queue_capacity == 0 {
        return Err(ScanError::Config("executor.queueCapacity must be at least 1".into()));
    }
    if config.confirmation.period_secs == 0 {
        return Err(ScanError::Config("confirmation.periodSecs must be at least 1".into()));
    }
    if config.probe_timeout_secs == 0 || config.backend_timeout_secs == 0 {
        return Err(ScanError::Config("timeouts must be at least 1 second".into()));
    }

    if !executor.qps.is_finite() || executor.qps <= 0.0 {
        warn!(qps = executor.qps, "Probe rate limiting disabled");
    }

    Ok(())
}

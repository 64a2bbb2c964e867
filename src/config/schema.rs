use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "dnslogType": { "type": "string", "enum": ["CEYE", "COLLABORATOR", "ceye", "collaborator"] },
            "donlogType": { "type": "string", "enum": ["CEYE", "COLLABORATOR", "ceye", "collaborator"] },
            "ceyeApiKey": { "type": "string" },
            "ceyeApiDomain": { "type": "string" },
            "ceyeBaseUrl": { "type": "string", "format": "uri" },
            "ceyeFilter": { "type": "string" },
            "collaboratorDomain": { "type": "string" },
            "targetDomain": { "type": "string" },
            "fastJsonScanEnabled": { "type": "boolean" },
            "log4jScanEnabled": { "type": "boolean" },
            "springScanEnabled": { "type": "boolean" },
            "logEnabled": { "type": "boolean" },
            "logPath": { "type": "string" },
            "logRetentionDays": { "type": "integer", "minimum": 0 },
            "filterExtensions": { "type": "string" },
            "filterKeywords": { "type": "string" },
            "springScanKeywords": { "type": "string" },
            "springScanFilePath": { "type": "string" },
            "cryptoEnabled": { "type": "boolean" },
            "probeTimeoutSecs": { "type": "integer", "minimum": 1 },
            "backendTimeoutSecs": { "type": "integer", "minimum": 1 },
            "executor": {
                "type": "object",
                "properties": {
                    "corePoolSize": { "type": "integer", "minimum": 1 },
                    "maxPoolSize": { "type": "integer", "minimum": 1 },
                    "keepAliveSecs": { "type": "integer", "minimum": 0 },
                    "queueCapacity": { "type": "integer", "minimum": 1 },
                    "qps": { "type": "number" }
                }
            },
            "confirmation": {
                "type": "object",
                "properties": {
                    "initialDelaySecs": { "type": "integer", "minimum": 0 },
                    "periodSecs": { "type": "integer", "minimum": 1 }
                }
            }
        }
    })
});

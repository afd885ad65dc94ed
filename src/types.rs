//! JSON payloads produced by the dispatcher.

use chrono::{DateTime, SecondsFormat, Utc};
use dockerlab_probe::MemoryUsage;
use serde::{Deserialize, Serialize};

pub const WELCOME_MESSAGE: &str = "Welcome to Docker Learning App!";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const HEALTHY: &str = "healthy";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeInfo {
    pub message: String,
    pub version: String,
    pub environment: String,
    pub container: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeInfo {
    pub runtime_version: String,
    pub platform: String,
    pub memory: MemoryUsage,
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomSample {
    pub number: u32,
    pub timestamp: String,
}

/// Body of every 4xx/5xx response. Carries either the offending `path` or a `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g. `2024-05-01T12:00:00.000Z`.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_match_iso_8601_millis() {
        let at = DateTime::<Utc>::UNIX_EPOCH;
        assert_eq!(iso_timestamp(at), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn error_response_omits_missing_fields() {
        let body = ErrorResponse {
            error: "Route not found".into(),
            path: Some("/foo/bar".into()),
            message: None,
        };

        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"Route not found","path":"/foo/bar"}"#
        );
    }

    #[test]
    fn health_status_uses_camel_case_keys() {
        let status = HealthStatus {
            status: HEALTHY.into(),
            timestamp: iso_timestamp(DateTime::<Utc>::UNIX_EPOCH),
            uptime_seconds: 1.5,
        };

        let value = serde_json::to_value(status).unwrap();
        assert_eq!(value["uptimeSeconds"], 1.5);
        assert!(value.get("uptime_seconds").is_none());
    }
}

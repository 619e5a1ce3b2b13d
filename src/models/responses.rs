use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SaveTokenResponse {
    pub token: String,
    pub enabled: bool,
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleNotificationResponse {
    pub token: String,
    pub enabled: bool,
}

/// Outcome summary of one fan-out, returned by the manual trigger endpoints.
#[derive(Debug, Serialize)]
pub struct FanOutResponse {
    pub kind: String,
    pub targets: usize,
    pub sent: usize,
    pub skipped: usize,
    pub pruned: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: NaiveDateTime,
    pub services: HashMap<String, ServiceHealth>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub uptime_seconds: u64,
    pub statistics: SystemStatistics,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct SystemStatistics {
    pub total_tokens: i64,
    pub enabled_tokens: i64,
    pub total_hadiths: i64,
}

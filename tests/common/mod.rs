#![allow(dead_code)]

use reqwest::Client;
use std::time::{SystemTime, UNIX_EPOCH};

/// Base URL of a running instance, from TEST_API_URL. Tests that need a live
/// server skip silently when it is unset.
pub fn base_url() -> Option<String> {
    std::env::var("TEST_API_URL").ok().filter(|s| !s.is_empty())
}

/// Build a reusable HTTP client.
pub fn http_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
}

/// Unique token value per test run so reruns do not collide.
pub fn unique_token(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}")
}

use async_trait::async_trait;
use serde::Deserialize;

/// One shaped notification, ready to hand to the delivery provider.
#[derive(Debug, Clone)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub channel_id: &'static str,
    pub sound: Option<&'static str>,
    pub high_priority: bool,
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The provider reported the token malformed or permanently unregistered.
    #[error("token invalid or unregistered")]
    InvalidToken,
    /// Anything else: transport failures, provider 5xx, unknown error codes.
    #[error("{0}")]
    Transient(String),
}

/// Delivery seam between the dispatcher and the push provider.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), SendError>;
}

/// FCM legacy HTTP client (server-key auth).
#[derive(Clone)]
pub struct FcmClient {
    http: reqwest::Client,
    api_url: String,
    server_key: String,
    timeout: std::time::Duration,
    configured: bool,
}

#[derive(Debug, Deserialize)]
struct FcmResponse {
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

/// The two provider codes that mean the token is permanently dead.
fn is_dead_token_code(code: &str) -> bool {
    matches!(code, "NotRegistered" | "InvalidRegistration")
}

impl FcmClient {
    pub fn new(
        http: reqwest::Client,
        api_url: &str,
        server_key: &str,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            http,
            api_url: api_url.to_string(),
            server_key: server_key.to_string(),
            timeout: std::time::Duration::from_secs(timeout_seconds),
            configured: !server_key.is_empty(),
        }
    }

    fn build_payload(token: &str, message: &PushMessage) -> serde_json::Value {
        let mut notification = serde_json::json!({
            "title": message.title,
            "body": message.body,
            "android_channel_id": message.channel_id,
        });
        if let Some(sound) = message.sound {
            notification["sound"] = serde_json::Value::String(sound.to_string());
        }

        let mut payload = serde_json::json!({
            "to": token,
            "priority": if message.high_priority { "high" } else { "normal" },
            "notification": notification,
        });
        if let Some(data) = &message.data {
            payload["data"] = data.clone();
        }

        payload
    }
}

#[async_trait]
impl PushGateway for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), SendError> {
        if !self.configured {
            return Err(SendError::Transient(
                "FCM server key not configured".to_string(),
            ));
        }

        let payload = Self::build_payload(token, message);

        let resp = self
            .http
            .post(&self.api_url)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SendError::Transient(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SendError::Transient(format!("HTTP {status}")));
        }

        let body: FcmResponse = resp
            .json()
            .await
            .map_err(|e| SendError::Transient(e.to_string()))?;

        match body.results.first().and_then(|r| r.error.as_deref()) {
            None => Ok(()),
            Some(code) if is_dead_token_code(code) => Err(SendError::InvalidToken),
            Some(code) => Err(SendError::Transient(code.to_string())),
        }
    }
}

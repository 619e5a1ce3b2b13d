use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SaveTokenRequest {
    #[validate(length(min = 1, message = "token is required"))]
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleNotificationRequest {
    pub token: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SendNamazParams {
    #[serde(rename = "type")]
    pub prayer_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendHadithRequest {
    #[serde(rename = "hadithId")]
    pub hadith_id: Option<String>,
}

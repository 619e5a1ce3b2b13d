use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The five daily prayers, in firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

/// A registered device push token. Identity is the token string itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token: String,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A hadith content record, appended by an external writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hadith {
    pub id: String,
    pub text: String,
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
}

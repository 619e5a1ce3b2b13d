use std::env;

#[derive(Debug, Clone)]
pub struct Settings {
    // App
    pub app_name: String,
    pub app_version: String,
    pub environment: String,
    pub host: String,
    pub port: u16,

    // Database
    pub database_path: String,
    pub database_pool_size: u32,
    pub database_pool_timeout: u64,

    // FCM gateway
    pub fcm_api_url: String,
    pub fcm_server_key: String,
    pub fcm_timeout_seconds: u64,

    // Triggers
    pub triggers_enabled: bool,
    pub startup_delay_seconds: u64,
    pub hadith_poll_seconds: u64,

    // CORS
    pub cors_origins: String,

    // Logging
    pub log_level: String,
    pub log_format: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            app_name: env::var("APP_NAME").unwrap_or("Namaz Notify API".into()),
            app_version: env::var("APP_VERSION").unwrap_or("1.0.0".into()),
            environment: env::var("ENVIRONMENT").unwrap_or("development".into()),
            host: env::var("HOST").unwrap_or("0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or("8000".into())
                .parse()
                .unwrap_or(8000),

            database_path: env::var("DATABASE_PATH").unwrap_or("data/namaz_notify.db".into()),
            database_pool_size: env::var("DATABASE_POOL_SIZE")
                .unwrap_or("5".into())
                .parse()
                .unwrap_or(5),
            database_pool_timeout: env::var("DATABASE_POOL_TIMEOUT")
                .unwrap_or("30".into())
                .parse()
                .unwrap_or(30),

            fcm_api_url: env::var("FCM_API_URL")
                .unwrap_or("https://fcm.googleapis.com/fcm/send".into()),
            fcm_server_key: env::var("FCM_SERVER_KEY").unwrap_or_default(),
            fcm_timeout_seconds: env::var("FCM_TIMEOUT_SECONDS")
                .unwrap_or("10".into())
                .parse()
                .unwrap_or(10),

            triggers_enabled: env::var("TRIGGERS_ENABLED")
                .unwrap_or("true".into())
                .parse()
                .unwrap_or(true),
            startup_delay_seconds: env::var("STARTUP_DELAY_SECONDS")
                .unwrap_or("15".into())
                .parse()
                .unwrap_or(15),
            hadith_poll_seconds: env::var("HADITH_POLL_SECONDS")
                .unwrap_or("60".into())
                .parse()
                .unwrap_or(60),

            cors_origins: env::var("CORS_ORIGINS").unwrap_or("*".into()),

            log_level: env::var("LOG_LEVEL").unwrap_or("info".into()),
            log_format: env::var("LOG_FORMAT").unwrap_or("json".into()),
        }
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        if self.cors_origins == "*" {
            return vec!["*".to_string()];
        }
        self.cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .collect()
    }
}

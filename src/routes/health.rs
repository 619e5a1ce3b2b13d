use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::Utc;

use crate::AppState;
use crate::db::repositories::{HadithRepository, TokenRepository};
use crate::models::responses::{
    HealthResponse, ServiceHealth, StatusResponse, SystemStatistics,
};

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": state.settings.app_name,
        "version": state.settings.app_version,
        "status": "running",
        "health": "/health",
    }))
}

/// Liveness probe used by the hosting platform's keep-alive pings.
pub async fn ping() -> &'static str {
    "pong"
}

pub async fn wake_up() -> &'static str {
    "Server is awake"
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_health = state.db.health_check().await;

    let mut services = HashMap::new();
    services.insert(
        "database".to_string(),
        ServiceHealth {
            status: db_health.status.clone(),
            latency_ms: db_health.latency_ms,
            error: db_health.error,
        },
    );

    let overall_status = if db_health.status == "up" {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        timestamp: Utc::now().naive_utc(),
        services,
    })
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let uptime = state.start_time.elapsed().as_secs();

    let token_repo = TokenRepository::new(state.db.pool.clone());
    let hadith_repo = HadithRepository::new(state.db.pool.clone());

    let total_tokens = token_repo.count_all().await.unwrap_or(0);
    let enabled_tokens = token_repo.count_enabled().await.unwrap_or(0);
    let total_hadiths = hadith_repo.count_all().await.unwrap_or(0);

    Json(StatusResponse {
        service: state.settings.app_name.clone(),
        version: state.settings.app_version.clone(),
        environment: state.settings.environment.clone(),
        uptime_seconds: uptime,
        statistics: SystemStatistics {
            total_tokens,
            enabled_tokens,
            total_hadiths,
        },
        timestamp: Utc::now().naive_utc(),
    })
}

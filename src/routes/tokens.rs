use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use validator::Validate;

use crate::AppState;
use crate::db::repositories::TokenRepository;
use crate::error::AppError;
use crate::models::requests::{SaveTokenRequest, ToggleNotificationRequest};
use crate::models::responses::{SaveTokenResponse, ToggleNotificationResponse};

// POST /save-token
pub async fn save_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTokenRequest>,
) -> Result<Json<SaveTokenResponse>, AppError> {
    req.validate()
        .map_err(|_| AppError::validation_error("token is required"))?;

    let repo = TokenRepository::new(state.db.pool.clone());

    // New tokens start enabled; re-registrations keep their current flag.
    let created = repo.upsert(&req.token, true).await?;
    let enabled = match repo.get(&req.token).await? {
        Some(t) => t.enabled,
        None => true,
    };

    if created {
        tracing::info!(token = %req.token, "Push token registered");
    }

    Ok(Json(SaveTokenResponse {
        token: req.token,
        enabled,
        created,
    }))
}

// POST /toggle-notification
pub async fn toggle_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleNotificationRequest>,
) -> Result<Json<ToggleNotificationResponse>, AppError> {
    let token = req
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("token is required"))?;
    let enabled = req
        .enabled
        .ok_or_else(|| AppError::bad_request("enabled is required"))?;

    let repo = TokenRepository::new(state.db.pool.clone());
    let updated = repo.set_enabled(token, enabled).await?;
    if !updated {
        return Err(AppError::not_found(format!("Unknown token: {token}")));
    }

    tracing::info!(token = %token, enabled, "Notification flag updated");

    Ok(Json(ToggleNotificationResponse {
        token: token.to_string(),
        enabled,
    }))
}

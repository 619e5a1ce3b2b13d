use std::str::FromStr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};

use crate::AppState;
use crate::db::repositories::HadithRepository;
use crate::error::AppError;
use crate::models::entities::Prayer;
use crate::models::requests::{SendHadithRequest, SendNamazParams};
use crate::models::responses::FanOutResponse;
use crate::services::dispatcher::{FanOutReport, NotificationKind};

fn fan_out_response(kind: &str, report: FanOutReport) -> FanOutResponse {
    FanOutResponse {
        kind: kind.to_string(),
        targets: report.targets,
        sent: report.sent,
        skipped: report.skipped,
        pruned: report.pruned,
        failed: report.failed,
    }
}

// GET /send-namaz?type=Fajr
pub async fn send_namaz(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SendNamazParams>,
) -> Result<Json<FanOutResponse>, AppError> {
    let raw = params
        .prayer_type
        .as_deref()
        .ok_or_else(|| AppError::bad_request("query parameter `type` is required"))?;
    let prayer = Prayer::from_str(raw)
        .map_err(|_| AppError::bad_request(format!("Invalid prayer type: {raw}")))?;

    let kind = NotificationKind::ScheduledReminder(prayer);
    let label = kind.label();
    let report = state.dispatcher.fan_out(kind).await?;

    Ok(Json(fan_out_response(label, report)))
}

// POST /send-hadith-notification
pub async fn send_hadith_notification(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendHadithRequest>,
) -> Result<Json<FanOutResponse>, AppError> {
    let hadith_id = req
        .hadith_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("hadithId is required"))?;

    let repo = HadithRepository::new(state.db.pool.clone());
    let hadith = repo
        .get_by_id(hadith_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Unknown hadith id: {hadith_id}")))?;

    let kind = NotificationKind::ContentAlert(hadith);
    let label = kind.label();
    let report = state.dispatcher.fan_out(kind).await?;

    Ok(Json(fan_out_response(label, report)))
}

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::AppState;
use crate::db::repositories::HadithRepository;
use crate::services::dispatcher::NotificationKind;

/// Poll loop over the newest hadith record. Seeds its watermark at startup so
/// pre-existing records never fire; each strictly newer record fires one
/// content alert.
pub async fn run(state: Arc<AppState>) {
    let repo = HadithRepository::new(state.db.pool.clone());

    let mut last_seen = match repo.latest().await {
        Ok(h) => h.map(|h| h.created_at),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to seed hadith watermark, starting empty");
            None
        }
    };
    tracing::info!(watermark = ?last_seen, "Hadith watch armed");

    let mut ticker = tokio::time::interval(Duration::from_secs(
        state.settings.hadith_poll_seconds.max(1),
    ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let latest = match repo.latest().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "Hadith watch read failed");
                continue;
            }
        };
        let Some(hadith) = latest else { continue };

        if last_seen.is_some_and(|ts| hadith.created_at <= ts) {
            continue;
        }
        last_seen = Some(hadith.created_at);

        tracing::info!(hadith_id = %hadith.id, "New hadith observed");
        if let Err(e) = state
            .dispatcher
            .fan_out(NotificationKind::ContentAlert(hadith))
            .await
        {
            tracing::error!(error = %e, "Hadith alert fan-out failed");
        }
    }
}

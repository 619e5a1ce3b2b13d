use std::sync::Arc;

use dashmap::DashSet;
use futures::future::join_all;
use sqlx::SqlitePool;

use crate::db::repositories::TokenRepository;
use crate::models::entities::{Hadith, Prayer};
use crate::services::push_gateway::{PushGateway, PushMessage, SendError};

/// Hadith bodies longer than this are cut and marked with an ellipsis.
const HADITH_BODY_LIMIT: usize = 50;

const DEFAULT_HADITH_TITLE: &str = "Islamic Hadith";
const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";

/// One trigger event. Ephemeral: lives only for the duration of a fan-out.
#[derive(Debug, Clone)]
pub enum NotificationKind {
    ScheduledReminder(Prayer),
    ContentAlert(Hadith),
}

impl NotificationKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ScheduledReminder(_) => "scheduled_reminder",
            Self::ContentAlert(_) => "content_alert",
        }
    }

    /// Content id used for delivery dedup. Scheduled reminders are never
    /// deduplicated.
    fn content_id(&self) -> Option<&str> {
        match self {
            Self::ScheduledReminder(_) => None,
            Self::ContentAlert(hadith) => Some(&hadith.id),
        }
    }
}

/// Process-lifetime record of (token, content) pairs already delivered.
/// Safe under concurrent insertion from overlapping fan-outs; reset on
/// restart.
#[derive(Clone, Default)]
pub struct DedupSet {
    delivered: Arc<DashSet<(String, String)>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, token: &str, content_id: &str) -> bool {
        self.delivered
            .contains(&(token.to_string(), content_id.to_string()))
    }

    fn mark(&self, token: &str, content_id: &str) {
        self.delivered
            .insert((token.to_string(), content_id.to_string()));
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    pub fn clear(&self) {
        self.delivered.clear();
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub targets: usize,
    pub sent: usize,
    pub skipped: usize,
    pub pruned: usize,
    pub failed: usize,
}

enum Outcome {
    Sent,
    Skipped,
    Pruned,
    Failed,
}

/// Turns one trigger event into zero or more delivery attempts, pruning
/// tokens the gateway reports as dead.
#[derive(Clone)]
pub struct Dispatcher {
    pool: SqlitePool,
    gateway: Arc<dyn PushGateway>,
    dedup: DedupSet,
}

impl Dispatcher {
    pub fn new(pool: SqlitePool, gateway: Arc<dyn PushGateway>) -> Self {
        Self {
            pool,
            gateway,
            dedup: DedupSet::new(),
        }
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    /// Fan one notification out to every enabled token. Per-token attempts
    /// run concurrently and independently; a failing token never aborts the
    /// batch. An empty target set is a no-op, not an error.
    pub async fn fan_out(&self, kind: NotificationKind) -> Result<FanOutReport, sqlx::Error> {
        let repo = TokenRepository::new(self.pool.clone());
        let targets = repo.list_enabled().await?;

        if targets.is_empty() {
            tracing::info!(kind = kind.label(), "No enabled targets, nothing to send");
            return Ok(FanOutReport::default());
        }

        let message = build_message(&kind);
        let content_id = kind.content_id();

        let outcomes = join_all(
            targets
                .iter()
                .map(|token| self.deliver(&repo, token, &message, content_id)),
        )
        .await;

        let mut report = FanOutReport {
            targets: targets.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Sent => report.sent += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Pruned => report.pruned += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            kind = kind.label(),
            targets = report.targets,
            sent = report.sent,
            skipped = report.skipped,
            pruned = report.pruned,
            failed = report.failed,
            "Fan-out completed"
        );

        Ok(report)
    }

    async fn deliver(
        &self,
        repo: &TokenRepository,
        token: &str,
        message: &PushMessage,
        content_id: Option<&str>,
    ) -> Outcome {
        if let Some(cid) = content_id {
            if self.dedup.contains(token, cid) {
                return Outcome::Skipped;
            }
        }

        match self.gateway.send(token, message).await {
            Ok(()) => {
                if let Some(cid) = content_id {
                    self.dedup.mark(token, cid);
                }
                Outcome::Sent
            }
            Err(SendError::InvalidToken) => {
                tracing::info!(token, "Pruning token reported dead by the gateway");
                // Best-effort: a failed prune must not fail the fan-out.
                if let Err(e) = repo.remove(token).await {
                    tracing::warn!(error = %e, token, "Failed to prune invalid token");
                }
                Outcome::Pruned
            }
            Err(SendError::Transient(reason)) => {
                // At-most-once per trigger: no retry within this fan-out.
                tracing::warn!(token, reason = %reason, "Push send failed, dropped for this trigger");
                Outcome::Failed
            }
        }
    }
}

/// Shape the provider payload for a trigger. The exact titles, templates,
/// channels and data keys are load-bearing: the mobile client routes on them.
pub fn build_message(kind: &NotificationKind) -> PushMessage {
    match kind {
        NotificationKind::ScheduledReminder(prayer) => PushMessage {
            title: "Namaz Reminder".to_string(),
            body: format!("{prayer} ki namaz ka waqt ho gaya hai 🕌"),
            channel_id: "namaz_channel",
            sound: Some("azan"),
            high_priority: true,
            data: None,
        },
        NotificationKind::ContentAlert(hadith) => PushMessage {
            title: hadith
                .category
                .clone()
                .unwrap_or_else(|| DEFAULT_HADITH_TITLE.to_string()),
            body: truncate_body(&hadith.text),
            channel_id: "hadith_channel",
            sound: None,
            high_priority: false,
            data: Some(serde_json::json!({
                "type": "hadith",
                "hadithId": hadith.id,
                "click_action": CLICK_ACTION,
            })),
        },
    }
}

fn truncate_body(text: &str) -> String {
    if text.chars().count() <= HADITH_BODY_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(HADITH_BODY_LIMIT).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::db::test_pool;

    /// Records every send; per-token failures are programmable.
    #[derive(Default)]
    struct MockGateway {
        sent: Mutex<Vec<String>>,
        invalid: HashSet<String>,
        transient: HashSet<String>,
    }

    impl MockGateway {
        fn sent_tokens(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PushGateway for MockGateway {
        async fn send(&self, token: &str, _message: &PushMessage) -> Result<(), SendError> {
            self.sent.lock().unwrap().push(token.to_string());
            if self.invalid.contains(token) {
                return Err(SendError::InvalidToken);
            }
            if self.transient.contains(token) {
                return Err(SendError::Transient("Unavailable".to_string()));
            }
            Ok(())
        }
    }

    fn hadith(id: &str, text: &str) -> Hadith {
        Hadith {
            id: id.to_string(),
            text: text.to_string(),
            category: None,
            created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    async fn dispatcher_with(gateway: Arc<MockGateway>) -> (Dispatcher, TokenRepository) {
        let pool = test_pool().await;
        let repo = TokenRepository::new(pool.clone());
        (Dispatcher::new(pool, gateway), repo)
    }

    #[tokio::test]
    async fn sends_only_to_enabled_tokens() {
        let gateway = Arc::new(MockGateway::default());
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();
        repo.upsert("B", true).await.unwrap();
        repo.set_enabled("B", false).await.unwrap();

        let report = dispatcher
            .fan_out(NotificationKind::ScheduledReminder(Prayer::Fajr))
            .await
            .unwrap();

        assert_eq!(gateway.sent_tokens(), vec!["A".to_string()]);
        assert_eq!(report.targets, 1);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn empty_enabled_set_is_a_noop() {
        let gateway = Arc::new(MockGateway::default());
        let (dispatcher, _repo) = dispatcher_with(gateway.clone()).await;

        let report = dispatcher
            .fan_out(NotificationKind::ScheduledReminder(Prayer::Isha))
            .await
            .unwrap();

        assert!(gateway.sent_tokens().is_empty());
        assert_eq!(report, FanOutReport::default());
    }

    #[tokio::test]
    async fn same_content_delivers_at_most_once_per_token() {
        let gateway = Arc::new(MockGateway::default());
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();
        let h = hadith("h1", "seek knowledge");

        let first = dispatcher
            .fan_out(NotificationKind::ContentAlert(h.clone()))
            .await
            .unwrap();
        let second = dispatcher
            .fan_out(NotificationKind::ContentAlert(h))
            .await
            .unwrap();

        assert_eq!(gateway.sent_tokens().len(), 1);
        assert_eq!(first.sent, 1);
        assert_eq!(second.sent, 0);
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn scheduled_reminders_are_never_deduplicated() {
        let gateway = Arc::new(MockGateway::default());
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();

        for _ in 0..2 {
            dispatcher
                .fan_out(NotificationKind::ScheduledReminder(Prayer::Dhuhr))
                .await
                .unwrap();
        }

        assert_eq!(gateway.sent_tokens().len(), 2);
        assert!(dispatcher.dedup().is_empty());
    }

    #[tokio::test]
    async fn invalid_token_is_pruned_from_the_store() {
        let gateway = Arc::new(MockGateway {
            invalid: HashSet::from(["A".to_string()]),
            ..Default::default()
        });
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();
        repo.upsert("B", true).await.unwrap();

        let report = dispatcher
            .fan_out(NotificationKind::ScheduledReminder(Prayer::Maghrib))
            .await
            .unwrap();

        assert!(repo.get("A").await.unwrap().is_none());
        assert!(repo.get("B").await.unwrap().is_some());
        assert_eq!(report.pruned, 1);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn transient_failure_is_dropped_without_prune_or_retry() {
        let gateway = Arc::new(MockGateway {
            transient: HashSet::from(["A".to_string()]),
            ..Default::default()
        });
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();

        let report = dispatcher
            .fan_out(NotificationKind::ScheduledReminder(Prayer::Asr))
            .await
            .unwrap();

        // Exactly one attempt, token kept, nothing surfaced as an error.
        assert_eq!(gateway.sent_tokens().len(), 1);
        assert!(repo.get("A").await.unwrap().is_some());
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 0);
    }

    #[tokio::test]
    async fn failed_delivery_does_not_mark_dedup() {
        let gateway = Arc::new(MockGateway {
            transient: HashSet::from(["A".to_string()]),
            ..Default::default()
        });
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();
        let h = hadith("h1", "seek knowledge");

        dispatcher
            .fan_out(NotificationKind::ContentAlert(h))
            .await
            .unwrap();

        assert!(dispatcher.dedup().is_empty());
    }

    #[tokio::test]
    async fn clearing_the_dedup_set_allows_redelivery() {
        let gateway = Arc::new(MockGateway::default());
        let (dispatcher, repo) = dispatcher_with(gateway.clone()).await;

        repo.upsert("A", true).await.unwrap();
        let h = hadith("h1", "seek knowledge");

        dispatcher
            .fan_out(NotificationKind::ContentAlert(h.clone()))
            .await
            .unwrap();
        assert_eq!(dispatcher.dedup().len(), 1);

        dispatcher.dedup().clear();
        let report = dispatcher
            .fan_out(NotificationKind::ContentAlert(h))
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(gateway.sent_tokens().len(), 2);
    }

    #[test]
    fn namaz_reminder_payload_shape() {
        let message = build_message(&NotificationKind::ScheduledReminder(Prayer::Fajr));
        assert_eq!(message.title, "Namaz Reminder");
        assert_eq!(message.body, "Fajr ki namaz ka waqt ho gaya hai 🕌");
        assert_eq!(message.channel_id, "namaz_channel");
        assert_eq!(message.sound, Some("azan"));
        assert!(message.high_priority);
        assert!(message.data.is_none());
    }

    #[test]
    fn hadith_payload_shape_and_default_category() {
        let message = build_message(&NotificationKind::ContentAlert(hadith("h7", "short")));
        assert_eq!(message.title, "Islamic Hadith");
        assert_eq!(message.channel_id, "hadith_channel");
        assert_eq!(message.sound, None);

        let data = message.data.unwrap();
        assert_eq!(data["type"], "hadith");
        assert_eq!(data["hadithId"], "h7");
        assert_eq!(data["click_action"], "FLUTTER_NOTIFICATION_CLICK");
    }

    #[test]
    fn hadith_title_uses_category_when_present() {
        let mut h = hadith("h8", "short");
        h.category = Some("Sahih Bukhari".to_string());
        let message = build_message(&NotificationKind::ContentAlert(h));
        assert_eq!(message.title, "Sahih Bukhari");
    }

    #[test]
    fn body_truncates_past_fifty_chars() {
        let text = "x".repeat(60);
        let body = truncate_body(&text);
        assert_eq!(body, format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn body_of_exactly_fifty_chars_passes_verbatim() {
        let text = "y".repeat(50);
        assert_eq!(truncate_body(&text), text);
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let text = "م".repeat(60);
        let body = truncate_body(&text);
        assert_eq!(body.chars().count(), 53);
        assert!(body.ends_with("..."));
    }
}

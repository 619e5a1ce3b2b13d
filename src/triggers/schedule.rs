use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use croner::Cron;

use crate::AppState;
use crate::models::entities::Prayer;
use crate::services::dispatcher::NotificationKind;

/// Fixed IST wall-clock firing rules (minute hour day month weekday).
const PRAYER_RULES: [(Prayer, &str); 5] = [
    (Prayer::Fajr, "0 4 * * *"),
    (Prayer::Dhuhr, "25 12 * * *"),
    (Prayer::Asr, "50 15 * * *"),
    (Prayer::Maghrib, "0 17 * * *"),
    (Prayer::Isha, "35 20 * * *"),
];

/// Indian Standard Time, UTC+05:30.
fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("valid IST offset")
}

struct PrayerSchedule {
    rules: Vec<(Prayer, Cron)>,
}

impl PrayerSchedule {
    fn new() -> anyhow::Result<Self> {
        let mut rules = Vec::with_capacity(PRAYER_RULES.len());
        for (prayer, expr) in PRAYER_RULES {
            let cron = Cron::from_str(expr)
                .map_err(|e| anyhow::anyhow!("invalid cron expression '{expr}': {e}"))?;
            rules.push((prayer, cron));
        }
        Ok(Self { rules })
    }

    /// Earliest upcoming firing strictly after `now`.
    fn next_after(&self, now: DateTime<FixedOffset>) -> Option<(Prayer, DateTime<FixedOffset>)> {
        self.rules
            .iter()
            .filter_map(|(prayer, cron)| {
                cron.find_next_occurrence(&now, false)
                    .ok()
                    .map(|at| (*prayer, at))
            })
            .min_by_key(|(_, at)| *at)
    }
}

/// Sleep-until-next loop over the five prayer rules. Fan-out failures are
/// logged and terminal only for that firing.
pub async fn run(state: Arc<AppState>) {
    let schedule = match PrayerSchedule::new() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build prayer schedule");
            return;
        }
    };
    tracing::info!("Prayer reminder schedule armed");

    loop {
        let now = Utc::now().with_timezone(&ist());
        let Some((prayer, at)) = schedule.next_after(now) else {
            tracing::error!("No upcoming prayer occurrence, stopping schedule");
            return;
        };

        let wait = (at - now).to_std().unwrap_or_default();
        tracing::debug!(prayer = %prayer, at = %at, "Sleeping until next reminder");
        tokio::time::sleep(wait).await;

        if let Err(e) = state
            .dispatcher
            .fan_out(NotificationKind::ScheduledReminder(prayer))
            .await
        {
            tracing::error!(error = %e, prayer = %prayer, "Scheduled reminder fan-out failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2024, 6, 1, h, m, 0).unwrap()
    }

    #[test]
    fn all_five_rules_parse() {
        let schedule = PrayerSchedule::new().unwrap();
        assert_eq!(schedule.rules.len(), 5);
    }

    #[test]
    fn midday_next_is_dhuhr() {
        let schedule = PrayerSchedule::new().unwrap();
        let (prayer, when) = schedule.next_after(at(10, 0)).unwrap();
        assert_eq!(prayer, Prayer::Dhuhr);
        assert_eq!(when, at(12, 25));
    }

    #[test]
    fn late_evening_wraps_to_next_day_fajr() {
        let schedule = PrayerSchedule::new().unwrap();
        let (prayer, when) = schedule.next_after(at(21, 0)).unwrap();
        assert_eq!(prayer, Prayer::Fajr);
        assert_eq!(
            when,
            ist().with_ymd_and_hms(2024, 6, 2, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn firing_time_is_excluded_from_its_own_search() {
        let schedule = PrayerSchedule::new().unwrap();
        let (prayer, when) = schedule.next_after(at(17, 0)).unwrap();
        assert_eq!(prayer, Prayer::Isha);
        assert_eq!(when, at(20, 35));
    }
}

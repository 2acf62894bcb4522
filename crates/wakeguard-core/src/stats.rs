//! Wake statistics and streak ledger.
//!
//! Updated exactly once per successful verification. Streak continuity is
//! derived from local calendar-day deltas between completions; the original
//! implementation collapsed a same-day second completion to a streak of 1,
//! so that behavior is kept available behind an explicit policy instead of
//! being silently corrected.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::TaskKind;

/// What a second completion on an already-recorded day does to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameDayRepeatPolicy {
    /// Leave the streak number unchanged.
    KeepStreak,
    /// Collapse the streak to 1, as the original source did.
    LegacyReset,
}

impl Default for SameDayRepeatPolicy {
    fn default() -> Self {
        SameDayRepeatPolicy::KeepStreak
    }
}

/// One successful wake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub date: DateTime<Utc>,
    pub task: TaskKind,
    pub label: String,
}

/// Cumulative wake statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_wakes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_wake_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<CompletionRecord>,
}

impl UserStats {
    /// Record one successful verification.
    ///
    /// Day deltas are measured on the local calendar: a wake at 23:50 and
    /// another at 00:10 the next day count as consecutive days.
    pub fn record_completion(
        &mut self,
        task: TaskKind,
        label: &str,
        now: DateTime<Utc>,
        policy: SameDayRepeatPolicy,
    ) {
        let new_streak = match self.last_wake_date {
            Some(last) => {
                let days = (now.with_timezone(&Local).date_naive()
                    - last.with_timezone(&Local).date_naive())
                .num_days();
                match days {
                    1 => self.current_streak + 1,
                    d if d > 1 => 1,
                    // Same day (or a clock that went backwards).
                    _ => match policy {
                        SameDayRepeatPolicy::KeepStreak => self.current_streak.max(1),
                        SameDayRepeatPolicy::LegacyReset => 1,
                    },
                }
            }
            None => 1,
        };

        self.current_streak = new_streak;
        self.best_streak = self.best_streak.max(new_streak);
        self.total_wakes += 1;
        self.last_wake_date = Some(now);
        self.history.push(CompletionRecord {
            date: now,
            task,
            label: label.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn noon_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_completion_starts_a_streak() {
        let mut stats = UserStats::default();
        stats.record_completion(
            TaskKind::Math,
            "Alarm",
            noon_utc(2024, 3, 6),
            SameDayRepeatPolicy::KeepStreak,
        );
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 1);
        assert_eq!(stats.total_wakes, 1);
        assert_eq!(stats.history.len(), 1);
    }

    #[test]
    fn consecutive_day_increments_streak() {
        let mut stats = UserStats {
            current_streak: 3,
            best_streak: 3,
            total_wakes: 3,
            last_wake_date: Some(noon_utc(2024, 3, 5)),
            history: Vec::new(),
        };
        stats.record_completion(
            TaskKind::Shake,
            "Alarm",
            noon_utc(2024, 3, 6),
            SameDayRepeatPolicy::KeepStreak,
        );
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.best_streak, 4);
        assert_eq!(stats.total_wakes, 4);
    }

    #[test]
    fn gap_resets_streak_to_one() {
        let mut stats = UserStats {
            current_streak: 9,
            best_streak: 9,
            total_wakes: 9,
            last_wake_date: Some(noon_utc(2024, 3, 1)),
            history: Vec::new(),
        };
        stats.record_completion(
            TaskKind::Math,
            "Alarm",
            noon_utc(2024, 3, 6),
            SameDayRepeatPolicy::KeepStreak,
        );
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 9);
    }

    #[test]
    fn same_day_repeat_keeps_streak_by_default() {
        let mut stats = UserStats {
            current_streak: 5,
            best_streak: 5,
            total_wakes: 5,
            last_wake_date: Some(noon_utc(2024, 3, 6)),
            history: Vec::new(),
        };
        stats.record_completion(
            TaskKind::Sequence,
            "Nap",
            noon_utc(2024, 3, 6) + Duration::hours(3),
            SameDayRepeatPolicy::KeepStreak,
        );
        assert_eq!(stats.current_streak, 5);
        assert_eq!(stats.total_wakes, 6);
    }

    #[test]
    fn same_day_repeat_collapses_under_legacy_policy() {
        let mut stats = UserStats {
            current_streak: 5,
            best_streak: 5,
            total_wakes: 5,
            last_wake_date: Some(noon_utc(2024, 3, 6)),
            history: Vec::new(),
        };
        stats.record_completion(
            TaskKind::Sequence,
            "Nap",
            noon_utc(2024, 3, 6) + Duration::hours(3),
            SameDayRepeatPolicy::LegacyReset,
        );
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.best_streak, 5);
    }

    #[test]
    fn best_streak_never_decreases() {
        let mut stats = UserStats::default();
        let mut day = noon_utc(2024, 3, 1);
        for _ in 0..4 {
            let before = stats.best_streak;
            stats.record_completion(TaskKind::Math, "Alarm", day, SameDayRepeatPolicy::KeepStreak);
            assert!(stats.best_streak >= before);
            day += Duration::days(1);
        }
        // Break the streak; best stays.
        day += Duration::days(10);
        stats.record_completion(TaskKind::Math, "Alarm", day, SameDayRepeatPolicy::KeepStreak);
        assert_eq!(stats.best_streak, 4);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn history_length_tracks_total_wakes() {
        let mut stats = UserStats::default();
        let mut day = noon_utc(2024, 3, 1);
        for _ in 0..6 {
            stats.record_completion(TaskKind::Qr, "Alarm", day, SameDayRepeatPolicy::KeepStreak);
            day += Duration::days(1);
        }
        assert_eq!(stats.history.len() as u64, stats.total_wakes);
        assert!(stats.best_streak >= stats.current_streak);
    }

    #[test]
    fn serde_uses_camel_case_fields() {
        let stats = UserStats::default();
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("currentStreak").is_some());
        assert!(json.get("totalWakes").is_some());
    }
}

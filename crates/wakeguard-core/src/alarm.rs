//! Alarm definitions and minute matching.
//!
//! Alarms keep the persisted 12-hour `"HH:mm"` time string plus an AM/PM
//! period rather than a 24-hour time. Recurrence is either a weekday set
//! (Monday=0), a single calendar date for one-shot alarms, or neither --
//! an empty weekday set with no date means "every day".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{MinuteStamp, Period};

/// Verification task assigned to an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Math,
    Shake,
    #[serde(rename = "QR")]
    Qr,
    Memory,
    Sequence,
}

impl TaskKind {
    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Math => "Math Challenge",
            TaskKind::Shake => "Shake Phone",
            TaskKind::Qr => "QR Code Scan",
            TaskKind::Memory => "Memory Match",
            TaskKind::Sequence => "Number Sequence",
        }
    }
}

/// Difficulty tier. Affects task parameters only, never scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A single alarm definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    /// 12-hour time string, `"HH:mm"` with hour 1..=12.
    pub time: String,
    pub period: Period,
    pub label: String,
    /// Weekday indices, Monday=0..Sunday=6. Empty means every day unless
    /// `date` is set.
    #[serde(default)]
    pub days: Vec<u8>,
    /// One-shot trigger date. Presence overrides `days` entirely.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub active: bool,
    pub task: TaskKind,
    pub difficulty: Difficulty,
    /// Preset sound name or custom-sound id.
    pub sound: String,
}

impl Alarm {
    /// Create an alarm with a fresh id. Recurrence and activation are set
    /// through the public fields afterwards.
    pub fn new(
        time: impl Into<String>,
        period: Period,
        label: impl Into<String>,
        task: TaskKind,
        difficulty: Difficulty,
        sound: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            time: time.into(),
            period,
            label: label.into(),
            days: Vec::new(),
            date: None,
            active: true,
            task,
            difficulty,
            sound: sound.into(),
        }
    }

    /// Parse the stored `"HH:mm"` string into (hour12, minute).
    ///
    /// A malformed time is `None`, which matching treats as a non-match;
    /// a bad alarm must never wedge the tick.
    pub fn parse_time(&self) -> Option<(u8, u8)> {
        let (h, m) = self.time.split_once(':')?;
        let hour: u8 = h.trim().parse().ok()?;
        let minute: u8 = m.trim().parse().ok()?;
        if (1..=12).contains(&hour) && minute <= 59 {
            Some((hour, minute))
        } else {
            None
        }
    }

    /// Does this alarm fire at the given wall-clock minute?
    pub fn matches(&self, at: &MinuteStamp) -> bool {
        if !self.active {
            return false;
        }
        let Some((hour, minute)) = self.parse_time() else {
            return false;
        };
        if hour != at.hour12 || minute != at.minute || self.period != at.period {
            return false;
        }
        match self.date {
            // One-shot: exact date only, the weekday set is ignored.
            Some(date) => date == at.date,
            // Recurring, with the empty set meaning every day.
            None => self.days.is_empty() || self.days.contains(&at.weekday),
        }
    }

    /// Human-readable recurrence, used by alarm listings and the assistant
    /// context snapshot.
    pub fn recurrence_text(&self) -> String {
        if let Some(date) = self.date {
            return format!("on {date}");
        }
        if self.days.is_empty() || self.days.len() == 7 {
            return "every day".to_string();
        }
        const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        let names: Vec<&str> = self
            .days
            .iter()
            .filter_map(|&d| NAMES.get(d as usize).copied())
            .collect();
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn stamp(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> MinuteStamp {
        MinuteStamp::from_datetime(Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap())
    }

    fn weekday_alarm() -> Alarm {
        let mut alarm = Alarm::new(
            "07:30",
            Period::Am,
            "Work",
            TaskKind::Math,
            Difficulty::Medium,
            "Loud Beep",
        );
        alarm.days = vec![0, 1, 2, 3, 4];
        alarm
    }

    #[test]
    fn fires_on_a_matching_weekday_minute() {
        // 2024-03-06 is a Wednesday.
        assert!(weekday_alarm().matches(&stamp(2024, 3, 6, 7, 30)));
    }

    #[test]
    fn skips_weekends() {
        // 2024-03-09 is a Saturday.
        assert!(!weekday_alarm().matches(&stamp(2024, 3, 9, 7, 30)));
    }

    #[test]
    fn period_must_match() {
        assert!(!weekday_alarm().matches(&stamp(2024, 3, 6, 19, 30)));
    }

    #[test]
    fn inactive_never_matches() {
        let mut alarm = weekday_alarm();
        alarm.active = false;
        assert!(!alarm.matches(&stamp(2024, 3, 6, 7, 30)));
    }

    #[test]
    fn empty_days_means_every_day() {
        let mut alarm = weekday_alarm();
        alarm.days.clear();
        assert!(alarm.matches(&stamp(2024, 3, 9, 7, 30)));
        assert!(alarm.matches(&stamp(2024, 3, 6, 7, 30)));
    }

    #[test]
    fn one_shot_date_overrides_days() {
        let mut alarm = weekday_alarm();
        // Saturday the 9th: excluded by the weekday set, selected by date.
        alarm.date = Some(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert!(alarm.matches(&stamp(2024, 3, 9, 7, 30)));
        // Wednesday the 6th: in the weekday set, but the date wins.
        assert!(!alarm.matches(&stamp(2024, 3, 6, 7, 30)));
    }

    #[test]
    fn unpadded_hour_still_matches() {
        let mut alarm = weekday_alarm();
        alarm.time = "7:30".to_string();
        assert!(alarm.matches(&stamp(2024, 3, 6, 7, 30)));
    }

    #[test]
    fn malformed_time_is_a_non_match() {
        for bad in ["", "7", "7:3x", "25:00", "0:10", "07:61"] {
            let mut alarm = weekday_alarm();
            alarm.time = bad.to_string();
            assert!(!alarm.matches(&stamp(2024, 3, 6, 7, 30)), "matched {bad:?}");
        }
    }

    #[test]
    fn serde_shape_matches_persisted_format() {
        let alarm: Alarm = serde_json::from_str(
            r#"{
                "id": "a1",
                "time": "06:15",
                "period": "AM",
                "label": "Gym",
                "days": [0, 2, 4],
                "active": true,
                "task": "QR",
                "difficulty": "Hard",
                "sound": "Siren"
            }"#,
        )
        .unwrap();
        assert_eq!(alarm.task, TaskKind::Qr);
        assert_eq!(alarm.period, Period::Am);
        assert!(alarm.date.is_none());
    }
}

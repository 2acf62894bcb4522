//! Time source abstraction and wall-clock minute normalization.
//!
//! All matching decisions run against a [`MinuteStamp`]: the current local
//! minute normalized to the 12-hour form alarms are stored in, plus the
//! calendar date and a Monday-based weekday index.

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of "now". The scheduler never reads the system clock directly;
/// the driving loop injects time through this trait.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The host's local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// The scheduler's polling cadence.
pub const TICK_SECONDS: u64 = 1;

/// Interval for driving [`TriggerScheduler::tick`] from an async loop.
/// Missed ticks are skipped rather than burst-delivered; one-second
/// granularity is the accepted accuracy of the whole system.
///
/// [`TriggerScheduler::tick`]: crate::trigger::TriggerScheduler::tick
pub fn tick_interval() -> tokio::time::Interval {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(TICK_SECONDS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    interval
}

/// AM/PM half of the 12-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Period {
    Am,
    Pm,
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Am => write!(f, "AM"),
            Period::Pm => write!(f, "PM"),
        }
    }
}

/// A local wall-clock minute in the normalized form alarms match against.
///
/// Weekday uses Monday=0..Sunday=6, the convention alarm `days` sets are
/// stored in. Chrono's `num_days_from_monday` already yields that index, so
/// no Sunday-based shift is needed here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinuteStamp {
    /// Hour on the 12-hour dial, 1..=12.
    pub hour12: u8,
    pub minute: u8,
    pub period: Period,
    pub date: NaiveDate,
    /// Monday=0 .. Sunday=6.
    pub weekday: u8,
}

impl MinuteStamp {
    pub fn from_datetime(now: DateTime<Local>) -> Self {
        let h = now.hour();
        let period = if h >= 12 { Period::Pm } else { Period::Am };
        let hour12 = match h % 12 {
            0 => 12,
            other => other as u8,
        };
        Self {
            hour12,
            minute: now.minute() as u8,
            period,
            date: now.date_naive(),
            weekday: now.weekday().num_days_from_monday() as u8,
        }
    }

    /// Guard key remembered by the scheduler so one matching minute fires
    /// exactly once: `HH:MM-period-date`.
    pub fn key(&self) -> String {
        format!(
            "{:02}:{:02}-{}-{}",
            self.hour12, self.minute, self.period, self.date
        )
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::TaskKind;

/// How a ringing session came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// Matched the schedule on a tick.
    Schedule,
    /// A pending snooze came due.
    Snooze,
    /// Explicit user preview/simulation.
    Manual,
}

/// Every scheduler state change produces an Event. The driving loop prints
/// or reacts to them; nothing else consumes scheduler internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmTriggered {
        alarm_id: String,
        label: String,
        task: TaskKind,
        source: TriggerSource,
        at: DateTime<Utc>,
    },
    /// Emitted every tick while ringing with the freshly computed volume,
    /// which must be reapplied to the audio output immediately.
    RingingEscalated {
        alarm_id: String,
        elapsed_secs: u64,
        volume: f32,
        max_intensity: bool,
        at: DateTime<Utc>,
    },
    AlarmSnoozed {
        alarm_id: String,
        minutes: u32,
        due: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// Verification succeeded; the ledger was updated exactly once.
    WakeVerified {
        alarm_id: String,
        task: TaskKind,
        elapsed_secs: u64,
        current_streak: u32,
        best_streak: u32,
        total_wakes: u64,
        at: DateTime<Utc>,
    },
}

//! The transient state of one ringing alarm.

use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::task::VerificationTask;

/// Live state between an alarm's trigger and its verification or snooze.
/// Owned exclusively by the scheduler's ringing state; dropped on exit and
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingingSession {
    pub alarm_id: String,
    pub label: String,
    /// Preset name or custom-sound id, resolved by the audio layer.
    pub sound: String,
    pub task: VerificationTask,
    elapsed_secs: u64,
}

impl RingingSession {
    pub fn new(alarm: &Alarm, task: VerificationTask) -> Self {
        Self {
            alarm_id: alarm.id.clone(),
            label: alarm.label.clone(),
            sound: alarm.sound.clone(),
            task,
            elapsed_secs: 0,
        }
    }

    /// Seconds since ringing began.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Advance one second and settle time-delayed task state.
    pub fn tick(&mut self) {
        self.elapsed_secs += 1;
        self.task.settle();
    }
}

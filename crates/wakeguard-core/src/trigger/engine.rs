//! Trigger scheduler implementation.
//!
//! The scheduler is a wall-clock-based state machine. It does not use
//! internal threads - the driving loop is responsible for calling `tick()`
//! once per second with the current time and the alarm set.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Ringing -> Idle
//! ```
//!
//! "Snoozed" is not a separate state: it is Idle with the pending-snooze
//! slot filled. On every idle tick the snooze-due check runs before the
//! fresh-match scan, so a snooze coming due and a different alarm matching
//! in the same second resolve deterministically in favor of the snooze.

use chrono::{DateTime, Duration, Local, Utc};
use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use super::session::RingingSession;
use crate::alarm::{Alarm, TaskKind};
use crate::clock::MinuteStamp;
use crate::escalation::EscalationPolicy;
use crate::events::{Event, TriggerSource};
use crate::task::VerificationTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerState {
    Idle,
    Ringing,
}

/// A deferred re-trigger. At most one exists system-wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSnooze {
    pub alarm_id: String,
    pub due: DateTime<Utc>,
}

/// Result of a successful verification, consumed by the caller to update
/// the stats ledger exactly once.
#[derive(Debug, Clone)]
pub struct CompletedRinging {
    pub alarm_id: String,
    pub label: String,
    pub task: TaskKind,
    pub elapsed_secs: u64,
}

/// Owns the single authoritative idle-to-ringing decision.
///
/// At most one ringing session exists by construction: while ringing, the
/// idle scan is skipped entirely and no alarm can pre-empt the session.
#[derive(Debug)]
pub struct TriggerScheduler {
    policy: EscalationPolicy,
    pending_snooze: Option<PendingSnooze>,
    session: Option<RingingSession>,
    /// `HH:MM-period-date` of the last fresh trigger, so one matching
    /// minute fires exactly once. A single scalar: two alarms matching the
    /// same minute yield one firing, first in repository order.
    last_fired_minute: Option<String>,
    rng: Mcg128Xsl64,
}

impl TriggerScheduler {
    pub fn new(policy: EscalationPolicy) -> Self {
        Self::with_seed(policy, rand::random())
    }

    /// Deterministic task generation, for tests and replay.
    pub fn with_seed(policy: EscalationPolicy, seed: u64) -> Self {
        Self {
            policy,
            pending_snooze: None,
            session: None,
            last_fired_minute: None,
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TriggerState {
        if self.session.is_some() {
            TriggerState::Ringing
        } else {
            TriggerState::Idle
        }
    }

    pub fn session(&self) -> Option<&RingingSession> {
        self.session.as_ref()
    }

    /// Mutable access for routing verification input into the active task.
    pub fn session_mut(&mut self) -> Option<&mut RingingSession> {
        self.session.as_mut()
    }

    pub fn pending_snooze(&self) -> Option<&PendingSnooze> {
        self.pending_snooze.as_ref()
    }

    pub fn escalation(&self) -> &EscalationPolicy {
        &self.policy
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Call once per second. Decides idle-to-ringing transitions and,
    /// while ringing, advances the session and recomputes the effective
    /// volume for immediate reapplication.
    pub fn tick(&mut self, alarms: &[Alarm], now: DateTime<Local>, base_volume: f32) -> Option<Event> {
        if let Some(session) = self.session.as_mut() {
            session.tick();
            let elapsed = session.elapsed_secs();
            return Some(Event::RingingEscalated {
                alarm_id: session.alarm_id.clone(),
                elapsed_secs: elapsed,
                volume: self.policy.effective_volume(elapsed, base_volume),
                max_intensity: self.policy.at_max_intensity(elapsed),
                at: now.with_timezone(&Utc),
            });
        }

        // Snooze-due check always runs before the fresh-match scan.
        let snooze_due = self
            .pending_snooze
            .as_ref()
            .is_some_and(|s| now.with_timezone(&Utc) >= s.due);
        if snooze_due {
            if let Some(snooze) = self.pending_snooze.take() {
                // The snoozed alarm may have been deleted meanwhile; fall
                // back to the first repository alarm.
                let alarm = alarms
                    .iter()
                    .find(|a| a.id == snooze.alarm_id)
                    .or_else(|| alarms.first())
                    .cloned();
                return alarm.map(|a| self.start_ringing(&a, TriggerSource::Snooze, now));
            }
        }

        let stamp = MinuteStamp::from_datetime(now);
        let key = stamp.key();
        if self.last_fired_minute.as_deref() == Some(key.as_str()) {
            return None;
        }
        let matched = alarms.iter().find(|a| a.matches(&stamp))?.clone();
        self.last_fired_minute = Some(key);
        Some(self.start_ringing(&matched, TriggerSource::Schedule, now))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Ring an alarm immediately (user preview). No-op while ringing.
    pub fn trigger_now(&mut self, alarm: &Alarm, now: DateTime<Local>) -> Option<Event> {
        if self.session.is_some() {
            return None;
        }
        Some(self.start_ringing(alarm, TriggerSource::Manual, now))
    }

    /// Defer the active session by `minutes`. Discards all task progress
    /// unconditionally; no stats change.
    pub fn snooze(&mut self, minutes: u32, now: DateTime<Utc>) -> Option<Event> {
        let session = self.session.take()?;
        let due = now + Duration::minutes(i64::from(minutes));
        self.pending_snooze = Some(PendingSnooze {
            alarm_id: session.alarm_id.clone(),
            due,
        });
        Some(Event::AlarmSnoozed {
            alarm_id: session.alarm_id,
            minutes,
            due,
            at: now,
        })
    }

    /// Exit ringing if the verification task is satisfied.
    ///
    /// Clears any queued snooze; the minute guard is left as-is (its minute
    /// has necessarily passed by the time a later duplicate could matter).
    pub fn try_complete(&mut self) -> Option<CompletedRinging> {
        if !self.session.as_ref()?.task.satisfied() {
            return None;
        }
        let session = self.session.take()?;
        self.pending_snooze = None;
        Some(CompletedRinging {
            task: session.task.kind(),
            elapsed_secs: session.elapsed_secs(),
            alarm_id: session.alarm_id,
            label: session.label,
        })
    }

    fn start_ringing(&mut self, alarm: &Alarm, source: TriggerSource, now: DateTime<Local>) -> Event {
        // A fresh ring consumes any outstanding snooze.
        self.pending_snooze = None;
        let task = VerificationTask::new(alarm.task, alarm.difficulty, &mut self.rng);
        self.session = Some(RingingSession::new(alarm, task));
        Event::AlarmTriggered {
            alarm_id: alarm.id.clone(),
            label: alarm.label.clone(),
            task: alarm.task,
            source,
            at: now.with_timezone(&Utc),
        }
    }
}

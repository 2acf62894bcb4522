//! # Wakeguard Core Library
//!
//! Core business logic for Wakeguard, a forced-wake alarm clock: once an
//! alarm fires, a verification task must be completed before the signal is
//! silenced, and volume escalates over time regardless of user settings.
//! The CLI binary drives everything here; a GUI would be a thin layer over
//! the same library.
//!
//! ## Architecture
//!
//! - **Trigger Scheduler**: a wall-clock state machine polled once per
//!   second by the caller; owns the idle-to-ringing decision, the
//!   per-minute trigger guard, and the single ringing session
//! - **Escalation Policy**: pure elapsed-time-to-volume function with a
//!   zero-tolerance full-volume cutoff
//! - **Verification Tasks**: Math, Shake, Memory, Sequence, and QR
//!   challenges behind one tagged union
//! - **Storage**: SQLite key-value mirror of app state plus TOML config
//! - **Audio**: gesture-gated engine rendering preset synthesis profiles
//!   or looping custom payloads
//!
//! ## Key Components
//!
//! - [`TriggerScheduler`]: the scheduling/triggering state machine
//! - [`Controller`]: single owner of app state, mutated through commands
//! - [`EscalationPolicy`]: elapsed-seconds volume policy
//! - [`Store`] / [`Config`]: persistence and configuration

pub mod alarm;
pub mod assistant;
pub mod audio;
pub mod clock;
pub mod controller;
pub mod error;
pub mod escalation;
pub mod events;
pub mod stats;
pub mod storage;
pub mod task;
pub mod trigger;

pub use alarm::{Alarm, Difficulty, TaskKind};
pub use assistant::{AssistantClient, FALLBACK_MESSAGE};
pub use audio::{AudioEngine, AudioSink, CustomSound, NullSink, PRESET_SOUNDS};
pub use clock::{Clock, MinuteStamp, Period, SystemClock};
pub use controller::{AppState, Controller, Settings};
pub use error::{AssistantError, ConfigError, CoreError, StoreError};
pub use escalation::EscalationPolicy;
pub use events::{Event, TriggerSource};
pub use stats::{CompletionRecord, SameDayRepeatPolicy, UserStats};
pub use storage::{Config, Store};
pub use task::VerificationTask;
pub use trigger::{PendingSnooze, RingingSession, TriggerScheduler, TriggerState};

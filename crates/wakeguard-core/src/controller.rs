//! Application state and its command surface.
//!
//! All process-wide mutable state (alarms, stats, settings) lives in one
//! [`AppState`] owned by the [`Controller`]. Mutation happens only through
//! controller commands, each of which writes the touched piece back to the
//! store. Persistence failures are logged and swallowed: the persisted
//! copy may lag in-memory truth, but an alarm must still ring with a
//! broken store.

use chrono::{DateTime, Local, Utc};

use crate::alarm::Alarm;
use crate::audio::{AudioEngine, AudioSink, CustomSound, PlayRequest, SoundSource, PULSE_DURATION_SECS};
use crate::error::CoreError;
use crate::events::Event;
use crate::storage::{Config, Store};
use crate::stats::UserStats;
use crate::task::VerificationTask;
use crate::trigger::{RingingSession, TriggerScheduler, TriggerState};

/// User-tunable settings mirrored piecewise to the store.
#[derive(Debug, Clone)]
pub struct Settings {
    pub default_sound: String,
    pub default_volume: f32,
    pub emergency_dismiss: bool,
    pub caution_accepted: bool,
    pub custom_sounds: Vec<CustomSound>,
}

/// The process-wide application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub alarms: Vec<Alarm>,
    pub stats: UserStats,
    pub settings: Settings,
}

/// Single owner of state, scheduler, and audio engine.
pub struct Controller {
    state: AppState,
    store: Store,
    config: Config,
    scheduler: TriggerScheduler,
    audio: AudioEngine,
}

impl Controller {
    /// Build from a store and config, reading all persisted state once.
    pub fn new(store: Store, config: Config, sink: Box<dyn AudioSink + Send>) -> Self {
        Self::build(store, config, sink, None)
    }

    /// Deterministic task generation, for tests.
    pub fn with_seed(
        store: Store,
        config: Config,
        sink: Box<dyn AudioSink + Send>,
        seed: u64,
    ) -> Self {
        Self::build(store, config, sink, Some(seed))
    }

    fn build(
        store: Store,
        config: Config,
        sink: Box<dyn AudioSink + Send>,
        seed: Option<u64>,
    ) -> Self {
        let state = AppState {
            alarms: store.load_alarms(),
            stats: store.load_stats(),
            settings: Settings {
                default_sound: store.load_default_sound(),
                default_volume: store.load_default_volume(),
                emergency_dismiss: store.load_emergency_dismiss(),
                caution_accepted: store.load_caution_accepted(),
                custom_sounds: store.load_custom_sounds(),
            },
        };
        let policy = config.escalation_policy();
        let scheduler = match seed {
            Some(seed) => TriggerScheduler::with_seed(policy, seed),
            None => TriggerScheduler::new(policy),
        };
        Self {
            state,
            store,
            config,
            scheduler,
            audio: AudioEngine::new(sink),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.state.alarms
    }

    pub fn stats(&self) -> &UserStats {
        &self.state.stats
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.scheduler.state()
    }

    pub fn session(&self) -> Option<&RingingSession> {
        self.scheduler.session()
    }

    /// The active verification task, for input routing.
    pub fn task_mut(&mut self) -> Option<&mut VerificationTask> {
        self.scheduler.session_mut().map(|s| &mut s.task)
    }

    // ── Alarm commands ───────────────────────────────────────────────

    pub fn add_alarm(&mut self, alarm: Alarm) {
        self.state.alarms.push(alarm);
        self.persist_alarms();
    }

    /// Replace the alarm with the same id. Returns false if unknown.
    pub fn update_alarm(&mut self, alarm: Alarm) -> bool {
        match self.state.alarms.iter_mut().find(|a| a.id == alarm.id) {
            Some(slot) => {
                *slot = alarm;
                self.persist_alarms();
                true
            }
            None => false,
        }
    }

    pub fn delete_alarm(&mut self, id: &str) -> bool {
        let before = self.state.alarms.len();
        self.state.alarms.retain(|a| a.id != id);
        let deleted = self.state.alarms.len() != before;
        if deleted {
            self.persist_alarms();
        }
        deleted
    }

    /// Flip one alarm's active flag. Returns the new value.
    pub fn toggle_alarm(&mut self, id: &str) -> Option<bool> {
        let active = {
            let alarm = self.state.alarms.iter_mut().find(|a| a.id == id)?;
            alarm.active = !alarm.active;
            alarm.active
        };
        self.persist_alarms();
        Some(active)
    }

    pub fn set_all_alarms(&mut self, active: bool) {
        for alarm in &mut self.state.alarms {
            alarm.active = active;
        }
        self.persist_alarms();
    }

    // ── Settings commands ────────────────────────────────────────────

    pub fn add_custom_sound(&mut self, sound: CustomSound) {
        self.state.settings.custom_sounds.push(sound);
        if let Err(err) = self.store.save_custom_sounds(&self.state.settings.custom_sounds) {
            log::warn!("persisting custom sounds failed: {err}");
        }
    }

    pub fn set_default_sound(&mut self, name: impl Into<String>) {
        self.state.settings.default_sound = name.into();
        if let Err(err) = self.store.save_default_sound(&self.state.settings.default_sound) {
            log::warn!("persisting default sound failed: {err}");
        }
    }

    pub fn set_default_volume(&mut self, volume: f32) {
        self.state.settings.default_volume = volume.clamp(0.0, 1.0);
        if let Err(err) = self.store.save_default_volume(self.state.settings.default_volume) {
            log::warn!("persisting default volume failed: {err}");
        }
    }

    pub fn set_emergency_dismiss(&mut self, enabled: bool) {
        self.state.settings.emergency_dismiss = enabled;
        if let Err(err) = self.store.save_emergency_dismiss(enabled) {
            log::warn!("persisting emergency dismiss failed: {err}");
        }
    }

    pub fn accept_caution(&mut self) {
        self.state.settings.caution_accepted = true;
        if let Err(err) = self.store.save_caution_accepted(true) {
            log::warn!("persisting caution acceptance failed: {err}");
        }
        // Accepting the disclaimer is a user gesture.
        self.audio.user_gesture();
    }

    /// Any qualifying user interaction: unlocks audio and retries deferred
    /// playback.
    pub fn user_gesture(&mut self) {
        self.audio.user_gesture();
    }

    // ── Ringing commands ─────────────────────────────────────────────

    /// Drive the scheduler one second forward and apply its audio output.
    pub fn tick(&mut self, now: DateTime<Local>) -> Option<Event> {
        let base = self.state.settings.default_volume;
        let event = self.scheduler.tick(&self.state.alarms, now, base)?;
        match &event {
            Event::AlarmTriggered { .. } => {
                let volume = self.scheduler.escalation().effective_volume(0, base);
                self.play_session_sound(volume, 0);
            }
            Event::RingingEscalated { volume, elapsed_secs, .. } => {
                self.play_session_sound(*volume, *elapsed_secs);
            }
            _ => {}
        }
        Some(event)
    }

    /// Ring an alarm immediately (preview). No-op while already ringing.
    pub fn ring_now(&mut self, id: &str, now: DateTime<Local>) -> Option<Event> {
        let alarm = self.state.alarms.iter().find(|a| a.id == id)?.clone();
        let event = self.scheduler.trigger_now(&alarm, now)?;
        let base = self.state.settings.default_volume;
        let volume = self.scheduler.escalation().effective_volume(0, base);
        self.play_session_sound(volume, 0);
        Some(event)
    }

    /// Defer the ringing alarm. Only available with emergency dismiss
    /// enabled; snoozing is the sole path out of ringing short of
    /// verification.
    pub fn snooze(&mut self, minutes: u32, now: DateTime<Utc>) -> Result<Event, CoreError> {
        if !self.state.settings.emergency_dismiss {
            return Err(CoreError::Custom(
                "snooze is disabled; enable emergency dismiss first".to_string(),
            ));
        }
        let event = self
            .scheduler
            .snooze(minutes, now)
            .ok_or_else(|| CoreError::Custom("no alarm is ringing".to_string()))?;
        self.audio.stop();
        Ok(event)
    }

    /// Complete the ringing session if its task is satisfied. Updates the
    /// ledger exactly once and silences the audio.
    pub fn complete_task(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let done = self.scheduler.try_complete()?;
        self.state.stats.record_completion(
            done.task,
            &done.label,
            now,
            self.config.same_day_policy(),
        );
        if let Err(err) = self.store.save_stats(&self.state.stats) {
            log::warn!("persisting stats failed: {err}");
        }
        self.audio.stop();
        Some(Event::WakeVerified {
            alarm_id: done.alarm_id,
            task: done.task,
            elapsed_secs: done.elapsed_secs,
            current_streak: self.state.stats.current_streak,
            best_streak: self.state.stats.best_streak,
            total_wakes: self.state.stats.total_wakes,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn persist_alarms(&self) {
        if let Err(err) = self.store.save_alarms(&self.state.alarms) {
            log::warn!("persisting alarms failed: {err}");
        }
    }

    fn play_session_sound(&mut self, volume: f32, elapsed_secs: u64) {
        let Some(sound) = self.scheduler.session().map(|s| s.sound.clone()) else {
            return;
        };
        let source = match self
            .state
            .settings
            .custom_sounds
            .iter()
            .find(|c| c.id == sound)
        {
            Some(custom) => SoundSource::Custom(custom.clone()),
            None => SoundSource::Preset(sound),
        };
        self.audio.play(PlayRequest {
            sound: source,
            volume,
            duration_secs: PULSE_DURATION_SECS,
            elapsed_secs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Difficulty, TaskKind};
    use crate::audio::NullSink;
    use crate::clock::Period;
    use chrono::TimeZone;

    fn controller() -> Controller {
        let store = Store::open_memory().unwrap();
        Controller::with_seed(store, Config::default(), Box::new(NullSink), 11)
    }

    fn wednesday(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 6, h, m, s).unwrap()
    }

    fn weekday_alarm(time: &str) -> Alarm {
        let mut alarm = Alarm::new(
            time,
            Period::Am,
            "Work",
            TaskKind::Math,
            Difficulty::Easy,
            "Loud Beep",
        );
        alarm.days = vec![0, 1, 2, 3, 4];
        alarm
    }

    #[test]
    fn crud_commands_mutate_state() {
        let mut ctl = controller();
        let alarm = weekday_alarm("07:30");
        let id = alarm.id.clone();
        ctl.add_alarm(alarm);
        assert_eq!(ctl.alarms().len(), 1);

        assert_eq!(ctl.toggle_alarm(&id), Some(false));
        assert_eq!(ctl.toggle_alarm(&id), Some(true));
        assert!(ctl.toggle_alarm("missing").is_none());

        ctl.set_all_alarms(false);
        assert!(ctl.alarms().iter().all(|a| !a.active));

        let mut edited = ctl.alarms()[0].clone();
        edited.time = "08:15".to_string();
        edited.label = "Late start".to_string();
        assert!(ctl.update_alarm(edited));
        assert_eq!(ctl.alarms()[0].time, "08:15");
        let mut unknown = ctl.alarms()[0].clone();
        unknown.id = "missing".to_string();
        assert!(!ctl.update_alarm(unknown));

        assert!(ctl.delete_alarm(&id));
        assert!(!ctl.delete_alarm(&id));
        assert!(ctl.alarms().is_empty());
    }

    #[test]
    fn full_enforcement_flow_updates_stats_once() {
        let mut ctl = controller();
        ctl.add_alarm(weekday_alarm("07:30"));

        let event = ctl.tick(wednesday(7, 30, 0));
        assert!(matches!(event, Some(Event::AlarmTriggered { .. })));
        assert_eq!(ctl.trigger_state(), TriggerState::Ringing);

        // Completion refused while unsolved.
        assert!(ctl.complete_task(Utc::now()).is_none());

        match ctl.task_mut() {
            Some(VerificationTask::Math(task)) => {
                let answer = task.solution().to_string();
                assert!(task.answer(&answer));
            }
            other => panic!("expected math task, got {other:?}"),
        }
        let event = ctl.complete_task(Utc::now()).expect("verified");
        match event {
            Event::WakeVerified { current_streak, total_wakes, .. } => {
                assert_eq!(current_streak, 1);
                assert_eq!(total_wakes, 1);
            }
            other => panic!("expected WakeVerified, got {other:?}"),
        }
        assert_eq!(ctl.trigger_state(), TriggerState::Idle);
        assert_eq!(ctl.stats().history.len(), 1);
    }

    #[test]
    fn snooze_is_gated_by_emergency_dismiss() {
        let mut ctl = controller();
        let alarm = weekday_alarm("07:30");
        let id = alarm.id.clone();
        ctl.add_alarm(alarm);
        ctl.ring_now(&id, wednesday(10, 0, 0));

        assert!(ctl.snooze(5, Utc::now()).is_err());
        assert_eq!(ctl.trigger_state(), TriggerState::Ringing);

        ctl.set_emergency_dismiss(true);
        assert!(ctl.snooze(5, Utc::now()).is_ok());
        assert_eq!(ctl.trigger_state(), TriggerState::Idle);
    }

    #[test]
    fn ring_now_previews_an_alarm() {
        let mut ctl = controller();
        let alarm = weekday_alarm("11:00");
        let id = alarm.id.clone();
        ctl.add_alarm(alarm);

        let event = ctl.ring_now(&id, wednesday(15, 4, 0));
        assert!(matches!(event, Some(Event::AlarmTriggered { .. })));
        // Second preview while ringing is refused.
        assert!(ctl.ring_now(&id, wednesday(15, 4, 1)).is_none());
    }

    #[test]
    fn mutations_write_through_to_store() {
        let store = Store::open_memory().unwrap();
        let mut ctl = Controller::with_seed(store, Config::default(), Box::new(NullSink), 3);
        ctl.add_alarm(weekday_alarm("07:30"));
        ctl.set_default_volume(0.4);
        ctl.set_default_sound("Siren");
        ctl.set_emergency_dismiss(true);

        // The same store handle backs the controller; re-read through it.
        assert_eq!(ctl.store.load_alarms().len(), 1);
        assert_eq!(ctl.store.load_default_volume(), 0.4);
        assert_eq!(ctl.store.load_default_sound(), "Siren");
        assert!(ctl.store.load_emergency_dismiss());
    }
}

//! SQLite-backed key-value mirror of application state.
//!
//! The store is written after every mutation of the respective piece of
//! state and read back only at process start. Corrupt payloads are never
//! surfaced: every loader falls back to its default value so a broken
//! store cannot keep an alarm from ringing.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::alarm::Alarm;
use crate::audio::CustomSound;
use crate::error::{CoreError, StoreError};
use crate::stats::{CompletionRecord, UserStats};

const KEY_ALARMS: &str = "alarms";
const KEY_STATS: &str = "stats";
const KEY_DEFAULT_SOUND: &str = "default_sound";
const KEY_DEFAULT_VOLUME: &str = "default_volume";
const KEY_CUSTOM_SOUNDS: &str = "custom_sounds";
const KEY_EMERGENCY_DISMISS: &str = "emergency_dismiss";
const KEY_CAUTION_ACCEPTED: &str = "caution_accepted";

const DEFAULT_SOUND: &str = "Loud Beep";
const DEFAULT_VOLUME: f32 = 0.7;

/// Key-value store at `~/.config/wakeguard/wakeguard.db`.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store, creating the schema if needed.
    pub fn open() -> Result<Self, CoreError> {
        Self::open_at(data_dir()?.join("wakeguard.db"))
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: impl Into<std::path::PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let conn = Connection::open(&path)
            .map_err(|source| StoreError::OpenFailed { path, source })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store, for tests.
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|source| StoreError::OpenFailed { path: ":memory:".into(), source })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.kv_get(key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("discarding corrupt '{key}' payload: {err}");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(err) => {
                log::warn!("store read for '{key}' failed: {err}");
                T::default()
            }
        }
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        self.kv_set(key, &json)
    }

    // ── Alarms ───────────────────────────────────────────────────────

    pub fn load_alarms(&self) -> Vec<Alarm> {
        self.load_json(KEY_ALARMS)
    }

    pub fn save_alarms(&self, alarms: &[Alarm]) -> Result<(), StoreError> {
        self.save_json(KEY_ALARMS, &alarms)
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// Load stats, upgrading history entries persisted in the legacy
    /// bare-string-date format.
    pub fn load_stats(&self) -> UserStats {
        let raw: RawStats = self.load_json(KEY_STATS);
        raw.into_stats()
    }

    pub fn save_stats(&self, stats: &UserStats) -> Result<(), StoreError> {
        self.save_json(KEY_STATS, stats)
    }

    // ── Sound settings ───────────────────────────────────────────────

    pub fn load_default_sound(&self) -> String {
        match self.kv_get(KEY_DEFAULT_SOUND) {
            Ok(Some(name)) if !name.is_empty() => name,
            _ => DEFAULT_SOUND.to_string(),
        }
    }

    pub fn save_default_sound(&self, name: &str) -> Result<(), StoreError> {
        self.kv_set(KEY_DEFAULT_SOUND, name)
    }

    pub fn load_default_volume(&self) -> f32 {
        match self.kv_get(KEY_DEFAULT_VOLUME) {
            Ok(Some(raw)) => raw.parse().unwrap_or(DEFAULT_VOLUME),
            _ => DEFAULT_VOLUME,
        }
    }

    pub fn save_default_volume(&self, volume: f32) -> Result<(), StoreError> {
        self.kv_set(KEY_DEFAULT_VOLUME, &volume.clamp(0.0, 1.0).to_string())
    }

    pub fn load_custom_sounds(&self) -> Vec<CustomSound> {
        self.load_json(KEY_CUSTOM_SOUNDS)
    }

    pub fn save_custom_sounds(&self, sounds: &[CustomSound]) -> Result<(), StoreError> {
        self.save_json(KEY_CUSTOM_SOUNDS, &sounds)
    }

    // ── Flags ────────────────────────────────────────────────────────

    pub fn load_emergency_dismiss(&self) -> bool {
        matches!(self.kv_get(KEY_EMERGENCY_DISMISS), Ok(Some(v)) if v == "true")
    }

    pub fn save_emergency_dismiss(&self, enabled: bool) -> Result<(), StoreError> {
        self.kv_set(KEY_EMERGENCY_DISMISS, if enabled { "true" } else { "false" })
    }

    pub fn load_caution_accepted(&self) -> bool {
        matches!(self.kv_get(KEY_CAUTION_ACCEPTED), Ok(Some(v)) if v == "true")
    }

    pub fn save_caution_accepted(&self, accepted: bool) -> Result<(), StoreError> {
        self.kv_set(KEY_CAUTION_ACCEPTED, if accepted { "true" } else { "false" })
    }
}

/// Persisted stats shape with migration support: history entries were once
/// bare ISO date strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    #[serde(default)]
    current_streak: u32,
    #[serde(default)]
    best_streak: u32,
    #[serde(default)]
    total_wakes: u64,
    #[serde(default)]
    last_wake_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    history: Vec<RawHistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawHistoryEntry {
    Record(CompletionRecord),
    Legacy(String),
}

impl RawStats {
    fn into_stats(self) -> UserStats {
        use crate::alarm::TaskKind;

        let history = self
            .history
            .into_iter()
            .filter_map(|entry| match entry {
                RawHistoryEntry::Record(record) => Some(record),
                RawHistoryEntry::Legacy(date) => match date.parse() {
                    Ok(date) => Some(CompletionRecord {
                        date,
                        task: TaskKind::Math,
                        label: "Legacy Alarm".to_string(),
                    }),
                    Err(err) => {
                        log::warn!("dropping unparsable legacy history date {date:?}: {err}");
                        None
                    }
                },
            })
            .collect();
        UserStats {
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            total_wakes: self.total_wakes,
            last_wake_date: self.last_wake_date,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{Difficulty, TaskKind};
    use crate::clock::Period;

    fn store() -> Store {
        Store::open_memory().unwrap()
    }

    #[test]
    fn alarms_roundtrip() {
        let store = store();
        let alarm = Alarm::new(
            "06:45",
            Period::Am,
            "Run",
            TaskKind::Sequence,
            Difficulty::Medium,
            "Siren",
        );
        store.save_alarms(&[alarm.clone()]).unwrap();
        let loaded = store.load_alarms();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, alarm.id);
        assert_eq!(loaded[0].time, "06:45");
    }

    #[test]
    fn corrupt_alarm_payload_falls_back_to_empty() {
        let store = store();
        store.kv_set(KEY_ALARMS, "{ not json").unwrap();
        assert!(store.load_alarms().is_empty());
    }

    #[test]
    fn missing_keys_yield_defaults() {
        let store = store();
        assert!(store.load_alarms().is_empty());
        assert_eq!(store.load_default_sound(), "Loud Beep");
        assert_eq!(store.load_default_volume(), 0.7);
        assert!(!store.load_emergency_dismiss());
        assert!(!store.load_caution_accepted());
        assert_eq!(store.load_stats().total_wakes, 0);
    }

    #[test]
    fn volume_roundtrip_clamps() {
        let store = store();
        store.save_default_volume(1.8).unwrap();
        assert_eq!(store.load_default_volume(), 1.0);
        store.save_default_volume(0.35).unwrap();
        assert_eq!(store.load_default_volume(), 0.35);
    }

    #[test]
    fn garbage_volume_string_falls_back() {
        let store = store();
        store.kv_set(KEY_DEFAULT_VOLUME, "loud").unwrap();
        assert_eq!(store.load_default_volume(), 0.7);
    }

    #[test]
    fn legacy_history_strings_are_upgraded() {
        let store = store();
        store
            .kv_set(
                KEY_STATS,
                r#"{
                    "currentStreak": 2,
                    "bestStreak": 4,
                    "totalWakes": 2,
                    "history": [
                        "2023-11-02T06:30:00Z",
                        {"date": "2023-11-03T06:30:00Z", "task": "Shake", "label": "Gym"}
                    ]
                }"#,
            )
            .unwrap();
        let stats = store.load_stats();
        assert_eq!(stats.history.len(), 2);
        assert_eq!(stats.history[0].task, TaskKind::Math);
        assert_eq!(stats.history[0].label, "Legacy Alarm");
        assert_eq!(stats.history[1].task, TaskKind::Shake);
        assert_eq!(stats.current_streak, 2);
    }

    #[test]
    fn flags_roundtrip() {
        let store = store();
        store.save_emergency_dismiss(true).unwrap();
        store.save_caution_accepted(true).unwrap();
        assert!(store.load_emergency_dismiss());
        assert!(store.load_caution_accepted());
    }

    #[test]
    fn custom_sounds_roundtrip() {
        let store = store();
        let sound = CustomSound {
            id: "c1".to_string(),
            name: "Rooster".to_string(),
            data: "YWJj".to_string(),
        };
        store.save_custom_sounds(&[sound]).unwrap();
        let loaded = store.load_custom_sounds();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Rooster");
    }
}

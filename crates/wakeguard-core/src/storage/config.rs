//! TOML-based application configuration.
//!
//! Holds the tunables that are deliberately not part of the mirrored
//! app state: escalation thresholds, streak policy, snooze choices, and
//! the assistant endpoint. Stored at `~/.config/wakeguard/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::escalation::EscalationPolicy;
use crate::stats::SameDayRepeatPolicy;

/// Escalation tunables. The full-volume cutoff is the single authoritative
/// constant; there are no per-backend thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_full_volume_after")]
    pub full_volume_after_secs: u64,
    #[serde(default = "default_ramp_duration")]
    pub ramp_duration_secs: u64,
}

/// Streak behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Reproduce the original source's collapse of a same-day second
    /// completion to a streak of 1.
    #[serde(default)]
    pub legacy_same_day_reset: bool,
}

/// Snooze menu offered from the ringing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnoozeConfig {
    #[serde(default = "default_snooze_choices")]
    pub minute_choices: Vec<u32>,
}

/// External text-generation service used by the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Unset means the assistant is unavailable and answers with its
    /// static fallback message.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_assistant_model")]
    pub model: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/wakeguard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub escalation: EscalationConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub snooze: SnoozeConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

fn default_full_volume_after() -> u64 {
    40
}
fn default_ramp_duration() -> u64 {
    15
}
fn default_snooze_choices() -> Vec<u32> {
    vec![2, 5, 10, 15, 20, 30]
}
fn default_assistant_model() -> String {
    "wakeguard-assistant".into()
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            full_volume_after_secs: default_full_volume_after(),
            ramp_duration_secs: default_ramp_duration(),
        }
    }
}

impl Default for SnoozeConfig {
    fn default() -> Self {
        Self {
            minute_choices: default_snooze_choices(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: default_assistant_model(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            escalation: EscalationConfig::default(),
            streak: StreakConfig::default(),
            snooze: SnoozeConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/wakeguard"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing the default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning the default on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            log::warn!("using default config: {err}");
            Self::default()
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    pub fn escalation_policy(&self) -> EscalationPolicy {
        EscalationPolicy {
            full_volume_after_secs: self.escalation.full_volume_after_secs,
            ramp_duration_secs: self.escalation.ramp_duration_secs,
            ..EscalationPolicy::default()
        }
    }

    pub fn same_day_policy(&self) -> SameDayRepeatPolicy {
        if self.streak.legacy_same_day_reset {
            SameDayRepeatPolicy::LegacyReset
        } else {
            SameDayRepeatPolicy::KeepStreak
        }
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key and persist it. The new
    /// value is coerced to the type of the existing one.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let (parents, leaf) = match key.rsplit_once('.') {
            Some((p, l)) => (Some(p), l),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut target = &mut json;
        if let Some(parents) = parents {
            for part in parents.split('.') {
                target = target
                    .get_mut(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
            }
        }
        let object = target
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = object
            .get(leaf)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<u64>() {
                    serde_json::Value::Number(n.into())
                } else if let Ok(n) = value.parse::<f64>() {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as number")));
                }
            }
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            // Strings and currently-null optionals take the raw text.
            _ => serde_json::Value::String(value.to_string()),
        };
        object.insert(leaf.to_string(), new_value);

        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.escalation.full_volume_after_secs, 40);
        assert_eq!(parsed.snooze.minute_choices, vec![2, 5, 10, 15, 20, 30]);
        assert!(!parsed.streak.legacy_same_day_reset);
    }

    #[test]
    fn empty_toml_gets_full_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.escalation.ramp_duration_secs, 15);
        assert!(parsed.assistant.endpoint.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(
            cfg.get("escalation.full_volume_after_secs").as_deref(),
            Some("40")
        );
        assert_eq!(
            cfg.get("streak.legacy_same_day_reset").as_deref(),
            Some("false")
        );
        assert!(cfg.get("escalation.missing").is_none());
    }

    #[test]
    fn escalation_policy_carries_config_thresholds() {
        let mut cfg = Config::default();
        cfg.escalation.full_volume_after_secs = 45;
        let policy = cfg.escalation_policy();
        assert_eq!(policy.full_volume_after_secs, 45);
        assert_eq!(policy.ramp_start_ratio, 0.2);
    }

    #[test]
    fn same_day_policy_follows_flag() {
        let mut cfg = Config::default();
        assert_eq!(cfg.same_day_policy(), SameDayRepeatPolicy::KeepStreak);
        cfg.streak.legacy_same_day_reset = true;
        assert_eq!(cfg.same_day_policy(), SameDayRepeatPolicy::LegacyReset);
    }
}

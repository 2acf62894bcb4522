//! Time-driven volume escalation.
//!
//! While an alarm rings, the effective playback volume is a pure function of
//! elapsed seconds and the configured base volume. Past the full-volume
//! cutoff the user's volume preference is deliberately ignored: the signal
//! is pinned at maximum until the verification task is solved or the alarm
//! is snoozed.

use serde::{Deserialize, Serialize};

/// Escalation thresholds. One authoritative set of constants -- the cutoff
/// in particular is a single configurable value, not a per-backend one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationPolicy {
    /// Elapsed seconds after which volume is forced to 1.0.
    pub full_volume_after_secs: u64,
    /// Seconds over which the ramp climbs from the start ratio to base.
    pub ramp_duration_secs: u64,
    /// Fraction of base volume the ramp starts at.
    pub ramp_start_ratio: f32,
    /// Lower bound applied while ramping so the signal is always audible.
    pub min_audible: f32,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            full_volume_after_secs: 40,
            ramp_duration_secs: 15,
            ramp_start_ratio: 0.2,
            min_audible: 0.1,
        }
    }
}

impl EscalationPolicy {
    /// Effective playback volume in [0, 1] for the given ringing age.
    ///
    /// Idempotent and side-effect-free; callers recompute it every tick and
    /// reapply the result to the active audio output.
    pub fn effective_volume(&self, elapsed_secs: u64, base_volume: f32) -> f32 {
        if elapsed_secs > self.full_volume_after_secs {
            return 1.0;
        }
        let target = base_volume.clamp(0.0, 1.0);
        if elapsed_secs >= self.ramp_duration_secs {
            return target;
        }
        let progress = elapsed_secs as f32 / self.ramp_duration_secs as f32;
        let ratio = self.ramp_start_ratio + (1.0 - self.ramp_start_ratio) * progress;
        (target * ratio).max(self.min_audible)
    }

    /// Has the zero-tolerance cutoff been reached?
    pub fn at_max_intensity(&self, elapsed_secs: u64) -> bool {
        elapsed_secs > self.full_volume_after_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ramp_scenario_values() {
        let policy = EscalationPolicy::default();
        assert!((policy.effective_volume(0, 0.7) - 0.14).abs() < 1e-6);
        assert!((policy.effective_volume(15, 0.7) - 0.7).abs() < 1e-6);
        assert_eq!(policy.effective_volume(41, 0.7), 1.0);
    }

    #[test]
    fn cutoff_ignores_base_volume() {
        let policy = EscalationPolicy::default();
        assert_eq!(policy.effective_volume(41, 0.0), 1.0);
        assert_eq!(policy.effective_volume(120, 0.05), 1.0);
    }

    #[test]
    fn at_cutoff_itself_the_ramp_target_still_applies() {
        // The override is strictly greater-than, matching the source.
        let policy = EscalationPolicy::default();
        assert!((policy.effective_volume(40, 0.7) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn floor_keeps_quiet_bases_audible_during_ramp() {
        let policy = EscalationPolicy::default();
        assert!((policy.effective_volume(0, 0.2) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn max_intensity_flag_tracks_cutoff() {
        let policy = EscalationPolicy::default();
        assert!(!policy.at_max_intensity(40));
        assert!(policy.at_max_intensity(41));
    }

    proptest! {
        // Non-decreasing over the ramp window for any fixed base volume.
        #[test]
        fn ramp_is_monotonic(base in 0.0f32..=1.0, secs in 0u64..15) {
            let policy = EscalationPolicy::default();
            let earlier = policy.effective_volume(secs, base);
            let later = policy.effective_volume(secs + 1, base);
            prop_assert!(later >= earlier - 1e-6);
        }

        // Ceiling holds for every base volume past the cutoff.
        #[test]
        fn ceiling_past_cutoff(base in 0.0f32..=1.0, extra in 1u64..10_000) {
            let policy = EscalationPolicy::default();
            prop_assert_eq!(policy.effective_volume(40 + extra, base), 1.0);
        }

        // Output is always a valid volume.
        #[test]
        fn output_in_unit_range(base in -1.0f32..=2.0, secs in 0u64..10_000) {
            let policy = EscalationPolicy::default();
            let v = policy.effective_volume(secs, base);
            prop_assert!((0.0..=1.0).contains(&v));
        }
    }
}

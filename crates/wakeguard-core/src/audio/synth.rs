//! Preset sound profiles rendered as synthesis commands.
//!
//! Exact waveform fidelity is out of scope: a [`Tone`] describes one pulse
//! of a preset (waveform plus frequency/gain envelopes over a short
//! duration) and any backend that honors the envelope contract can play
//! it. Several profiles take the elapsed-seconds context and climb in
//! pitch with it, the urgency channel layered on top of volume escalation.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Oscillator waveform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// How a value reaches its target at `at_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ramp {
    /// Jump to the value at that instant.
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreqStep {
    pub at_secs: f32,
    pub hz: f32,
    pub ramp: Ramp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainStep {
    pub at_secs: f32,
    pub level: f32,
    pub ramp: Ramp,
}

impl FreqStep {
    fn set(at_secs: f32, hz: f32) -> Self {
        Self { at_secs, hz, ramp: Ramp::Set }
    }
    fn lin(at_secs: f32, hz: f32) -> Self {
        Self { at_secs, hz, ramp: Ramp::Linear }
    }
    fn exp(at_secs: f32, hz: f32) -> Self {
        Self { at_secs, hz, ramp: Ramp::Exponential }
    }
}

impl GainStep {
    fn set(at_secs: f32, level: f32) -> Self {
        Self { at_secs, level, ramp: Ramp::Set }
    }
    fn lin(at_secs: f32, level: f32) -> Self {
        Self { at_secs, level, ramp: Ramp::Linear }
    }
    fn exp(at_secs: f32, level: f32) -> Self {
        Self { at_secs, level, ramp: Ramp::Exponential }
    }
}

/// One synthesized pulse, replayed every second while ringing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub waveform: Waveform,
    pub frequency: Vec<FreqStep>,
    pub gain: Vec<GainStep>,
    pub duration_secs: f32,
}

/// Render one pulse of a preset profile.
///
/// Unknown names fall back to the default beep, so a stale sound id on an
/// alarm can never silence it.
pub fn render_preset(name: &str, volume: f32, duration_secs: f32, elapsed_secs: u64) -> Tone {
    let v = volume.min(1.0);
    let elapsed = elapsed_secs as f32;
    let (waveform, frequency, gain) = match name {
        "Radar" => (
            Waveform::Square,
            vec![FreqStep::set(0.0, 2000.0)],
            vec![
                GainStep::set(0.0, 0.8 * v),
                GainStep::set(0.1, 0.0),
                GainStep::set(0.2, 0.8 * v),
                GainStep::set(0.3, 0.0),
            ],
        ),
        "Nuclear" => (
            Waveform::Sawtooth,
            vec![
                FreqStep::set(0.0, 1200.0),
                FreqStep::set(0.2, 600.0),
                FreqStep::set(0.4, 1200.0),
            ],
            vec![GainStep::set(0.0, v), GainStep::exp(0.6, 0.01)],
        ),
        "Submarine" => (
            Waveform::Sine,
            vec![FreqStep::set(0.0, 400.0), FreqStep::exp(1.2, 100.0)],
            vec![GainStep::set(0.0, 0.7 * v), GainStep::exp(1.2, 0.01)],
        ),
        "Orbit" => (
            Waveform::Sine,
            vec![FreqStep::set(0.0, 300.0), FreqStep::exp(0.8, 3000.0)],
            vec![GainStep::set(0.0, 0.5 * v), GainStep::exp(1.0, 0.01)],
        ),
        "Static" => (
            Waveform::Square,
            vec![FreqStep::set(0.0, rand::thread_rng().gen_range(100.0..5100.0))],
            vec![GainStep::set(0.0, v), GainStep::exp(0.3, 0.01)],
        ),
        "Cyber Pulse" => (
            Waveform::Sawtooth,
            vec![
                FreqStep::set(0.0, 100.0),
                FreqStep::exp(0.1, 2000.0),
                FreqStep::exp(0.2, 100.0),
            ],
            vec![GainStep::set(0.0, 0.8 * v), GainStep::exp(0.2, 0.01)],
        ),
        "Classic Bell" => (
            Waveform::Sine,
            vec![FreqStep::set(0.0, 880.0)],
            vec![GainStep::set(0.0, v), GainStep::exp(1.2, 0.01)],
        ),
        "Zen Strings" => (
            Waveform::Triangle,
            vec![
                FreqStep::set(0.0, 220.0),
                FreqStep::lin(1.0, 440.0 + elapsed * 10.0),
            ],
            vec![GainStep::set(0.0, 0.3 * v), GainStep::lin(1.0, 0.8 * v)],
        ),
        "Industrial Tech" => (
            Waveform::Square,
            vec![FreqStep::set(0.0, 50.0), FreqStep::set(0.1, 60.0)],
            vec![
                GainStep::set(0.0, v),
                GainStep::set(0.05, 0.0),
                GainStep::set(0.1, v),
            ],
        ),
        "Siren" => (
            Waveform::Sawtooth,
            vec![
                FreqStep::set(0.0, 440.0 + elapsed),
                FreqStep::exp(0.5, 880.0 + elapsed),
            ],
            vec![GainStep::set(0.0, 0.5 * v), GainStep::exp(1.0, 0.01)],
        ),
        "Morning Bell" => (
            Waveform::Sine,
            vec![FreqStep::set(0.0, 1200.0)],
            vec![GainStep::set(0.0, v), GainStep::exp(0.8, 0.01)],
        ),
        // "Loud Beep", "Digital Alarm" and anything unrecognized.
        other => (
            Waveform::Square,
            vec![FreqStep::set(0.0, if other == "Digital Alarm" { 2000.0 } else { 2200.0 })],
            vec![
                GainStep::set(0.0, 0.6 * v),
                GainStep::set(0.1, 0.0),
                GainStep::set(0.2, 0.6 * v),
            ],
        ),
    };
    Tone {
        waveform,
        frequency,
        gain,
        duration_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn siren_pitch_climbs_with_elapsed_time() {
        let early = render_preset("Siren", 0.5, 1.5, 0);
        let late = render_preset("Siren", 0.5, 1.5, 30);
        assert_eq!(early.frequency[0].hz, 440.0);
        assert_eq!(late.frequency[0].hz, 470.0);
        assert_eq!(late.frequency[1].hz, 910.0);
    }

    #[test]
    fn zen_strings_target_rises_with_elapsed_time() {
        let tone = render_preset("Zen Strings", 1.0, 1.5, 12);
        assert_eq!(tone.waveform, Waveform::Triangle);
        assert_eq!(tone.frequency[1].hz, 440.0 + 120.0);
    }

    #[test]
    fn volume_scales_gain_levels() {
        let tone = render_preset("Classic Bell", 0.5, 1.5, 0);
        assert_eq!(tone.gain[0].level, 0.5);
        let tone = render_preset("Radar", 0.5, 1.5, 0);
        assert!((tone.gain[0].level - 0.4).abs() < 1e-6);
    }

    #[test]
    fn volume_is_capped_at_unity() {
        let tone = render_preset("Morning Bell", 3.0, 1.5, 0);
        assert_eq!(tone.gain[0].level, 1.0);
    }

    #[test]
    fn unknown_name_falls_back_to_default_beep() {
        let tone = render_preset("No Such Sound", 1.0, 1.5, 0);
        assert_eq!(tone.waveform, Waveform::Square);
        assert_eq!(tone.frequency[0].hz, 2200.0);
    }

    #[test]
    fn digital_alarm_uses_its_own_base_frequency() {
        let tone = render_preset("Digital Alarm", 1.0, 1.5, 0);
        assert_eq!(tone.frequency[0].hz, 2000.0);
    }

    #[test]
    fn static_frequency_stays_in_range() {
        for _ in 0..20 {
            let tone = render_preset("Static", 1.0, 1.5, 0);
            let hz = tone.frequency[0].hz;
            assert!((100.0..5100.0).contains(&hz));
        }
    }
}

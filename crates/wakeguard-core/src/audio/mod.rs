//! Audio engine with an explicit unlock lifecycle.
//!
//! Playback backends commonly refuse to emit sound before a user gesture.
//! The engine therefore starts locked: requests made while locked are held
//! and silently retried on the next gesture instead of failing, so the
//! enforcement guarantee survives a muted start. Backends are
//! fire-and-forget behind [`AudioSink`].

pub mod synth;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

pub use synth::{render_preset, FreqStep, GainStep, Ramp, Tone, Waveform};

/// Built-in synthesis profiles.
pub const PRESET_SOUNDS: [&str; 13] = [
    "Loud Beep",
    "Siren",
    "Digital Alarm",
    "Morning Bell",
    "Cyber Pulse",
    "Classic Bell",
    "Zen Strings",
    "Industrial Tech",
    "Radar",
    "Nuclear",
    "Submarine",
    "Orbit",
    "Static",
];

/// Seconds of one preset pulse; replayed every tick while ringing.
pub const PULSE_DURATION_SECS: f32 = 1.5;

/// A user-imported alarm sound, payload kept base64-encoded at rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomSound {
    pub id: String,
    pub name: String,
    /// Base64 audio payload, optionally carrying a `data:` URL prefix.
    pub data: String,
}

impl CustomSound {
    /// Decode the payload, tolerating a data-URL wrapper.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        let raw = match self.data.split_once("base64,") {
            Some((_, tail)) => tail,
            None => self.data.as_str(),
        };
        BASE64.decode(raw.trim())
    }
}

/// What to play. Custom sounds are resolved by the caller so the engine
/// never needs to see the sound library.
#[derive(Debug, Clone)]
pub enum SoundSource {
    Preset(String),
    Custom(CustomSound),
}

/// One playback request, carrying the elapsed-seconds context that lets
/// preset profiles raise their pitch over a ringing session.
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub sound: SoundSource,
    pub volume: f32,
    pub duration_secs: f32,
    pub elapsed_secs: u64,
}

impl PlayRequest {
    pub fn preset(name: impl Into<String>, volume: f32, elapsed_secs: u64) -> Self {
        Self {
            sound: SoundSource::Preset(name.into()),
            volume,
            duration_secs: PULSE_DURATION_SECS,
            elapsed_secs,
        }
    }

    pub fn custom(sound: CustomSound, volume: f32) -> Self {
        Self {
            sound: SoundSource::Custom(sound),
            volume,
            duration_secs: PULSE_DURATION_SECS,
            elapsed_secs: 0,
        }
    }
}

/// Fire-and-forget playback backend.
pub trait AudioSink {
    /// Play one synthesized pulse.
    fn play_tone(&mut self, tone: &Tone);
    /// Start a decoded custom payload, looping until stopped.
    fn play_custom(&mut self, audio: &[u8], volume: f32, looping: bool);
    /// Adjust the volume of whatever is currently playing.
    fn set_volume(&mut self, volume: f32);
    fn stop(&mut self);
}

/// Discards everything. Used by headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn play_tone(&mut self, _tone: &Tone) {}
    fn play_custom(&mut self, _audio: &[u8], _volume: f32, _looping: bool) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn stop(&mut self) {}
}

/// Explicitly owned audio resource.
pub struct AudioEngine {
    sink: Box<dyn AudioSink + Send>,
    unlocked: bool,
    pending: Option<PlayRequest>,
    /// Id of the custom sound currently looping, if any. Re-requesting the
    /// same sound only updates its volume.
    playing_custom: Option<String>,
}

impl AudioEngine {
    /// Engines start locked; nothing plays until [`Self::user_gesture`].
    pub fn new(sink: Box<dyn AudioSink + Send>) -> Self {
        Self {
            sink,
            unlocked: false,
            pending: None,
            playing_custom: None,
        }
    }

    pub fn unlocked(&self) -> bool {
        self.unlocked
    }

    /// A qualifying user interaction happened: unlock the backend and
    /// retry any playback that was deferred while locked.
    pub fn user_gesture(&mut self) {
        self.unlocked = true;
        if let Some(request) = self.pending.take() {
            self.dispatch(request);
        }
    }

    /// Request playback. Deferred, not failed, while the engine is locked.
    pub fn play(&mut self, request: PlayRequest) {
        if !self.unlocked {
            log::debug!("audio locked; deferring playback until next gesture");
            self.pending = Some(request);
            return;
        }
        self.dispatch(request);
    }

    pub fn stop(&mut self) {
        self.pending = None;
        self.playing_custom = None;
        self.sink.stop();
    }

    fn dispatch(&mut self, request: PlayRequest) {
        match request.sound {
            SoundSource::Custom(sound) => match sound.decode() {
                Ok(bytes) => {
                    if self.playing_custom.as_deref() == Some(sound.id.as_str()) {
                        self.sink.set_volume(request.volume);
                    } else {
                        self.sink.play_custom(&bytes, request.volume, true);
                        self.playing_custom = Some(sound.id);
                    }
                }
                Err(err) => {
                    // A corrupt payload must not silence the alarm.
                    log::warn!("custom sound {} is undecodable ({err}); using default beep", sound.id);
                    self.playing_custom = None;
                    let tone = render_preset(
                        "Loud Beep",
                        request.volume,
                        request.duration_secs,
                        request.elapsed_secs,
                    );
                    self.sink.play_tone(&tone);
                }
            },
            SoundSource::Preset(name) => {
                self.playing_custom = None;
                let tone = render_preset(
                    &name,
                    request.volume,
                    request.duration_secs,
                    request.elapsed_secs,
                );
                self.sink.play_tone(&tone);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    enum SinkCall {
        Tone(f32),
        Custom { volume: f32, looping: bool },
        SetVolume(f32),
        Stop,
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        calls: Arc<Mutex<Vec<SinkCall>>>,
    }

    impl AudioSink for RecordingSink {
        fn play_tone(&mut self, tone: &Tone) {
            self.calls.lock().unwrap().push(SinkCall::Tone(tone.gain[0].level));
        }
        fn play_custom(&mut self, _audio: &[u8], volume: f32, looping: bool) {
            self.calls.lock().unwrap().push(SinkCall::Custom { volume, looping });
        }
        fn set_volume(&mut self, volume: f32) {
            self.calls.lock().unwrap().push(SinkCall::SetVolume(volume));
        }
        fn stop(&mut self) {
            self.calls.lock().unwrap().push(SinkCall::Stop);
        }
    }

    fn custom_sound() -> CustomSound {
        CustomSound {
            id: "c1".to_string(),
            name: "My Sound".to_string(),
            data: BASE64.encode(b"riff-ish bytes"),
        }
    }

    #[test]
    fn playback_is_deferred_until_a_gesture() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut engine = AudioEngine::new(Box::new(sink));

        engine.play(PlayRequest::preset("Loud Beep", 0.5, 0));
        assert!(calls.lock().unwrap().is_empty());

        engine.user_gesture();
        assert_eq!(calls.lock().unwrap().len(), 1);

        // Once unlocked, requests go straight through.
        engine.play(PlayRequest::preset("Siren", 0.5, 1));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn repeated_custom_requests_only_adjust_volume() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut engine = AudioEngine::new(Box::new(sink));
        engine.user_gesture();

        engine.play(PlayRequest::custom(custom_sound(), 0.3));
        engine.play(PlayRequest::custom(custom_sound(), 0.6));
        let recorded = calls.lock().unwrap();
        assert_eq!(
            *recorded,
            vec![
                SinkCall::Custom { volume: 0.3, looping: true },
                SinkCall::SetVolume(0.6),
            ]
        );
    }

    #[test]
    fn corrupt_custom_payload_falls_back_to_preset() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut engine = AudioEngine::new(Box::new(sink));
        engine.user_gesture();

        let mut bad = custom_sound();
        bad.data = "%%% not base64 %%%".to_string();
        engine.play(PlayRequest::custom(bad, 0.5));
        assert!(matches!(calls.lock().unwrap()[0], SinkCall::Tone(_)));
    }

    #[test]
    fn data_url_payloads_decode() {
        let sound = CustomSound {
            id: "c2".to_string(),
            name: "Url".to_string(),
            data: format!("data:audio/mp3;base64,{}", BASE64.encode(b"abc")),
        };
        assert_eq!(sound.decode().unwrap(), b"abc");
    }

    #[test]
    fn stop_clears_pending_and_custom_state() {
        let sink = RecordingSink::default();
        let calls = sink.calls.clone();
        let mut engine = AudioEngine::new(Box::new(sink));

        engine.play(PlayRequest::preset("Loud Beep", 0.5, 0));
        engine.stop();
        engine.user_gesture();
        // The deferred request was dropped by stop().
        assert_eq!(*calls.lock().unwrap(), vec![SinkCall::Stop]);
    }
}

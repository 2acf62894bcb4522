//! Terminal audio sink.
//!
//! The terminal cannot synthesize waveforms, so each pulse becomes a bell
//! character; the full synthesis command is available at debug log level.
//! This satisfies the fire-and-forget playback contract without any audio
//! device.

use std::io::Write;

use wakeguard_core::audio::{AudioSink, Tone};

#[derive(Debug, Default)]
pub struct TerminalSink;

impl TerminalSink {
    pub fn new() -> Self {
        Self
    }

    fn bell(&self) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

impl AudioSink for TerminalSink {
    fn play_tone(&mut self, tone: &Tone) {
        self.bell();
        log::debug!(
            "tone: {:?} {}Hz gain {:.2} for {:.1}s",
            tone.waveform,
            tone.frequency.first().map(|f| f.hz).unwrap_or_default(),
            tone.gain.first().map(|g| g.level).unwrap_or_default(),
            tone.duration_secs,
        );
    }

    fn play_custom(&mut self, audio: &[u8], volume: f32, looping: bool) {
        self.bell();
        log::debug!(
            "custom sound: {} bytes at volume {volume:.2} (loop: {looping})",
            audio.len(),
        );
    }

    fn set_volume(&mut self, volume: f32) {
        log::debug!("volume now {volume:.2}");
    }

    fn stop(&mut self) {
        log::debug!("audio stopped");
    }
}

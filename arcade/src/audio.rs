use std::time::Duration;

use log::{info, warn};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use thiserror::Error;

use crate::settings::AudioSettings;
use crate::sfx::{Sound, ToneSpec};

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device: {0}")]
    Stream(#[from] rodio::StreamError),
    #[error("cannot open audio sink: {0}")]
    Play(#[from] rodio::PlayError),
}

pub trait AudioSink {
    fn play(&mut self, sound: Sound);
}

/// Used when the device is missing or the player muted everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _sound: Sound) {}
}

/// Remembers what was played; tests assert on it.
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub played: Vec<Sound>,
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, sound: Sound) {
        self.played.push(sound);
    }
}

pub struct RodioAudio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    gain: f32,
}

impl RodioAudio {
    pub fn try_new(gain: f32) -> Result<Self, AudioError> {
        let (stream, handle) = OutputStream::try_default()?;
        // Probe once so a broken device is reported here and not on the first effect.
        Sink::try_new(&handle)?;
        Ok(Self {
            _stream: stream,
            handle,
            gain: gain.clamp(0.0, 1.0),
        })
    }
}

impl AudioSink for RodioAudio {
    fn play(&mut self, sound: Sound) {
        let tone = sound.tone();
        let Ok(sink) = Sink::try_new(&self.handle) else {
            return;
        };
        sink.set_volume(tone.volume * self.gain);
        sink.append(Tone::new(tone));
        sink.detach();
    }
}

/// Opens the output device, or falls back to silence.
pub fn open_audio(settings: &AudioSettings) -> Box<dyn AudioSink> {
    let gain = settings.effective_sfx_gain();
    if gain <= 0.0 {
        info!("audio muted");
        return Box::new(SilentAudio);
    }
    match RodioAudio::try_new(gain) {
        Ok(audio) => Box::new(audio),
        Err(err) => {
            warn!("{err}; continuing without sound");
            Box::new(SilentAudio)
        }
    }
}

/// A short synthesized blip: a gliding sine or square wave with a click-free envelope.
#[derive(Debug, Clone)]
pub struct Tone {
    spec: ToneSpec,
    sample_rate: u32,
    total: u64,
    frame: u64,
    phase: f32,
}

impl Tone {
    pub fn new(spec: ToneSpec) -> Self {
        let sample_rate = 48_000;
        Self {
            spec,
            sample_rate,
            total: u64::from(sample_rate) * u64::from(spec.duration_ms) / 1000,
            frame: 0,
            phase: 0.0,
        }
    }

    pub fn len_frames(&self) -> u64 {
        self.total
    }
}

impl Iterator for Tone {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame >= self.total {
            return None;
        }
        let t = self.frame as f32 / self.total.max(1) as f32;
        let (f0, f1) = self.spec.freq_hz;
        let freq = f0 + (f1 - f0) * t;
        self.phase = (self.phase + freq / self.sample_rate as f32).fract();

        let wave = (self.phase * std::f32::consts::TAU).sin();
        let wave = if self.spec.square { wave.signum() * 0.6 } else { wave };

        let attack = (self.sample_rate / 200) as u64; // 5ms
        let release = (self.sample_rate / 50) as u64; // 20ms
        let env = if self.frame < attack {
            self.frame as f32 / attack.max(1) as f32
        } else if self.frame + release >= self.total {
            (self.total - self.frame) as f32 / release.max(1) as f32
        } else {
            1.0
        };

        self.frame += 1;
        Some(wave * env)
    }
}

impl rodio::Source for Tone {
    fn current_frame_len(&self) -> Option<usize> {
        Some((self.total - self.frame.min(self.total)) as usize)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_millis(u64::from(self.spec.duration_ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_is_finite_and_bounded() {
        let tone = Tone::new(Sound::Coin.tone());
        let expected = tone.len_frames() as usize;
        let samples: Vec<f32> = tone.collect();
        assert_eq!(samples.len(), expected);
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(samples.first().is_some_and(|s| s.abs() < 0.05));
    }

    #[test]
    fn muted_settings_yield_silence_without_opening_a_device() {
        let settings = AudioSettings {
            mute_all: true,
            ..AudioSettings::default()
        };
        let mut audio = open_audio(&settings);
        audio.play(Sound::Win);
    }
}

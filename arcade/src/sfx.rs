/// Every sound effect the arcade can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Click,
    Reveal,
    Flag,
    Explode,
    Move,
    Push,
    Merge,
    LineClear,
    Drop,
    Hit,
    Miss,
    Coin,
    Win,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    /// Start and end frequency; the tone glides linearly between them.
    pub freq_hz: (f32, f32),
    pub duration_ms: u32,
    pub volume: f32,
    pub square: bool,
}

/// Per-effect volume (0.0..=1.0), before the player's master/sfx gain.
pub const MOVE_SFX_VOLUME: f32 = 0.20;
pub const ACTION_SFX_VOLUME: f32 = 0.35;
pub const EVENT_SFX_VOLUME: f32 = 0.45;

impl Sound {
    pub fn tone(self) -> ToneSpec {
        let (freq_hz, duration_ms, volume, square) = match self {
            Sound::Click => ((880.0, 880.0), 40, ACTION_SFX_VOLUME, false),
            Sound::Reveal => ((660.0, 740.0), 35, MOVE_SFX_VOLUME, false),
            Sound::Flag => ((520.0, 390.0), 60, ACTION_SFX_VOLUME, false),
            Sound::Explode => ((180.0, 40.0), 420, EVENT_SFX_VOLUME, true),
            Sound::Move => ((440.0, 440.0), 25, MOVE_SFX_VOLUME, false),
            Sound::Push => ((300.0, 260.0), 60, ACTION_SFX_VOLUME, true),
            Sound::Merge => ((600.0, 900.0), 70, ACTION_SFX_VOLUME, false),
            Sound::LineClear => ((500.0, 1200.0), 180, EVENT_SFX_VOLUME, false),
            Sound::Drop => ((220.0, 140.0), 70, ACTION_SFX_VOLUME, true),
            Sound::Hit => ((760.0, 980.0), 50, ACTION_SFX_VOLUME, false),
            Sound::Miss => ((240.0, 200.0), 120, ACTION_SFX_VOLUME, true),
            Sound::Coin => ((988.0, 1319.0), 90, ACTION_SFX_VOLUME, false),
            Sound::Win => ((523.0, 1047.0), 450, EVENT_SFX_VOLUME, false),
            Sound::Lose => ((392.0, 131.0), 500, EVENT_SFX_VOLUME, true),
        };
        ToneSpec {
            freq_hz,
            duration_ms,
            volume,
            square,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tones_are_short_and_within_volume_range() {
        for sound in [
            Sound::Click,
            Sound::Reveal,
            Sound::Explode,
            Sound::LineClear,
            Sound::Win,
            Sound::Lose,
        ] {
            let tone = sound.tone();
            assert!((0.0..=1.0).contains(&tone.volume), "{sound:?}");
            assert!(tone.duration_ms > 0 && tone.duration_ms <= 500, "{sound:?}");
        }
    }

    #[test]
    fn event_sounds_are_louder_than_moves() {
        assert!(Sound::Win.tone().volume > Sound::Move.tone().volume);
    }
}

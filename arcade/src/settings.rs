use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::profile::atomic_write;

pub const SETTINGS_FILE_NAME: &str = "arcade_settings.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioSettings {
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub mute_all: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 1.0,
            sfx_volume: 1.0,
            mute_all: false,
        }
    }
}

impl AudioSettings {
    pub fn clamp(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self
    }

    pub fn effective_sfx_gain(self) -> f32 {
        if self.mute_all {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }
}

/// Defaults the sub-games start with; each scene can still toggle them from its menu.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameplaySettings {
    pub minesweeper_safe_click: bool,
    pub maze_vision: bool,
    pub maze_random_spawn: bool,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            minesweeper_safe_click: true,
            maze_vision: false,
            maze_random_spawn: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VideoSettings {
    pub window_width: u32,
    pub window_height: u32,
    pub vsync: bool,
    pub target_fps: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 720,
            vsync: true,
            target_fps: 60,
        }
    }
}

impl VideoSettings {
    pub const MIN_FPS: u32 = 30;
    pub const MAX_FPS: u32 = 240;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArcadeSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(default)]
    pub gameplay: GameplaySettings,
    #[serde(default)]
    pub video: VideoSettings,
}

impl Default for ArcadeSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            audio: AudioSettings::default(),
            gameplay: GameplaySettings::default(),
            video: VideoSettings::default(),
        }
    }
}

impl ArcadeSettings {
    pub fn sanitized(mut self) -> Self {
        self.version = default_version();
        self.audio = self.audio.clamp();
        self.video.target_fps = self
            .video
            .target_fps
            .clamp(VideoSettings::MIN_FPS, VideoSettings::MAX_FPS);
        self.video.window_width = self.video.window_width.clamp(320, 7680);
        self.video.window_height = self.video.window_height.clamp(240, 4320);
        self
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable files yield defaults.
    pub fn load(&self) -> ArcadeSettings {
        let Ok(bytes) = fs::read(&self.path) else {
            return ArcadeSettings::default();
        };
        serde_json::from_slice::<ArcadeSettings>(&bytes)
            .map(ArcadeSettings::sanitized)
            .unwrap_or_else(|err| {
                log::warn!(
                    "ignoring unreadable settings at {}: {err}",
                    self.path.display()
                );
                ArcadeSettings::default()
            })
    }

    pub fn save(&self, settings: &ArcadeSettings) -> io::Result<()> {
        let text = serde_json::to_string_pretty(settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        atomic_write(&self.path, text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sfx_gain_respects_mute() {
        let mut audio = AudioSettings::default();
        assert!((audio.effective_sfx_gain() - 1.0).abs() < 1e-6);
        audio.mute_all = true;
        assert_eq!(audio.effective_sfx_gain(), 0.0);
    }

    #[test]
    fn sanitized_clamps_volumes_and_fps() {
        let settings = ArcadeSettings {
            version: 9,
            audio: AudioSettings {
                master_volume: 3.0,
                sfx_volume: -1.0,
                mute_all: false,
            },
            video: VideoSettings {
                target_fps: 1000,
                ..VideoSettings::default()
            },
            ..ArcadeSettings::default()
        }
        .sanitized();

        assert_eq!(settings.version, 1);
        assert_eq!(settings.audio.master_volume, 1.0);
        assert_eq!(settings.audio.sfx_volume, 0.0);
        assert_eq!(settings.video.target_fps, VideoSettings::MAX_FPS);
    }

    #[test]
    fn serde_defaults_fill_missing_fields() {
        let parsed: ArcadeSettings =
            serde_json::from_str(r#"{"gameplay":{"maze_vision":true}}"#).unwrap();
        assert!(parsed.gameplay.maze_vision);
        assert!(parsed.gameplay.minesweeper_safe_click);
        assert_eq!(parsed.video, VideoSettings::default());
        assert_eq!(parsed.audio, AudioSettings::default());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let store = SettingsStore::new("/definitely/not/here/arcade_settings.json");
        assert_eq!(store.load(), ArcadeSettings::default());
    }
}

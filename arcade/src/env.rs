//! The environment handle every scene receives instead of a pointer to the hub.

use chrono::{Local, NaiveDate};
use engine::scene::SceneEnv;
use engine::surface::SurfaceSize;
use log::warn;

use crate::audio::{AudioSink, SilentAudio};
use crate::profile::{PlayerProfile, ProfileRecord};
use crate::settings::{ArcadeSettings, GameplaySettings, SettingsStore};
use crate::sfx::Sound;

pub trait Calendar {
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCalendar;

impl Calendar for SystemCalendar {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedCalendar(pub NaiveDate);

impl Calendar for FixedCalendar {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct ArcadeEnv {
    profile: PlayerProfile,
    audio: Box<dyn AudioSink>,
    calendar: Box<dyn Calendar>,
    settings: ArcadeSettings,
    settings_store: Option<SettingsStore>,
    surface: SurfaceSize,
    quit_requested: bool,
    last_sound: Option<Sound>,
    seed: Option<u64>,
}

impl ArcadeEnv {
    pub fn new(
        profile: PlayerProfile,
        audio: Box<dyn AudioSink>,
        calendar: Box<dyn Calendar>,
        settings: ArcadeSettings,
    ) -> Self {
        Self {
            profile,
            audio,
            calendar,
            settings,
            settings_store: None,
            surface: SurfaceSize::new(960, 720),
            quit_requested: false,
            last_sound: None,
            seed: None,
        }
    }

    /// Silent, disk-free and deterministic: seeds handed to scenes derive from `seed`.
    pub fn headless(seed: u64, today: NaiveDate) -> Self {
        let mut env = Self::new(
            PlayerProfile::detached(ProfileRecord::default()),
            Box::new(SilentAudio),
            Box::new(FixedCalendar(today)),
            ArcadeSettings::default(),
        );
        env.seed = Some(seed);
        env
    }

    pub fn play_sound(&mut self, sound: Sound) {
        self.last_sound = Some(sound);
        self.audio.play(sound);
    }

    pub fn last_sound(&self) -> Option<Sound> {
        self.last_sound
    }

    /// Asks the host to close the current scene at the next boundary.
    pub fn quit_scene(&mut self) {
        self.quit_requested = true;
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut PlayerProfile {
        &mut self.profile
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.surface
    }

    pub fn set_surface_size(&mut self, size: SurfaceSize) {
        self.surface = size;
    }

    /// Gameplay toggles changed through [`ArcadeEnv::set_gameplay`] are written back here.
    pub fn with_settings_store(mut self, store: SettingsStore) -> Self {
        self.settings_store = Some(store);
        self
    }

    pub fn settings(&self) -> &ArcadeSettings {
        &self.settings
    }

    pub fn gameplay(&self) -> GameplaySettings {
        self.settings.gameplay
    }

    /// Applies `change` to the gameplay defaults and persists them when they changed.
    pub fn set_gameplay(&mut self, change: impl FnOnce(&mut GameplaySettings)) {
        let before = self.settings.gameplay;
        change(&mut self.settings.gameplay);
        if self.settings.gameplay == before {
            return;
        }
        if let Some(store) = &self.settings_store {
            if let Err(err) = store.save(&self.settings) {
                warn!("failed to save settings to {}: {err}", store.path().display());
            }
        }
    }

    /// Seed for a scene's RNG. Deterministic in headless mode, random otherwise.
    pub fn next_seed(&mut self) -> u64 {
        match self.seed.as_mut() {
            Some(seed) => {
                *seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                *seed
            }
            None => rand::random(),
        }
    }
}

impl SceneEnv for ArcadeEnv {
    fn take_quit_request(&mut self) -> bool {
        std::mem::take(&mut self.quit_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_seeds_are_reproducible() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut a = ArcadeEnv::headless(7, day);
        let mut b = ArcadeEnv::headless(7, day);
        assert_eq!(a.next_seed(), b.next_seed());
        assert_ne!(a.next_seed(), a.next_seed());
        assert_eq!(a.today(), day);
    }

    #[test]
    fn quit_request_is_consumed_once() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut env = ArcadeEnv::headless(1, day);
        env.quit_scene();
        assert!(env.take_quit_request());
        assert!(!env.take_quit_request());
    }
}

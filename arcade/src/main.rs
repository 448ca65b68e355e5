use std::path::PathBuf;

use arcade::app::ArcadeApp;
use arcade::audio::open_audio;
use arcade::env::{ArcadeEnv, SystemCalendar};
use arcade::profile::{PROFILE_FILE_NAME, PlayerProfile, home_fallback_path};
use arcade::settings::SettingsStore;
use engine::app::{AppConfig, PhysicalSize, run_app};
use log::{error, info};

/// Settings and the profile live in the working directory.
fn data_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = data_dir();
    let store = SettingsStore::in_dir(&dir);
    let settings = store.load();
    info!("data directory: {}", dir.display());

    let profile = PlayerProfile::open(dir.join(PROFILE_FILE_NAME), home_fallback_path());
    let audio = open_audio(&settings.audio);
    let env = ArcadeEnv::new(profile, audio, Box::new(SystemCalendar), settings.clone())
        .with_settings_store(store);

    let config = AppConfig {
        title: "Arcade".to_string(),
        desired_size: PhysicalSize::new(settings.video.window_width, settings.video.window_height),
        clamp_to_monitor: true,
        vsync: Some(settings.video.vsync),
        target_fps: settings.video.target_fps,
    };
    if let Err(err) = run_app(config, ArcadeApp::new(env)) {
        error!("{err}");
        return Err(err.into());
    }
    Ok(())
}

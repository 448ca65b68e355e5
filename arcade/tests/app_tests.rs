use std::time::Duration;

use arcade::app::ArcadeApp;
use arcade::env::ArcadeEnv;
use arcade::hub::Activity;
use chrono::NaiveDate;
use engine::input::{InputEvent, Key};
use engine::surface::SurfaceSize;
use engine::{FrameApp, HeadlessRunner};

fn runner() -> HeadlessRunner<ArcadeApp> {
    let env = ArcadeEnv::headless(5, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    HeadlessRunner::new(ArcadeApp::new(env), SurfaceSize::new(960, 720))
}

fn key(key: Key) -> InputEvent {
    InputEvent::KeyDown { key }
}

#[test]
fn first_start_signs_in_and_shows_the_reward() {
    let runner = runner();
    let app = runner.app();
    assert_eq!(app.env().profile().get_coins(), 10);
    assert_eq!(app.env().profile().record().sign_in_streak, 1);
    assert!(app.hub().banner().is_some_and(|b| b.contains("+10")));
}

#[test]
fn idle_hub_frames_are_identical() {
    let mut runner = runner();
    let first = runner.step([], Duration::ZERO).to_string();
    let second = runner.step([], Duration::ZERO).to_string();
    assert_eq!(first, second);
}

#[test]
fn launching_a_game_changes_the_frame_and_escape_restores_it() {
    let mut runner = runner();
    let hub_frame = runner.step([], Duration::ZERO).to_string();
    let game_frame = runner
        .step([key(Key::Down), key(Key::Down), key(Key::Down), key(Key::Enter)], Duration::ZERO)
        .to_string();
    assert_ne!(hub_frame, game_frame);
    assert_eq!(runner.app().hub().child_name(), Some("sokoban"));

    // Leaving clears the sign-in banner, so compare against a fresh hub frame instead.
    runner.step([key(Key::Escape)], Duration::ZERO);
    assert!(!runner.app().hub().has_child());
    let back = runner.step([], Duration::ZERO).to_string();
    let again = runner.step([], Duration::ZERO).to_string();
    assert_eq!(back, again);
}

#[test]
fn every_game_launches_and_draws() {
    let mut runner = runner();
    for activity in Activity::ALL.into_iter().filter(|a| a.is_playable()) {
        assert!(runner.app_mut().launch(activity), "{activity:?} refused to launch");
        runner.step([], Duration::from_millis(16));
        assert!(runner.app().hub().has_child(), "{activity:?} closed right away");
    }
    assert!(!runner.app_mut().launch(Activity::ComingSoon));
}

#[test]
fn escape_at_the_hub_ends_the_run() {
    let mut runner = runner();
    runner.step([key(Key::Escape)], Duration::ZERO);
    assert!(runner.app().should_exit());
    assert_eq!(runner.run_idle(10, Duration::ZERO), 1);
}

#[test]
fn window_close_ends_the_run() {
    let mut runner = runner();
    runner.step([InputEvent::Quit], Duration::ZERO);
    assert!(runner.app().should_exit());
}

#[test]
fn resize_reaches_the_environment() {
    let mut runner = runner();
    runner.resize(SurfaceSize::new(640, 480));
    assert_eq!(runner.app().env().surface_size(), SurfaceSize::new(640, 480));
    runner.step([key(Key::End)], Duration::ZERO);
    let hub = runner.app().hub();
    assert_eq!(hub.scroll(), hub.scroll_max(SurfaceSize::new(640, 480)));
}

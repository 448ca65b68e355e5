use std::time::Duration;

use arcade::env::ArcadeEnv;
use arcade::hub::{Activity, CARD_GAP, CARD_HEIGHT, HubScene, close_button, viewport};
use chrono::NaiveDate;
use engine::graphics::Renderer2d;
use engine::input::{InputEvent, Key, MouseButton};
use engine::recording::RecordingRenderer;
use engine::scene::Scene;

fn env() -> ArcadeEnv {
    ArcadeEnv::headless(11, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap())
}

fn key(hub: &mut HubScene, env: &mut ArcadeEnv, key: Key) {
    hub.handle_event(&InputEvent::KeyDown { key }, env);
}

fn down(hub: &mut HubScene, env: &mut ArcadeEnv, pos: (i32, i32)) {
    let event = InputEvent::MouseDown {
        button: MouseButton::Left,
        pos,
    };
    hub.handle_event(&event, env);
}

fn move_to(hub: &mut HubScene, env: &mut ArcadeEnv, pos: (i32, i32)) {
    hub.handle_event(&InputEvent::MouseMove { pos }, env);
}

fn up(hub: &mut HubScene, env: &mut ArcadeEnv, pos: (i32, i32)) {
    let event = InputEvent::MouseUp {
        button: MouseButton::Left,
        pos,
    };
    hub.handle_event(&event, env);
}

fn click(hub: &mut HubScene, env: &mut ArcadeEnv, pos: (i32, i32)) {
    down(hub, env, pos);
    up(hub, env, pos);
}

fn card_center(hub: &HubScene, env: &ArcadeEnv, index: usize) -> (i32, i32) {
    hub.card_rect(index, env.surface_size()).center()
}

#[test]
fn cards_stack_at_fixed_pitch() {
    let env = env();
    let hub = HubScene::new();
    let size = env.surface_size();
    let first = hub.card_rect(0, size);
    let second = hub.card_rect(1, size);
    assert_eq!(first.h, CARD_HEIGHT);
    assert_eq!(second.y - first.y, (CARD_HEIGHT + CARD_GAP) as i32);
}

#[test]
fn clicking_a_card_launches_its_game() {
    let mut env = env();
    let mut hub = HubScene::new();
    let pos = card_center(&hub, &env, 3);
    click(&mut hub, &mut env, pos);
    assert_eq!(hub.child_name(), Some("sokoban"));
    assert_eq!(hub.focused(), 3);
}

#[test]
fn small_jitter_still_counts_as_a_click() {
    let mut env = env();
    let mut hub = HubScene::new();
    let (x, y) = card_center(&hub, &env, 0);
    down(&mut hub, &mut env, (x, y));
    move_to(&mut hub, &mut env, (x + 3, y + 1));
    up(&mut hub, &mut env, (x + 3, y + 1));
    assert_eq!(hub.child_name(), Some("minesweeper"));
}

#[test]
fn drag_scrolls_and_swallows_the_click() {
    let mut env = env();
    let mut hub = HubScene::new();
    let (x, y) = card_center(&hub, &env, 4);
    down(&mut hub, &mut env, (x, y));
    move_to(&mut hub, &mut env, (x, y - 10));
    move_to(&mut hub, &mut env, (x, y - 30));
    up(&mut hub, &mut env, (x, y - 30));
    assert!(!hub.has_child());
    assert!(hub.scroll() > 0);
    assert!(hub.scroll() <= 30);
}

#[test]
fn drag_catches_up_with_the_pointer_once_it_starts() {
    let mut env = env();
    let mut hub = HubScene::new();
    let (x, y) = card_center(&hub, &env, 4);
    down(&mut hub, &mut env, (x, y));
    move_to(&mut hub, &mut env, (x, y - 4));
    assert_eq!(hub.scroll(), 0);
    move_to(&mut hub, &mut env, (x, y - 10));
    assert_eq!(hub.scroll(), 10);
    move_to(&mut hub, &mut env, (x, y - 25));
    assert_eq!(hub.scroll(), 25);
    up(&mut hub, &mut env, (x, y - 25));
    assert!(!hub.has_child());
}

#[test]
fn wheel_and_drag_share_the_clamp() {
    let mut env = env();
    let mut hub = HubScene::new();
    let max = hub.scroll_max(env.surface_size());

    hub.handle_event(&InputEvent::Wheel { dy: -100.0 }, &mut env);
    assert_eq!(hub.scroll(), max);
    hub.handle_event(&InputEvent::Wheel { dy: 100.0 }, &mut env);
    assert_eq!(hub.scroll(), 0);

    // Dragging content downwards at the top stays at zero.
    let (x, y) = card_center(&hub, &env, 1);
    down(&mut hub, &mut env, (x, y));
    move_to(&mut hub, &mut env, (x, y + 200));
    up(&mut hub, &mut env, (x, y + 200));
    assert_eq!(hub.scroll(), 0);

    key(&mut hub, &mut env, Key::PageDown);
    key(&mut hub, &mut env, Key::PageDown);
    key(&mut hub, &mut env, Key::PageDown);
    assert_eq!(hub.scroll(), max);
}

#[test]
fn offscreen_part_of_a_card_is_not_clickable() {
    let mut env = env();
    let mut hub = HubScene::new();
    let size = env.surface_size();
    let view = viewport(size);
    let straddling = (0..hub.entries().len())
        .find(|&i| {
            let r = hub.card_rect(i, size);
            r.y < view.bottom() && r.bottom() > view.bottom()
        })
        .expect("a card crosses the bottom edge");
    let card = hub.card_rect(straddling, size);
    let below = (card.x + 20, view.bottom() + 2);
    assert!(card.contains(below.0, below.1));
    assert!(!close_button(size).contains(below.0, below.1));
    click(&mut hub, &mut env, below);
    assert!(!hub.has_child());

    let first_hidden = hub.visible_entries(size).len();
    assert!(first_hidden < hub.entries().len());
    assert!(hub.entry_at(hub.card_rect(first_hidden, size).center(), size).is_none());
}

#[test]
fn coming_soon_entry_is_locked() {
    let mut env = env();
    let mut hub = HubScene::new();
    key(&mut hub, &mut env, Key::End);
    let last = hub.entries().len() - 1;
    assert_eq!(hub.entries()[last], Activity::ComingSoon);
    let pos = card_center(&hub, &env, last);
    click(&mut hub, &mut env, pos);
    assert!(!hub.has_child());
    key(&mut hub, &mut env, Key::Enter);
    assert!(!hub.has_child());
    assert!(hub.is_active());
}

#[test]
fn escape_walks_from_game_menu_back_to_hub_then_closes() {
    let mut env = env();
    let mut hub = HubScene::new();
    assert!(hub.launch(Activity::Sokoban, &mut env));
    key(&mut hub, &mut env, Key::Escape);
    assert!(!hub.has_child());
    assert_eq!(hub.banner(), None);
    assert!(hub.is_active());
    key(&mut hub, &mut env, Key::Escape);
    assert!(!hub.is_active());
}

#[test]
fn events_go_to_the_running_game_only() {
    let mut env = env();
    let mut hub = HubScene::new();
    assert!(hub.launch(Activity::Tetris, &mut env));
    let before = hub.scroll();
    hub.handle_event(&InputEvent::Wheel { dy: -3.0 }, &mut env);
    key(&mut hub, &mut env, Key::End);
    assert_eq!(hub.scroll(), before);
    assert_eq!(hub.child_name(), Some("tetris"));
}

#[test]
fn close_button_closes_the_hub() {
    let mut env = env();
    let mut hub = HubScene::new();
    let pos = close_button(env.surface_size()).center();
    click(&mut hub, &mut env, pos);
    assert!(!hub.is_active());
}

struct Faulty;

impl Scene<ArcadeEnv> for Faulty {
    fn name(&self) -> &str {
        "faulty"
    }

    fn handle_event(&mut self, _event: &InputEvent, _env: &mut ArcadeEnv) {}

    fn update(&mut self, _dt: Duration, _env: &mut ArcadeEnv) {
        panic!("tick failed");
    }

    fn draw(&self, _gfx: &mut dyn Renderer2d, _env: &ArcadeEnv) {}

    fn is_active(&self) -> bool {
        true
    }
}

#[test]
fn crashing_game_hands_control_back_with_a_banner() {
    let mut env = env();
    let mut hub = HubScene::new();
    hub.install(Box::new(Faulty), &mut env);
    assert!(hub.has_child());
    hub.update(Duration::from_millis(16), &mut env);
    assert!(!hub.has_child());
    assert!(hub.is_active());
    assert!(hub.banner().is_some_and(|b| b.contains("FAULTY")));
}

/// Reads the running score off the 2048 status line.
fn shown_2048_score(hub: &mut HubScene, env: &mut ArcadeEnv) -> u64 {
    let mut gfx = RecordingRenderer::new(env.surface_size());
    hub.render(&mut gfx, env);
    assert!(!gfx.has_text_containing("NO MORE MOVES"));
    gfx.texts()
        .into_iter()
        .find_map(|t| t.strip_prefix("SCORE ")?.split_whitespace().next()?.parse().ok())
        .unwrap()
}

#[test]
fn window_close_mid_game_keeps_the_2048_best() {
    let mut env = env();
    let mut hub = HubScene::new();
    assert!(hub.launch(Activity::Game2048, &mut env));
    key(&mut hub, &mut env, Key::Enter);

    let mut score = 0;
    for k in [Key::Left, Key::Down, Key::Right, Key::Down].into_iter().cycle().take(40) {
        key(&mut hub, &mut env, k);
        score = shown_2048_score(&mut hub, &mut env);
        if score > 0 {
            break;
        }
    }
    assert!(score > 0);
    assert_eq!(env.profile().best_score("2048"), None);

    hub.handle_event(&InputEvent::Quit, &mut env);
    assert!(!hub.is_active());
    assert!(!hub.has_child());
    assert_eq!(env.profile().best_score("2048"), Some(score as i64));
}

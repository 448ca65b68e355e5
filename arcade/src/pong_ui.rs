use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::Rect;
use log::info;

use crate::env::ArcadeEnv;
use crate::pong_core::{BALL_RADIUS, BrickKind, FIELD_H, FIELD_W, PongEvents, PongGame, PongState};
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, MenuInput, MenuList};

const BEST_KEY: &str = "pong";
const COLOR_FIELD: Color = [10, 12, 24, 255];
const COLOR_PADDLE: Color = [200, 220, 255, 255];
const COLOR_BALL: Color = [255, 255, 255, 255];
const ROW_COLORS: [Color; 6] = [
    [230, 80, 80, 255],
    [240, 150, 60, 255],
    [240, 210, 70, 255],
    [100, 200, 100, 255],
    [80, 160, 230, 255],
    [150, 110, 220, 255],
];

fn brick_color(kind: BrickKind, row: usize) -> Color {
    match kind {
        BrickKind::Normal => ROW_COLORS[row % ROW_COLORS.len()],
        BrickKind::Tough => [140, 140, 150, 255],
        BrickKind::Explosive => [255, 60, 30, 255],
        _ => [255, 255, 255, 255],
    }
}

fn brick_glyph(kind: BrickKind) -> Option<&'static str> {
    match kind {
        BrickKind::Split => Some("S"),
        BrickKind::AddBall => Some("+"),
        BrickKind::Wide => Some("W"),
        BrickKind::Slow => Some("Z"),
        BrickKind::ExtraLife => Some("L"),
        BrickKind::Multiplier => Some("X2"),
        BrickKind::Explosive => Some("*"),
        BrickKind::Normal | BrickKind::Tough => None,
    }
}

/// Maps field coordinates onto the screen.
#[derive(Debug, Clone, Copy)]
struct FieldView {
    origin: (i32, i32),
    scale: f32,
}

impl FieldView {
    fn fit(size: SurfaceSize) -> Self {
        let body = ui_kit::body_rect(size);
        let scale = (body.w as f32 / FIELD_W).min((body.h as f32 - 8.0) / FIELD_H).max(0.1);
        let w = (FIELD_W * scale) as i32;
        Self {
            origin: (body.x + (body.w as i32 - w) / 2, body.y + 4),
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (i32, i32) {
        (
            self.origin.0 + (x * self.scale) as i32,
            self.origin.1 + (y * self.scale) as i32,
        )
    }

    fn rect(&self, (x, y, w, h): (f32, f32, f32, f32)) -> Rect {
        let (sx, sy) = self.point(x, y);
        Rect::new(sx, sy, (w * self.scale).max(1.0) as u32, (h * self.scale).max(1.0) as u32)
    }

    fn bounds(&self) -> Rect {
        self.rect((0.0, 0.0, FIELD_W, FIELD_H))
    }

    fn field_x(&self, screen_x: i32) -> f32 {
        (screen_x - self.origin.0) as f32 / self.scale
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
    Paused,
}

pub struct PongScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Option<PongGame>,
    held: Vec<Direction>,
    finished: bool,
    new_best: bool,
    result: Option<SceneResult>,
}

impl PongScene {
    pub fn new() -> Self {
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(["START", "BACK"]),
            game: None,
            held: Vec::new(),
            finished: false,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&PongGame> {
        self.game.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn start(&mut self, env: &mut ArcadeEnv) {
        info!("pong started");
        self.start_with(PongGame::new(env.next_seed()));
    }

    pub fn start_with(&mut self, game: PongGame) {
        self.game = Some(game);
        self.held.clear();
        self.finished = false;
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn sync_paddle_dir(&mut self) {
        let dir = match self.held.last() {
            Some(Direction::Left) => -1.0,
            Some(Direction::Right) => 1.0,
            _ => 0.0,
        };
        if let Some(game) = self.game.as_mut() {
            game.set_paddle_dir(dir);
        }
    }

    fn react(&mut self, events: PongEvents, env: &mut ArcadeEnv) {
        if events.game_over {
            env.play_sound(Sound::Lose);
        } else if events.wave_cleared {
            env.play_sound(Sound::Win);
        } else if events.ball_lost {
            env.play_sound(Sound::Miss);
        } else if events.specials > 0 {
            env.play_sound(Sound::Coin);
        } else if events.bricks_broken > 0 {
            env.play_sound(Sound::Hit);
        } else if events.paddle_hits > 0 {
            env.play_sound(Sound::Click);
        }
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if self.finished || game.state() != PongState::GameOver {
            return;
        }
        self.finished = true;
        let score = game.score();
        let profile = env.profile_mut();
        profile.add_coins(score / 50);
        self.new_best = profile.record_best(BEST_KEY, score as i64, Rank::HigherIsBetter);
        self.result = Some(SceneResult::new(
            format!("PONG SCORE {score} LEVEL {}", game.level()),
            Some(score as i64),
        ));
    }

    fn handle_menu(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        if event.is_escape() {
            self.active = false;
            return;
        }
        let area = ui_kit::body_rect(env.surface_size());
        if let MenuInput::Activated(i) = self.menu.handle(event, area) {
            env.play_sound(Sound::Click);
            match i {
                0 => self.start(env),
                _ => self.active = false,
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_mut() else {
            self.phase = Phase::Menu;
            return;
        };
        let view = FieldView::fit(env.surface_size());
        match *event {
            InputEvent::MouseMove { pos } => game.move_paddle_to(view.field_x(pos.0)),
            InputEvent::MouseDown { .. } if event.left_click().is_some() => {
                game.launch();
            }
            InputEvent::KeyDown { key } => match key {
                Key::Escape => self.phase = Phase::Menu,
                Key::Char('p') if game.state() != PongState::GameOver => {
                    self.phase = Phase::Paused;
                    self.held.clear();
                    self.sync_paddle_dir();
                }
                Key::Enter if game.state() == PongState::GameOver => self.start(env),
                Key::Space | Key::Up | Key::Char('w') => {
                    if game.launch() {
                        env.play_sound(Sound::Click);
                    }
                }
                _ => {
                    if let Some(dir @ (Direction::Left | Direction::Right)) = Direction::from_key(key) {
                        self.held.retain(|d| *d != dir);
                        self.held.push(dir);
                        self.sync_paddle_dir();
                    }
                }
            },
            InputEvent::KeyUp { key } => {
                if let Some(dir) = Direction::from_key(key) {
                    self.held.retain(|d| *d != dir);
                    self.sync_paddle_dir();
                }
            }
            _ => {}
        }
    }

    fn draw_game(&self, gfx: &mut dyn Renderer2d, game: &PongGame) {
        let view = FieldView::fit(gfx.size());
        let bounds = view.bounds();
        gfx.fill_rect(bounds, COLOR_FIELD);
        gfx.push_clip(bounds);
        for brick in game.bricks() {
            let rect = view.rect(brick.rect());
            gfx.fill_rect(rect, brick_color(brick.kind, brick.row));
            if brick.kind == BrickKind::Tough && brick.hp == 1 {
                gfx.blend_rect(rect, COLOR_FIELD, 90);
            }
            if let Some(glyph) = brick_glyph(brick.kind) {
                ui_kit::text_centered(gfx, rect, glyph, TextStyle::title(ui_kit::TEXT_SMALL, COLOR_FIELD));
            }
        }
        gfx.fill_rounded_rect(view.rect(game.paddle_rect()), 4, COLOR_PADDLE);
        let radius = (BALL_RADIUS * view.scale).max(2.0) as u32;
        for ball in game.balls() {
            gfx.fill_circle(view.point(ball.x, ball.y), radius, COLOR_BALL);
        }
        gfx.pop_clip();
        gfx.rect_outline(bounds, ui_kit::COLOR_PANEL_BORDER);

        let mut status = format!(
            "SCORE {}   LIVES {}   LEVEL {}",
            game.score(),
            game.lives(),
            game.level()
        );
        if game.multiplier() > 1 {
            status.push_str("   X2");
        }
        gfx.draw_text(
            bounds.x + 8,
            bounds.y + 8,
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
        if game.state() == PongState::Serving {
            ui_kit::text_centered(
                gfx,
                Rect::new(bounds.x, bounds.y + bounds.h as i32 / 2, bounds.w, 30),
                "SPACE OR CLICK TO LAUNCH",
                TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT_DIM),
            );
        }
    }
}

impl Default for PongScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for PongScene {
    fn name(&self) -> &str {
        "pong"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
            Phase::Paused => match event.key_down() {
                Some(Key::Escape) => self.phase = Phase::Menu,
                Some(Key::Char('p') | Key::Space | Key::Enter) => self.phase = Phase::Playing,
                _ => {}
            },
        }
    }

    fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let events = game.update(dt);
        self.react(events, env);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "PONG", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing | Phase::Paused, Some(game)) => {
                self.draw_game(gfx, game);
                ui_kit::footer_hint(gfx, "ARROWS/MOUSE: PADDLE   SPACE: LAUNCH   P: PAUSE   ESC: MENU");
                if self.phase == Phase::Paused {
                    ui_kit::result_card(gfx, "PAUSED", ui_kit::COLOR_ACCENT, &["P: RESUME".into()]);
                } else if game.state() == PongState::GameOver {
                    let mut lines = vec![format!("SCORE {}", game.score())];
                    if let Some(best) = env.profile().best_score(BEST_KEY) {
                        lines.push(format!("BEST {best}"));
                    }
                    if self.new_best {
                        lines.push("NEW BEST".into());
                    }
                    ui_kit::result_card(gfx, "GAME OVER", ui_kit::COLOR_BAD, &lines);
                }
            }
            _ => {
                let body = ui_kit::body_rect(gfx.size());
                self.menu.draw(gfx, body);
                ui_kit::footer_hint(gfx, "ENTER: SELECT   ESC: BACK TO HUB");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn result(&self) -> Option<SceneResult> {
        self.result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pong_core::{BALL_SPEED, Ball, Brick, PADDLE_Y};
    use chrono::NaiveDate;

    fn env() -> ArcadeEnv {
        ArcadeEnv::headless(2, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn down(key: Key) -> InputEvent {
        InputEvent::KeyDown { key }
    }

    #[test]
    fn held_arrow_moves_the_paddle_until_released() {
        let mut env = env();
        let mut scene = PongScene::new();
        scene.start(&mut env);
        let x0 = scene.game().unwrap().paddle_rect().0;
        scene.handle_event(&down(Key::Left), &mut env);
        scene.update(Duration::from_millis(100), &mut env);
        let x1 = scene.game().unwrap().paddle_rect().0;
        assert!(x1 < x0);
        scene.handle_event(&InputEvent::KeyUp { key: Key::Left }, &mut env);
        scene.update(Duration::from_millis(100), &mut env);
        assert_eq!(scene.game().unwrap().paddle_rect().0, x1);
    }

    #[test]
    fn game_over_records_the_score() {
        let mut env = env();
        let mut scene = PongScene::new();
        let falling = Ball::new(40.0, PADDLE_Y, 0.0, BALL_SPEED);
        scene.start_with(PongGame::with_layout(
            vec![Brick::new(0, 0, BrickKind::Normal)],
            vec![falling],
            1,
        ));
        scene.update(Duration::from_millis(300), &mut env);
        assert_eq!(scene.game().unwrap().state(), PongState::GameOver);
        assert_eq!(env.profile().best_score(BEST_KEY), Some(0));
        assert_eq!(env.last_sound(), Some(Sound::Lose));
        assert!(scene.result().is_some());
    }

    #[test]
    fn pause_stops_the_ball() {
        let mut env = env();
        let mut scene = PongScene::new();
        scene.start(&mut env);
        scene.handle_event(&down(Key::Space), &mut env);
        scene.handle_event(&down(Key::Char('p')), &mut env);
        let before = scene.game().unwrap().balls()[0];
        scene.update(Duration::from_millis(200), &mut env);
        assert!(scene.is_paused());
        assert_eq!(scene.game().unwrap().balls()[0], before);
    }
}

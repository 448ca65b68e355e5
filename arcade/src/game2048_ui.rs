use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::ui::{Anchor, Rect, Size};

use crate::env::ArcadeEnv;
use crate::game2048_core::{Game2048, SIZE, State};
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, MenuInput, MenuList};

pub const BEST_KEY: &str = "2048";
const BOARD_PX: u32 = 440;
const GAP_PX: u32 = 12;
const COLOR_BOARD: Color = [187, 173, 160, 255];
const COLOR_EMPTY: Color = [205, 193, 180, 255];

fn tile_color(value: u32) -> Color {
    match value {
        2 => [238, 228, 218, 255],
        4 => [237, 224, 200, 255],
        8 => [242, 177, 121, 255],
        16 => [245, 149, 99, 255],
        32 => [246, 124, 95, 255],
        64 => [246, 94, 59, 255],
        128 => [237, 207, 114, 255],
        256 => [237, 204, 97, 255],
        512 => [237, 200, 80, 255],
        1024 => [237, 197, 63, 255],
        2048 => [237, 194, 46, 255],
        _ => [60, 58, 50, 255],
    }
}

fn text_color(value: u32) -> Color {
    if value <= 4 {
        [119, 110, 101, 255]
    } else {
        [249, 246, 242, 255]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct Game2048Scene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Game2048,
    reported_over: bool,
    result: Option<SceneResult>,
}

impl Game2048Scene {
    pub fn new(env: &mut ArcadeEnv) -> Self {
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(["NEW GAME", "RESUME", "BACK"]),
            game: Game2048::new(env.next_seed()),
            reported_over: false,
            result: None,
        }
    }

    pub fn game(&self) -> &Game2048 {
        &self.game
    }

    fn new_game(&mut self, env: &mut ArcadeEnv) {
        self.game = Game2048::new(env.next_seed());
        self.reported_over = false;
        self.phase = Phase::Playing;
    }

    fn slide(&mut self, dir: Direction, env: &mut ArcadeEnv) {
        let before = self.game.state();
        let outcome = self.game.slide(dir);
        if !outcome.moved {
            return;
        }
        let gained = outcome.gained;
        env.play_sound(if gained > 0 { Sound::Merge } else { Sound::Move });
        let state = self.game.state();
        if before != State::Won && state == State::Won {
            env.play_sound(Sound::Win);
        }
        if state == State::Over && !self.reported_over {
            self.reported_over = true;
            let score = i64::from(self.game.score());
            env.profile_mut()
                .record_best(BEST_KEY, score, Rank::HigherIsBetter);
            env.play_sound(Sound::Lose);
            self.result = Some(SceneResult::new(format!("2048 SCORE {score}"), Some(score)));
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(key) = event.key_down() else {
            return;
        };
        match (key, self.game.state()) {
            (Key::Escape, _) => {
                self.record_score(env);
                self.phase = Phase::Menu;
            }
            (Key::Char('r'), _) | (Key::Enter, State::Over) => {
                self.record_score(env);
                self.new_game(env);
            }
            (Key::Enter, State::Won) => self.game.continue_after_win(),
            _ => {
                if let Some(dir) = Direction::from_key(key) {
                    self.slide(dir, env);
                }
            }
        }
    }

    fn record_score(&mut self, env: &mut ArcadeEnv) {
        let score = i64::from(self.game.score());
        if score > 0 {
            env.profile_mut()
                .record_best(BEST_KEY, score, Rank::HigherIsBetter);
        }
    }

    fn board_rect(size: engine::surface::SurfaceSize) -> Rect {
        ui_kit::body_rect(size).place(Size::new(BOARD_PX, BOARD_PX), Anchor::Center)
    }

    fn cell_rect(board: Rect, x: f32, y: f32) -> Rect {
        let cell = (BOARD_PX - GAP_PX * (SIZE as u32 + 1)) / SIZE as u32;
        let step = (cell + GAP_PX) as f32;
        Rect::new(
            board.x + GAP_PX as i32 + (x * step) as i32,
            board.y + GAP_PX as i32 + (y * step) as i32,
            cell,
            cell,
        )
    }

    fn draw_tile(gfx: &mut dyn Renderer2d, rect: Rect, value: u32) {
        gfx.fill_rounded_rect(rect, 6, tile_color(value));
        let size = match value {
            0..=64 => 42,
            65..=512 => 36,
            _ => 28,
        };
        ui_kit::text_centered(
            gfx,
            rect,
            &value.to_string(),
            TextStyle::title(size, text_color(value)),
        );
    }

    fn draw_board(&self, gfx: &mut dyn Renderer2d) {
        let board = Self::board_rect(gfx.size());
        gfx.fill_rounded_rect(board, 10, COLOR_BOARD);
        for y in 0..SIZE {
            for x in 0..SIZE {
                gfx.fill_rounded_rect(Self::cell_rect(board, x as f32, y as f32), 6, COLOR_EMPTY);
            }
        }
        if self.game.is_animating() {
            let t = self.game.animation_progress();
            for m in &self.game.last_move().tiles {
                let x = m.from.0 as f32 + (m.to.0 as f32 - m.from.0 as f32) * t;
                let y = m.from.1 as f32 + (m.to.1 as f32 - m.from.1 as f32) * t;
                Self::draw_tile(gfx, Self::cell_rect(board, x, y), m.value);
            }
            return;
        }
        for y in 0..SIZE {
            for x in 0..SIZE {
                let v = self.game.tile((x, y));
                if v > 0 {
                    Self::draw_tile(gfx, Self::cell_rect(board, x as f32, y as f32), v);
                }
            }
        }
    }
}

impl Scene<ArcadeEnv> for Game2048Scene {
    fn name(&self) -> &str {
        "2048"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => {
                if event.is_escape() {
                    self.active = false;
                    return;
                }
                let area = ui_kit::body_rect(env.surface_size());
                if let MenuInput::Activated(i) = self.menu.handle(event, area) {
                    env.play_sound(Sound::Click);
                    match i {
                        0 => self.new_game(env),
                        1 => self.phase = Phase::Playing,
                        _ => self.active = false,
                    }
                }
            }
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, dt: Duration, _env: &mut ArcadeEnv) {
        self.game.update(dt);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "2048", env.profile().get_coins());
        let body = ui_kit::body_rect(gfx.size());
        if self.phase == Phase::Menu {
            self.menu.draw(gfx, body);
            ui_kit::footer_hint(gfx, "ENTER: SELECT   ESC: BACK TO HUB");
            return;
        }
        let best = env.profile().best_score(BEST_KEY).unwrap_or(0);
        let status = format!("SCORE {}   BEST {}", self.game.score(), best);
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 10, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
        self.draw_board(gfx);
        ui_kit::footer_hint(gfx, "ARROWS/WASD: SLIDE   R: RESTART   ESC: MENU");
        match self.game.state() {
            State::Won => {
                let lines = vec![
                    format!("SCORE {}", self.game.score()),
                    "ENTER: KEEP GOING".to_string(),
                ];
                ui_kit::result_card(gfx, "2048!", ui_kit::COLOR_GOOD, &lines);
            }
            State::Over => {
                let lines = vec![format!("SCORE {}", self.game.score())];
                ui_kit::result_card(gfx, "NO MORE MOVES", ui_kit::COLOR_BAD, &lines);
            }
            State::Playing | State::Continuing => {}
        }
    }

    fn exit(&mut self, env: &mut ArcadeEnv) {
        self.record_score(env);
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn result(&self) -> Option<SceneResult> {
        self.result.clone()
    }
}

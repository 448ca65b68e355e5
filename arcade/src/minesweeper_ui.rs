use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{InputEvent, Key, MouseButton};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::{Insets, Rect};

use crate::env::ArcadeEnv;
use crate::minesweeper_core::{Difficulty, MineState, Minesweeper, Pos, RevealOutcome};
use crate::profile::Rank;
use crate::round_timer::{RoundTimer, format_mm_ss};
use crate::sfx::Sound;
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};

const MAX_CELL_PX: u32 = 32;
const COLOR_CLOSED: Color = [70, 80, 110, 255];
const COLOR_OPEN: Color = [200, 200, 210, 255];
const COLOR_MINE: Color = [20, 20, 20, 255];
const COLOR_FLAG: Color = [230, 60, 60, 255];
const COLOR_EXPLODED: Color = [230, 80, 80, 255];

const NUMBER_COLORS: [Color; 8] = [
    [40, 80, 220, 255],
    [40, 150, 60, 255],
    [210, 50, 50, 255],
    [30, 30, 140, 255],
    [140, 30, 30, 255],
    [30, 140, 140, 255],
    [20, 20, 20, 255],
    [110, 110, 110, 255],
];

const MENU_SAFE_CLICK: usize = 4;
const MENU_BACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Board,
}

pub struct MinesweeperScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    difficulty: Difficulty,
    game: Minesweeper,
    timer: RoundTimer,
    coins_earned: u64,
    new_best: bool,
    result: Option<SceneResult>,
}

impl MinesweeperScene {
    pub fn new(env: &mut ArcadeEnv) -> Self {
        let safe_click = env.gameplay().minesweeper_safe_click;
        let difficulty = Difficulty::Beginner;
        let config = difficulty.config(board_area_size(env.surface_size()));
        let mut scene = Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new([
                "BEGINNER 9X9",
                "INTERMEDIATE 16X16",
                "EXPERT 30X16",
                "FULLSCREEN",
                "",
                "BACK",
            ]),
            difficulty,
            game: Minesweeper::new(config, env.next_seed(), safe_click),
            timer: RoundTimer::stopwatch(),
            coins_earned: 0,
            new_best: false,
            result: None,
        };
        scene.refresh_menu_labels();
        scene
    }

    pub fn game(&self) -> &Minesweeper {
        &self.game
    }

    pub fn is_in_menu(&self) -> bool {
        self.phase == Phase::Menu
    }

    fn refresh_menu_labels(&mut self) {
        let label = if self.game.safe_click() {
            "SAFE CLICK: ON"
        } else {
            "SAFE CLICK: OFF"
        };
        self.menu.set_label(MENU_SAFE_CLICK, label);
    }

    /// Switching difficulty always starts a new board.
    pub fn start(&mut self, difficulty: Difficulty, env: &ArcadeEnv) {
        self.difficulty = difficulty;
        let config = difficulty.config(board_area_size(env.surface_size()));
        self.game.set_config(config);
        self.restart();
        self.phase = Phase::Board;
    }

    fn restart(&mut self) {
        self.game.reset();
        self.timer.reset();
        self.coins_earned = 0;
        self.new_best = false;
    }

    fn layout(&self, size: SurfaceSize) -> GridLayout {
        let area = ui_kit::body_rect(size).inset(Insets::symmetric(12, 12));
        let area = Rect::new(area.x, area.y + 24, area.w, area.h.saturating_sub(48));
        GridLayout::fit(area, self.game.cols(), self.game.rows(), MAX_CELL_PX)
    }

    fn click(&mut self, p: Pos, button: MouseButton, env: &mut ArcadeEnv) {
        match button {
            MouseButton::Right => {
                if self.game.toggle_flag(p) {
                    env.play_sound(Sound::Flag);
                }
            }
            MouseButton::Left | MouseButton::Middle => {
                let outcome = if button == MouseButton::Middle {
                    self.game.chord(p)
                } else {
                    self.game.reveal(p)
                };
                self.apply_outcome(outcome, env);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: RevealOutcome, env: &mut ArcadeEnv) {
        let opened = u64::from(outcome.opened());
        if opened > 0 {
            env.profile_mut().add_coins(opened);
            self.coins_earned += opened;
        }
        match outcome {
            RevealOutcome::NoChange => {}
            RevealOutcome::Safe { .. } => env.play_sound(Sound::Reveal),
            RevealOutcome::Exploded => {
                env.play_sound(Sound::Explode);
                self.result = Some(SceneResult::new(
                    format!("MINESWEEPER LOST +{} COINS", self.coins_earned),
                    None,
                ));
            }
            RevealOutcome::Won { .. } => {
                let reward = self.difficulty.win_reward();
                env.profile_mut().add_coins(reward);
                self.coins_earned += reward;
                let millis = self.timer.elapsed().as_millis() as i64;
                let key = format!("minesweeper.{}", self.difficulty.key());
                self.new_best = env.profile_mut().record_best(&key, millis, Rank::LowerIsBetter);
                env.play_sound(Sound::Win);
                self.result = Some(SceneResult::new(
                    format!("MINESWEEPER WON IN {}", format_mm_ss(self.timer.elapsed())),
                    Some(self.coins_earned as i64),
                ));
            }
        }
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
                0..=3 => self.start(Difficulty::ALL[i], env),
                MENU_SAFE_CLICK => {
                    let enabled = !self.game.safe_click();
                    self.game.set_safe_click(enabled);
                    env.set_gameplay(|g| g.minesweeper_safe_click = enabled);
                    self.refresh_menu_labels();
                }
                MENU_BACK => self.active = false,
                _ => {}
            }
        }
    }

    fn handle_board(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match event {
            InputEvent::KeyDown { key: Key::Escape } => self.phase = Phase::Menu,
            InputEvent::KeyDown {
                key: Key::Char('r'),
            } => self.restart(),
            InputEvent::KeyDown { key: Key::Enter } if self.game.state().is_final() => {
                self.restart()
            }
            InputEvent::MouseDown { button, pos } => {
                if self.game.state().is_final() {
                    return;
                }
                let layout = self.layout(env.surface_size());
                if let Some(p) = layout.cell_at(*pos) {
                    self.click(p, *button, env);
                }
            }
            _ => {}
        }
    }

    fn draw_board(&self, gfx: &mut dyn Renderer2d) {
        let layout = self.layout(gfx.size());
        let lost = self.game.state() == MineState::Lost;
        let gap = u32::from(layout.cell > 8);
        for y in 0..self.game.rows() {
            for x in 0..self.game.cols() {
                let Some(cell) = self.game.cell((x, y)) else {
                    continue;
                };
                let r = layout.cell_rect(x, y);
                let inner = Rect::new(r.x, r.y, r.w - gap, r.h - gap);
                if cell.is_open {
                    let color = if self.game.exploded_at() == Some((x, y)) {
                        COLOR_EXPLODED
                    } else {
                        COLOR_OPEN
                    };
                    gfx.fill_rect(inner, color);
                    if cell.is_mine {
                        draw_mine(gfx, inner);
                    } else if cell.adjacent_mines > 0 {
                        let n = cell.adjacent_mines as usize;
                        let style = TextStyle::title(layout.cell * 3 / 4, NUMBER_COLORS[n - 1]);
                        ui_kit::text_centered(gfx, inner, &n.to_string(), style);
                    }
                } else {
                    gfx.fill_rect(inner, COLOR_CLOSED);
                    if cell.is_flag {
                        draw_flag(gfx, inner);
                    } else if lost && cell.is_mine {
                        draw_mine(gfx, inner);
                    }
                }
            }
        }
    }
}

fn board_area_size(size: SurfaceSize) -> SurfaceSize {
    let body = ui_kit::body_rect(size);
    SurfaceSize::new(body.w.saturating_sub(24), body.h.saturating_sub(72))
}

fn draw_mine(gfx: &mut dyn Renderer2d, r: Rect) {
    let radius = r.w.min(r.h) / 3;
    gfx.fill_circle(r.center(), radius, COLOR_MINE);
}

fn draw_flag(gfx: &mut dyn Renderer2d, r: Rect) {
    let (cx, cy) = r.center();
    let s = (r.w.min(r.h) / 3) as i32;
    gfx.fill_polygon(&[(cx - s / 2, cy - s), (cx + s, cy - s / 2), (cx - s / 2, cy)], COLOR_FLAG);
    gfx.line((cx - s / 2, cy - s), (cx - s / 2, cy + s), 2, COLOR_MINE);
}

impl Scene<ArcadeEnv> for MinesweeperScene {
    fn name(&self) -> &str {
        "minesweeper"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Board => self.handle_board(event, env),
        }
    }

    fn update(&mut self, dt: Duration, _env: &mut ArcadeEnv) {
        let running = self.phase == Phase::Board && self.game.state() == MineState::Playing;
        self.timer.tick_if_running(dt, running);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "MINESWEEPER", env.profile().get_coins());
        let size = gfx.size();
        match self.phase {
            Phase::Menu => {
                self.menu.draw(gfx, ui_kit::body_rect(size));
                ui_kit::footer_hint(gfx, "ENTER: SELECT   ESC: BACK TO HUB");
            }
            Phase::Board => {
                let body = ui_kit::body_rect(size);
                let status = format!(
                    "{}   MINES {}   TIME {}",
                    self.difficulty.label(),
                    self.game.mines_left(),
                    format_mm_ss(self.timer.elapsed())
                );
                ui_kit::text_centered(
                    gfx,
                    Rect::new(body.x, body.y + 8, body.w, 24),
                    &status,
                    TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
                );
                self.draw_board(gfx);
                ui_kit::footer_hint(gfx, "LEFT: OPEN   RIGHT: FLAG   R: RESTART   ESC: MENU");
                match self.game.state() {
                    MineState::Won => {
                        let mut lines = vec![
                            format!("TIME {}", format_mm_ss(self.timer.elapsed())),
                            format!("COINS +{}", self.coins_earned),
                        ];
                        if self.new_best {
                            lines.push("NEW BEST TIME".to_string());
                        }
                        ui_kit::result_card(gfx, "CLEARED", ui_kit::COLOR_GOOD, &lines);
                    }
                    MineState::Lost => {
                        let lines = vec![format!("COINS +{}", self.coins_earned)];
                        ui_kit::result_card(gfx, "BOOM", ui_kit::COLOR_BAD, &lines);
                    }
                    MineState::Ready | MineState::Playing => {}
                }
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
    use chrono::NaiveDate;

    fn env() -> ArcadeEnv {
        ArcadeEnv::headless(11, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn key(k: Key) -> InputEvent {
        InputEvent::KeyDown { key: k }
    }

    #[test]
    fn escape_goes_board_then_menu_then_out() {
        let mut env = env();
        let mut scene = MinesweeperScene::new(&mut env);
        scene.start(Difficulty::Beginner, &env);
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(scene.is_in_menu());
        assert!(scene.is_active());
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(!scene.is_active());
    }

    #[test]
    fn first_click_grants_a_coin_per_opened_cell() {
        let mut env = env();
        let mut scene = MinesweeperScene::new(&mut env);
        scene.start(Difficulty::Beginner, &env);
        let layout = scene.layout(env.surface_size());
        let (cx, cy) = layout.cell_rect(4, 4).center();
        scene.handle_event(
            &InputEvent::MouseDown {
                button: MouseButton::Left,
                pos: (cx, cy),
            },
            &mut env,
        );
        let opened = u64::from(scene.game().opened());
        assert!(opened >= 9);
        let expected = if scene.game().state() == MineState::Won {
            opened + Difficulty::Beginner.win_reward()
        } else {
            opened
        };
        assert_eq!(env.profile().get_coins(), expected);
    }

    #[test]
    fn safe_click_toggle_is_reflected_in_env() {
        let mut env = env();
        let mut scene = MinesweeperScene::new(&mut env);
        assert!(scene.game().safe_click());
        for _ in 0..MENU_SAFE_CLICK {
            scene.handle_event(&key(Key::Down), &mut env);
        }
        scene.handle_event(&key(Key::Enter), &mut env);
        assert!(!scene.game().safe_click());
        assert!(!env.gameplay().minesweeper_safe_click);
    }
}

use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::ui::{Insets, Rect};
use log::info;

use crate::env::ArcadeEnv;
use crate::profile::Rank;
use crate::round_timer::format_mm_ss;
use crate::sfx::Sound;
use crate::sudoku_core::{self, BOX, InputOutcome, MAX_DIFFICULTY, SIZE, SudokuGame};
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};

const MAX_CELL_PX: u32 = 60;
const COLOR_CELL: Color = [245, 242, 232, 255];
const COLOR_SELECTED: Color = [255, 228, 150, 255];
const COLOR_PEER: Color = [226, 232, 244, 255];
const COLOR_GIVEN: Color = [30, 30, 40, 255];
const COLOR_PLAYER: Color = [40, 90, 200, 255];
const COLOR_NOTE: Color = [120, 120, 130, 255];
const COLOR_LINE: Color = [40, 40, 50, 255];

pub fn best_key(difficulty: u8) -> String {
    format!("sudoku.d{difficulty}")
}

fn reward(difficulty: u8) -> u64 {
    10 * u64::from(difficulty)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct SudokuScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Option<SudokuGame>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl SudokuScene {
    pub fn new() -> Self {
        let mut items: Vec<String> = (1..=MAX_DIFFICULTY)
            .map(|d| format!("DIFFICULTY {d}"))
            .collect();
        items.push("BACK".into());
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(items),
            game: None,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&SudokuGame> {
        self.game.as_ref()
    }

    pub fn is_in_menu(&self) -> bool {
        self.phase == Phase::Menu
    }

    pub fn start(&mut self, difficulty: u8, env: &mut ArcadeEnv) {
        let puzzle = sudoku_core::generate(difficulty, env.next_seed());
        info!(
            "sudoku difficulty {} with {} blanks",
            puzzle.difficulty,
            puzzle.empty_cells()
        );
        self.game = Some(SudokuGame::new(puzzle));
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn layout(size: engine::surface::SurfaceSize) -> GridLayout {
        let area = ui_kit::body_rect(size).inset(Insets::symmetric(24, 44));
        GridLayout::fit(area, SIZE as u32, SIZE as u32, MAX_CELL_PX)
    }

    fn apply(&mut self, outcome: InputOutcome, env: &mut ArcadeEnv) {
        match outcome {
            InputOutcome::Ignored => {}
            InputOutcome::Placed | InputOutcome::Noted | InputOutcome::Erased => {
                env.play_sound(Sound::Click)
            }
            InputOutcome::Wrong => env.play_sound(Sound::Miss),
            InputOutcome::Solved => self.finish(env),
        }
    }

    fn finish(&mut self, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let difficulty = game.puzzle().difficulty;
        let elapsed = game.elapsed();
        let profile = env.profile_mut();
        profile.add_coins(reward(difficulty));
        self.new_best = profile.record_best(
            &best_key(difficulty),
            elapsed.as_millis() as i64,
            Rank::LowerIsBetter,
        );
        env.play_sound(Sound::Win);
        self.result = Some(SceneResult::new(
            format!("SUDOKU LEVEL {difficulty} IN {}", format_mm_ss(elapsed)),
            Some(elapsed.as_secs() as i64),
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
            if i < usize::from(MAX_DIFFICULTY) {
                self.start(i as u8 + 1, env);
            } else {
                self.active = false;
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let layout = Self::layout(env.surface_size());
        let Some(game) = self.game.as_mut() else {
            self.phase = Phase::Menu;
            return;
        };
        if let Some(pos) = event.left_click() {
            if let Some((c, r)) = layout.cell_at(pos) {
                game.select(r as usize, c as usize);
            }
            return;
        }
        let Some(key) = event.key_down() else {
            return;
        };
        if game.is_solved() {
            match key {
                Key::Enter => {
                    let difficulty = game.puzzle().difficulty;
                    self.start(difficulty, env);
                }
                Key::Escape => self.phase = Phase::Menu,
                _ => {}
            }
            return;
        }
        let outcome = match key {
            Key::Escape => {
                self.phase = Phase::Menu;
                return;
            }
            Key::Char('n') => {
                game.toggle_notes_mode();
                return;
            }
            Key::Char('h') => game.hint(),
            Key::Backspace | Key::Delete | Key::Digit(0) | Key::Char('0') => game.erase(),
            _ => {
                if let Some(dir) = Direction::from_key(key) {
                    game.move_selection(dir);
                    return;
                }
                match key.digit() {
                    Some(v) => game.input(v),
                    None => return,
                }
            }
        };
        self.apply(outcome, env);
    }

    fn draw_board(&self, gfx: &mut dyn Renderer2d, game: &SudokuGame) {
        let layout = Self::layout(gfx.size());
        let (sr, sc) = game.selected();
        for r in 0..SIZE {
            for c in 0..SIZE {
                let rect = layout.cell_rect(c as u32, r as u32);
                let peer = r == sr || c == sc || (r / BOX == sr / BOX && c / BOX == sc / BOX);
                let fill = if (r, c) == (sr, sc) {
                    COLOR_SELECTED
                } else if peer {
                    COLOR_PEER
                } else {
                    COLOR_CELL
                };
                gfx.fill_rect(rect, fill);
                gfx.rect_outline(rect, COLOR_NOTE);
                let v = game.value(r, c);
                if v != 0 {
                    let color = if game.is_given(r, c) {
                        COLOR_GIVEN
                    } else if game.has_conflict(r, c) || v != game.puzzle().solution[r][c] {
                        ui_kit::COLOR_BAD
                    } else {
                        COLOR_PLAYER
                    };
                    let size = (layout.cell * 3 / 5).max(ui_kit::TEXT_SMALL);
                    ui_kit::text_centered(gfx, rect, &v.to_string(), TextStyle::title(size, color));
                    continue;
                }
                let third = (layout.cell / 3).max(1);
                for n in game.notes(r, c) {
                    let i = u32::from(n - 1);
                    let slot = Rect::new(
                        rect.x + ((i % 3) * third) as i32,
                        rect.y + ((i / 3) * third) as i32,
                        third,
                        third,
                    );
                    ui_kit::text_centered(
                        gfx,
                        slot,
                        &n.to_string(),
                        TextStyle::body(ui_kit::TEXT_SMALL, COLOR_NOTE),
                    );
                }
            }
        }
        let bounds = layout.bounds();
        let span = layout.cell * BOX as u32;
        for i in 0..=BOX as i32 {
            let offset = i * span as i32;
            gfx.line(
                (bounds.x + offset, bounds.y),
                (bounds.x + offset, bounds.bottom()),
                3,
                COLOR_LINE,
            );
            gfx.line(
                (bounds.x, bounds.y + offset),
                (bounds.right(), bounds.y + offset),
                3,
                COLOR_LINE,
            );
        }

        let body = ui_kit::body_rect(gfx.size());
        let mode = if game.notes_mode() { "NOTES" } else { "PEN" };
        let status = format!(
            "LEVEL {}   {}   ERRORS {}   MODE {mode}",
            game.puzzle().difficulty,
            format_mm_ss(game.elapsed()),
            game.errors()
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 8, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Default for SudokuScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for SudokuScene {
    fn name(&self) -> &str {
        "sudoku"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, dt: Duration, _env: &mut ArcadeEnv) {
        if self.phase == Phase::Playing {
            if let Some(game) = self.game.as_mut() {
                game.update(dt);
            }
        }
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "SUDOKU", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing, Some(game)) => {
                self.draw_board(gfx, game);
                ui_kit::footer_hint(
                    gfx,
                    "1-9: ENTER   0/DEL: ERASE   N: NOTES   H: HINT   ESC: MENU",
                );
                if game.is_solved() {
                    let mut lines = vec![
                        format!("TIME {}", format_mm_ss(game.elapsed())),
                        format!("ERRORS {}   HINTS {}", game.errors(), game.hints_used()),
                        format!("COINS +{}", reward(game.puzzle().difficulty)),
                    ];
                    if self.new_best {
                        lines.push("NEW BEST TIME".into());
                    }
                    ui_kit::result_card(gfx, "SOLVED", ui_kit::COLOR_GOOD, &lines);
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
    use chrono::NaiveDate;

    fn env() -> ArcadeEnv {
        ArcadeEnv::headless(2, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn key(key: Key) -> InputEvent {
        InputEvent::KeyDown { key }
    }

    #[test]
    fn solving_with_hints_records_best_time_and_pays_out() {
        let mut env = env();
        let mut scene = SudokuScene::new();
        scene.start(1, &mut env);
        scene.update(Duration::from_secs(42), &mut env);
        for r in 0..SIZE {
            for c in 0..SIZE {
                scene.game.as_mut().unwrap().select(r, c);
                scene.handle_event(&key(Key::Char('h')), &mut env);
            }
        }
        assert!(scene.game().unwrap().is_solved());
        assert_eq!(env.profile().get_coins(), reward(1));
        assert_eq!(env.profile().best_score(&best_key(1)), Some(42_000));
        assert!(scene.result().is_some());
    }

    #[test]
    fn arrows_wrap_and_n_toggles_notes() {
        let mut env = env();
        let mut scene = SudokuScene::new();
        scene.start(2, &mut env);
        scene.handle_event(&key(Key::Left), &mut env);
        scene.handle_event(&key(Key::Up), &mut env);
        assert_eq!(scene.game().unwrap().selected(), (8, 8));
        scene.handle_event(&key(Key::Char('n')), &mut env);
        assert!(scene.game().unwrap().notes_mode());
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(scene.is_in_menu());
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(!scene.is_active());
    }
}

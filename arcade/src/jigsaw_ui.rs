use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::{Insets, Rect};
use log::info;

use crate::env::ArcadeEnv;
use crate::jigsaw_core::{self, Jigsaw, MAX_SIZE, MIN_SIZE, SwapOutcome};
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};

const MAX_CELL_PX: u32 = 150;
const COLOR_SUN: Color = [255, 214, 90, 255];
const COLOR_HILL: Color = [60, 150, 80, 255];

fn solve_reward(n: usize) -> u64 {
    5 * n as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct JigsawScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    puzzle: Option<Jigsaw>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl JigsawScene {
    pub fn new() -> Self {
        let mut items: Vec<String> = (MIN_SIZE..=MAX_SIZE).map(|n| format!("{n} X {n}")).collect();
        items.push("BACK".into());
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(items),
            puzzle: None,
            new_best: false,
            result: None,
        }
    }

    pub fn puzzle(&self) -> Option<&Jigsaw> {
        self.puzzle.as_ref()
    }

    pub fn start(&mut self, n: usize, env: &mut ArcadeEnv) {
        info!("jigsaw {n}x{n}");
        self.start_with(Jigsaw::new(n, env.next_seed()));
    }

    pub fn start_with(&mut self, puzzle: Jigsaw) {
        self.puzzle = Some(puzzle);
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn layout(size: SurfaceSize, n: usize) -> GridLayout {
        let area = ui_kit::body_rect(size).inset(Insets::symmetric(24, 44));
        GridLayout::fit(area, n as u32, n as u32, MAX_CELL_PX)
    }

    fn pick(&mut self, slot: usize, env: &mut ArcadeEnv) {
        let Some(puzzle) = self.puzzle.as_mut() else {
            return;
        };
        match puzzle.pick(slot) {
            SwapOutcome::Ignored => {}
            SwapOutcome::Selected | SwapOutcome::Deselected => env.play_sound(Sound::Click),
            SwapOutcome::Swapped => env.play_sound(Sound::Move),
            SwapOutcome::Solved => {
                let n = puzzle.size();
                let moves = puzzle.moves();
                let profile = env.profile_mut();
                profile.add_coins(solve_reward(n));
                self.new_best = profile.record_best(
                    &jigsaw_core::best_key(n),
                    i64::from(moves),
                    Rank::LowerIsBetter,
                );
                env.play_sound(Sound::Win);
                self.result = Some(SceneResult::new(
                    format!("JIGSAW {n}X{n} IN {moves} MOVES"),
                    Some(i64::from(moves)),
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
            if i <= MAX_SIZE - MIN_SIZE {
                self.start(MIN_SIZE + i, env);
            } else {
                self.active = false;
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(puzzle) = self.puzzle.as_mut() else {
            self.phase = Phase::Menu;
            return;
        };
        let n = puzzle.size();
        if let Some(pos) = event.left_click() {
            if let Some((x, y)) = Self::layout(env.surface_size(), n).cell_at(pos) {
                self.pick(y as usize * n + x as usize, env);
            }
            return;
        }
        let Some(key) = event.key_down() else {
            return;
        };
        match key {
            Key::Escape => self.phase = Phase::Menu,
            Key::Enter if puzzle.is_solved() => self.start(n, env),
            Key::Enter | Key::Space => {
                let cursor = puzzle.cursor();
                self.pick(cursor, env);
            }
            _ => {
                if let Some(dir) = Direction::from_key(key) {
                    let (dx, dy) = dir.delta();
                    puzzle.move_cursor(dx, dy);
                }
            }
        }
    }

    /// Draws piece `piece` into `rect` as its part of a procedurally painted picture.
    fn draw_piece(gfx: &mut dyn Renderer2d, rect: Rect, piece: usize, n: usize) {
        let (hx, hy) = ((piece % n) as i32, (piece / n) as i32);
        let cell = rect.w as i32;
        let span = (n as i32 - 1).max(1);
        let sky = [
            (70 + 120 * hy / span) as u8,
            (120 + 60 * hx / span) as u8,
            (230 - 80 * hy / span) as u8,
            255,
        ];
        gfx.fill_rect(rect, sky);
        // Picture origin as seen from this piece's home slot.
        let ox = rect.x - hx * cell;
        let oy = rect.y - hy * cell;
        let full = cell * n as i32;
        gfx.push_clip(rect);
        gfx.fill_circle(
            (ox + full * 3 / 4, oy + full / 4),
            (full / 7).max(1) as u32,
            COLOR_SUN,
        );
        gfx.fill_polygon(
            &[
                (ox, oy + full),
                (ox, oy + full * 3 / 5),
                (ox + full / 3, oy + full * 2 / 5),
                (ox + full * 2 / 3, oy + full * 3 / 5),
                (ox + full, oy + full / 2),
                (ox + full, oy + full),
            ],
            COLOR_HILL,
        );
        gfx.pop_clip();
        gfx.draw_text(
            rect.x + 4,
            rect.y + 4,
            &(piece + 1).to_string(),
            TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_TEXT),
        );
    }

    fn draw_puzzle(&self, gfx: &mut dyn Renderer2d, puzzle: &Jigsaw) {
        let size = gfx.size();
        let n = puzzle.size();
        let layout = Self::layout(size, n);
        for slot in 0..n * n {
            let rect = layout.cell_rect((slot % n) as u32, (slot / n) as u32);
            Self::draw_piece(gfx, rect, puzzle.piece_at(slot), n);
            gfx.rect_outline(rect, ui_kit::COLOR_BG);
            if puzzle.selected() == Some(slot) {
                gfx.rect_outline(rect.inset(Insets::all(2)), ui_kit::COLOR_ACCENT);
                gfx.rect_outline(rect.inset(Insets::all(3)), ui_kit::COLOR_ACCENT);
            } else if puzzle.cursor() == slot {
                gfx.rect_outline(rect.inset(Insets::all(2)), ui_kit::COLOR_TEXT);
            }
        }
        let body = ui_kit::body_rect(size);
        let status = format!(
            "MOVES {}   PLACED {}/{}",
            puzzle.moves(),
            puzzle.placed(),
            n * n
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 10, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Default for JigsawScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for JigsawScene {
    fn name(&self) -> &str {
        "jigsaw"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, _dt: Duration, _env: &mut ArcadeEnv) {}

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "JIGSAW", env.profile().get_coins());
        match (self.phase, self.puzzle.as_ref()) {
            (Phase::Playing, Some(puzzle)) => {
                self.draw_puzzle(gfx, puzzle);
                ui_kit::footer_hint(gfx, "CLICK TWO TILES TO SWAP   ARROWS + SPACE   ESC: MENU");
                if puzzle.is_solved() {
                    let n = puzzle.size();
                    let best = env.profile().best_score(&jigsaw_core::best_key(n));
                    let mut lines = vec![format!("MOVES {}", puzzle.moves())];
                    if let Some(best) = best {
                        lines.push(format!("BEST {best}"));
                    }
                    if self.new_best {
                        lines.push("NEW BEST".into());
                    }
                    ui_kit::result_card(gfx, "COMPLETE", ui_kit::COLOR_GOOD, &lines);
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
        ArcadeEnv::headless(6, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn key(key: Key) -> InputEvent {
        InputEvent::KeyDown { key }
    }

    #[test]
    fn keyboard_swaps_finish_and_keep_the_better_count() {
        let mut env = env();
        env.profile_mut()
            .record_best(&jigsaw_core::best_key(3), 1, Rank::LowerIsBetter);
        let mut scene = JigsawScene::new();
        scene.start_with(Jigsaw::with_slots(3, vec![0, 1, 2, 3, 4, 5, 6, 8, 7]));
        // Cursor starts on slot 0; walk to slot 7, pick it, step right, pick again.
        scene.handle_event(&key(Key::Down), &mut env);
        scene.handle_event(&key(Key::Down), &mut env);
        scene.handle_event(&key(Key::Right), &mut env);
        scene.handle_event(&key(Key::Space), &mut env);
        scene.handle_event(&key(Key::Right), &mut env);
        scene.handle_event(&key(Key::Space), &mut env);
        let puzzle = scene.puzzle().unwrap();
        assert!(puzzle.is_solved());
        assert_eq!(puzzle.moves(), 1);
        assert!(!scene.new_best);
        assert_eq!(env.profile().get_coins(), solve_reward(3));
        assert!(scene.result().is_some());
    }

    #[test]
    fn escape_walks_back_out() {
        let mut env = env();
        let mut scene = JigsawScene::new();
        scene.handle_event(&key(Key::Enter), &mut env);
        assert_eq!(scene.puzzle().unwrap().size(), MIN_SIZE);
        scene.handle_event(&key(Key::Escape), &mut env);
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(!scene.is_active());
    }
}

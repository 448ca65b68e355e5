use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{InputEvent, Key, KeyRepeat};
use engine::scene::{Scene, SceneResult};
use engine::ui::{Anchor, Insets, Rect, Size};
use log::info;

use crate::env::ArcadeEnv;
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::tetris_core::{
    BOARD_HEIGHT, BOARD_WIDTH, CELL_EMPTY, DROP_INTERVALS_MS, GravityAdvanceResult, MAX_LEVEL,
    Piece, RotationDir, TetrisCore, Vec2i, occupied_cells, piece_grid, piece_type,
};
use crate::ui_kit::{self, MenuInput, MenuList};

pub const BEST_KEY: &str = "tetris";

const DAS_DELAY: Duration = Duration::from_millis(170);
const ARR_INTERVAL: Duration = Duration::from_millis(50);
const MAX_CELL_PX: u32 = 30;
const PREVIEW_CELL_PX: u32 = 20;

const COLOR_WELL: Color = [12, 12, 18, 255];
const COLOR_GRID: Color = [30, 30, 42, 255];
const COLOR_GHOST: Color = [70, 70, 90, 255];

fn piece_color(cell: u8) -> Color {
    match cell {
        1 => [0, 240, 240, 255],
        2 => [240, 240, 0, 255],
        3 => [160, 0, 240, 255],
        4 => [0, 240, 0, 255],
        5 => [240, 0, 0, 255],
        6 => [0, 0, 240, 255],
        7 => [240, 160, 0, 255],
        _ => COLOR_WELL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    DifficultySelect,
    Playing,
    Paused,
    GameOver,
}

/// Inputs that auto-repeat while held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shift {
    Left,
    Right,
    SoftDrop,
}

impl Shift {
    fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Left | Key::Char('a') => Some(Shift::Left),
            Key::Right | Key::Char('d') => Some(Shift::Right),
            Key::Down | Key::Char('s') => Some(Shift::SoftDrop),
            _ => None,
        }
    }
}

pub struct TetrisScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    core: Option<TetrisCore>,
    repeat: KeyRepeat<Shift>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl TetrisScene {
    pub fn new() -> Self {
        let mut items: Vec<String> = DROP_INTERVALS_MS
            .iter()
            .enumerate()
            .map(|(i, ms)| format!("LEVEL {}  ({ms} MS)", i + 1))
            .collect();
        items.push("BACK".into());
        Self {
            active: true,
            phase: Phase::DifficultySelect,
            menu: MenuList::new(items),
            core: None,
            repeat: KeyRepeat::new(DAS_DELAY, ARR_INTERVAL),
            new_best: false,
            result: None,
        }
    }

    pub fn core(&self) -> Option<&TetrisCore> {
        self.core.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn is_selecting(&self) -> bool {
        self.phase == Phase::DifficultySelect
    }

    pub fn start(&mut self, level: u8, env: &mut ArcadeEnv) {
        let level = level.clamp(1, MAX_LEVEL);
        info!("tetris started at level {level}");
        self.core = Some(TetrisCore::new(env.next_seed(), level));
        self.repeat.clear();
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn apply_shift(&mut self, shift: Shift, env: &mut ArcadeEnv) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        match shift {
            Shift::Left => {
                if core.move_piece(Vec2i::new(-1, 0)) {
                    env.play_sound(Sound::Move);
                }
            }
            Shift::Right => {
                if core.move_piece(Vec2i::new(1, 0)) {
                    env.play_sound(Sound::Move);
                }
            }
            Shift::SoftDrop => {
                let step = core.soft_drop();
                self.after_step(step, env);
            }
        }
    }

    fn after_step(&mut self, step: GravityAdvanceResult, env: &mut ArcadeEnv) {
        if let GravityAdvanceResult::Locked { lines } = step {
            env.play_sound(if lines > 0 { Sound::LineClear } else { Sound::Drop });
        }
        if self.core.as_ref().is_some_and(TetrisCore::is_game_over) {
            self.finish(env);
        }
    }

    fn finish(&mut self, env: &mut ArcadeEnv) {
        let Some(core) = self.core.as_ref() else {
            return;
        };
        let score = i64::from(core.score());
        self.new_best = env
            .profile_mut()
            .record_best(BEST_KEY, score, Rank::HigherIsBetter);
        env.play_sound(Sound::Lose);
        self.repeat.clear();
        self.phase = Phase::GameOver;
        self.result = Some(SceneResult::new(
            format!("TETRIS {score} POINTS, {} LINES", core.lines_cleared()),
            Some(score),
        ));
    }

    fn handle_select(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        if event.is_escape() {
            self.active = false;
            return;
        }
        let area = ui_kit::body_rect(env.surface_size());
        if let MenuInput::Activated(i) = self.menu.handle(event, area) {
            env.play_sound(Sound::Click);
            if i < DROP_INTERVALS_MS.len() {
                self.start(i as u8 + 1, env);
            } else {
                self.active = false;
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match event {
            InputEvent::KeyDown { key } => {
                if let Some(shift) = Shift::from_key(*key) {
                    if self.repeat.on_press(shift) {
                        self.apply_shift(shift, env);
                    }
                    return;
                }
                match key {
                    Key::Escape => {
                        self.repeat.clear();
                        self.phase = Phase::DifficultySelect;
                    }
                    Key::Char('p') => {
                        self.repeat.clear();
                        self.phase = Phase::Paused;
                    }
                    Key::Up | Key::Char('w') | Key::Char('x') => self.rotate(RotationDir::Cw, env),
                    Key::Char('z') => self.rotate(RotationDir::Ccw, env),
                    Key::Space => {
                        let Some(core) = self.core.as_mut() else {
                            return;
                        };
                        let lines = core.hard_drop();
                        self.after_step(GravityAdvanceResult::Locked { lines }, env);
                    }
                    _ => {}
                }
            }
            InputEvent::KeyUp { key } => {
                if let Some(shift) = Shift::from_key(*key) {
                    self.repeat.on_release(shift);
                }
            }
            _ => {}
        }
    }

    fn rotate(&mut self, dir: RotationDir, env: &mut ArcadeEnv) {
        if self.core.as_mut().is_some_and(|c| c.rotate_piece(dir)) {
            env.play_sound(Sound::Move);
        }
    }

    fn handle_paused(&mut self, event: &InputEvent) {
        match event.key_down() {
            Some(Key::Char('p')) | Some(Key::Enter) | Some(Key::Space) => {
                self.phase = Phase::Playing
            }
            Some(Key::Escape) => self.phase = Phase::DifficultySelect,
            _ => {}
        }
    }

    fn handle_game_over(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match event.key_down() {
            Some(Key::Enter) | Some(Key::Char('r')) => {
                let level = self.core.as_ref().map_or(1, TetrisCore::level);
                self.start(level, env);
            }
            Some(Key::Escape) => self.phase = Phase::DifficultySelect,
            _ => {}
        }
    }

    fn well_rect(body: Rect) -> (Rect, u32) {
        let avail = body.inset(Insets::symmetric(16, 36));
        let cell = (avail.h / BOARD_HEIGHT as u32).min(MAX_CELL_PX).max(1);
        let size = Size::new(cell * BOARD_WIDTH as u32, cell * BOARD_HEIGHT as u32);
        (avail.place(size, Anchor::Center), cell)
    }

    fn draw_well(&self, gfx: &mut dyn Renderer2d, core: &TetrisCore) {
        let body = ui_kit::body_rect(gfx.size());
        let (well, cell) = Self::well_rect(body);
        gfx.fill_rect(well, COLOR_WELL);
        let cell_rect = |x: usize, y: usize| {
            // Row 0 is the floor.
            Rect::new(
                well.x + (x as u32 * cell) as i32,
                well.y + ((BOARD_HEIGHT - 1 - y) as u32 * cell) as i32,
                cell,
                cell,
            )
        };
        if let (Some(piece), Some(ghost)) = (core.current_piece(), core.ghost_piece_pos()) {
            for (x, y) in occupied_cells(piece, ghost, core.current_piece_rotation()) {
                if x >= 0 && y >= 0 && (y as usize) < BOARD_HEIGHT {
                    gfx.fill_rect(cell_rect(x as usize, y as usize), COLOR_GHOST);
                }
            }
        }
        for (y, row) in core.board_with_active_piece().iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                let r = cell_rect(x, y);
                if value == CELL_EMPTY {
                    gfx.rect_outline(r, COLOR_GRID);
                } else {
                    gfx.fill_rect(r.inset(Insets::all(1)), piece_color(value));
                }
            }
        }

        let side = Rect::new(well.right() + 24, well.y, 160, well.h);
        let text = TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT);
        gfx.draw_text(side.x, side.y, "NEXT", text);
        Self::draw_preview(gfx, core.next_piece(), side.x, side.y + 28);
        let stats = [
            format!("SCORE {}", core.score()),
            format!("LINES {}", core.lines_cleared()),
            format!("LEVEL {}", core.level()),
        ];
        for (i, line) in stats.iter().enumerate() {
            gfx.draw_text(side.x, side.y + 130 + i as i32 * 28, line, text);
        }
    }

    fn draw_preview(gfx: &mut dyn Renderer2d, piece: Piece, x: i32, y: i32) {
        let grid = piece_grid(piece, 0);
        for gy in 0..grid.size() {
            for gx in 0..grid.size() {
                if grid.cell(gx, gy) == 1 {
                    let r = Rect::new(
                        x + (gx as u32 * PREVIEW_CELL_PX) as i32,
                        y + (gy as u32 * PREVIEW_CELL_PX) as i32,
                        PREVIEW_CELL_PX,
                        PREVIEW_CELL_PX,
                    );
                    gfx.fill_rect(r.inset(Insets::all(1)), piece_color(piece_type(piece)));
                }
            }
        }
    }
}

impl Default for TetrisScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for TetrisScene {
    fn name(&self) -> &str {
        "tetris"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::DifficultySelect => self.handle_select(event, env),
            Phase::Playing => self.handle_playing(event, env),
            Phase::Paused => self.handle_paused(event),
            Phase::GameOver => self.handle_game_over(event, env),
        }
    }

    fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some((shift, count)) = self.repeat.tick(dt) {
            for _ in 0..count {
                self.apply_shift(shift, env);
            }
        }
        if self.phase != Phase::Playing {
            return;
        }
        let Some(core) = self.core.as_mut() else {
            return;
        };
        let step = core.advance_with_gravity(dt);
        self.after_step(step, env);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "TETRIS", env.profile().get_coins());
        let core = match (self.phase, self.core.as_ref()) {
            (Phase::DifficultySelect, _) | (_, None) => {
                let body = ui_kit::body_rect(gfx.size());
                self.menu.draw(gfx, body);
                ui_kit::footer_hint(gfx, "ENTER: START   ESC: BACK TO HUB");
                return;
            }
            (_, Some(core)) => core,
        };
        self.draw_well(gfx, core);
        ui_kit::footer_hint(
            gfx,
            "LEFT/RIGHT: MOVE   UP/X/Z: ROTATE   DOWN: SOFT DROP   SPACE: HARD DROP   P: PAUSE",
        );
        match self.phase {
            Phase::Paused => {
                let lines = vec!["P: RESUME".to_string()];
                ui_kit::result_card(gfx, "PAUSED", ui_kit::COLOR_ACCENT, &lines);
            }
            Phase::GameOver => {
                let best = env.profile().best_score(BEST_KEY).unwrap_or(0);
                let mut lines = vec![
                    format!("SCORE {}", core.score()),
                    format!("BEST {best}"),
                ];
                if self.new_best {
                    lines.push("NEW BEST".into());
                }
                ui_kit::result_card(gfx, "GAME OVER", ui_kit::COLOR_BAD, &lines);
            }
            Phase::Playing | Phase::DifficultySelect => {}
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
        ArcadeEnv::headless(11, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn key(key: Key) -> InputEvent {
        InputEvent::KeyDown { key }
    }

    #[test]
    fn held_left_shifts_after_the_repeat_delay() {
        let mut env = env();
        let mut scene = TetrisScene::new();
        scene.start(1, &mut env);
        let x0 = scene.core().unwrap().current_piece_pos().x;
        scene.handle_event(&key(Key::Left), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().x, x0 - 1);
        scene.update(Duration::from_millis(169), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().x, x0 - 1);
        scene.update(Duration::from_millis(1), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().x, x0 - 2);
        scene.handle_event(&InputEvent::KeyUp { key: Key::Left }, &mut env);
        scene.update(Duration::from_millis(100), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().x, x0 - 2);
    }

    #[test]
    fn pause_freezes_gravity() {
        let mut env = env();
        let mut scene = TetrisScene::new();
        scene.start(5, &mut env);
        let y0 = scene.core().unwrap().current_piece_pos().y;
        scene.handle_event(&key(Key::Char('p')), &mut env);
        assert!(scene.is_paused());
        scene.update(Duration::from_secs(2), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().y, y0);
        scene.handle_event(&key(Key::Char('p')), &mut env);
        scene.update(Duration::from_millis(120), &mut env);
        assert_eq!(scene.core().unwrap().current_piece_pos().y, y0 - 1);
    }

    #[test]
    fn topping_out_records_the_best_score() {
        let mut env = env();
        let mut scene = TetrisScene::new();
        scene.start(3, &mut env);
        for _ in 0..200 {
            if scene.is_game_over() {
                break;
            }
            scene.handle_event(&key(Key::Space), &mut env);
        }
        assert!(scene.is_game_over());
        assert!(env.profile().best_score(BEST_KEY).is_some());
        assert!(scene.result().is_some());
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(scene.is_selecting());
        scene.handle_event(&key(Key::Escape), &mut env);
        assert!(!scene.is_active());
    }
}

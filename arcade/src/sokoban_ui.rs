use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::ui::{Anchor, Insets, Rect, Size};

use crate::env::ArcadeEnv;
use crate::sfx::Sound;
use crate::sokoban_core::{self, LEVELS_PER_PAGE, MoveOutcome, Sokoban};
use crate::sokoban_levels::{self, CellTag};
use crate::ui_kit::{self, ButtonLook, GridLayout};

const SOLVE_REWARD: u64 = 10;
const MAX_CELL_PX: u32 = 56;
const SELECT_COLS: u32 = 5;
const SELECT_BUTTON: Size = Size { w: 120, h: 56 };
const SELECT_GAP: u32 = 14;

const COLOR_WALL: Color = [92, 64, 51, 255];
const COLOR_FLOOR: Color = [224, 214, 190, 255];
const COLOR_TARGET: Color = [220, 80, 80, 255];
const COLOR_BOX: Color = [200, 150, 60, 255];
const COLOR_BOX_DONE: Color = [90, 190, 100, 255];
const COLOR_PLAYER: Color = [60, 110, 220, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LevelSelect,
    Playing,
}

pub struct SokobanScene {
    active: bool,
    phase: Phase,
    page: usize,
    selected: usize,
    game: Option<Sokoban>,
    level_warning: Option<String>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl SokobanScene {
    pub fn new() -> Self {
        Self {
            active: true,
            phase: Phase::LevelSelect,
            page: 0,
            selected: 1,
            game: None,
            level_warning: None,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&Sokoban> {
        self.game.as_ref()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn is_selecting(&self) -> bool {
        self.phase == Phase::LevelSelect
    }

    pub fn open_level(&mut self, id: usize) {
        let (game, err) = Sokoban::load_or_first(id);
        self.level_warning = err.map(|e| e.to_string());
        self.selected = game.level_id();
        self.game = Some(game);
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn total_levels() -> usize {
        sokoban_levels::level_count()
    }

    fn set_page(&mut self, page: usize) {
        let pages = sokoban_core::page_count(Self::total_levels());
        self.page = page.min(pages - 1);
        self.selected = *sokoban_core::page_levels(self.page, Self::total_levels()).start();
    }

    fn select_buttons(&self, area: Rect) -> Vec<(usize, Rect)> {
        let ids: Vec<usize> = sokoban_core::page_levels(self.page, Self::total_levels()).collect();
        let rows = (LEVELS_PER_PAGE as u32).div_ceil(SELECT_COLS);
        let grid = Size::new(
            SELECT_COLS * SELECT_BUTTON.w + (SELECT_COLS - 1) * SELECT_GAP,
            rows * SELECT_BUTTON.h + (rows - 1) * SELECT_GAP,
        );
        let grid = area.place(grid, Anchor::Center);
        ids.into_iter()
            .enumerate()
            .map(|(i, id)| {
                let (col, row) = (i as u32 % SELECT_COLS, i as u32 / SELECT_COLS);
                let rect = Rect::new(
                    grid.x + (col * (SELECT_BUTTON.w + SELECT_GAP)) as i32,
                    grid.y + (row * (SELECT_BUTTON.h + SELECT_GAP)) as i32,
                    SELECT_BUTTON.w,
                    SELECT_BUTTON.h,
                );
                (id, rect)
            })
            .collect()
    }

    fn page_buttons(area: Rect) -> (Rect, Rect) {
        let y = area.bottom() - 80;
        let prev = Rect::new(area.x + 40, y, 80, 44);
        let next = Rect::new(area.right() - 120, y, 80, 44);
        (prev, next)
    }

    fn handle_select(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let area = ui_kit::body_rect(env.surface_size());
        let range = sokoban_core::page_levels(self.page, Self::total_levels());
        match event {
            InputEvent::KeyDown { key } => match key {
                Key::Escape => self.active = false,
                Key::Left | Key::PageUp => self.set_page(self.page.saturating_sub(1)),
                Key::Right | Key::PageDown => self.set_page(self.page + 1),
                Key::Up | Key::Char('w') => {
                    if self.selected > *range.start() {
                        self.selected -= 1;
                    }
                }
                Key::Down | Key::Char('s') => {
                    if self.selected < *range.end() {
                        self.selected += 1;
                    }
                }
                Key::Enter | Key::Space => {
                    env.play_sound(Sound::Click);
                    self.open_level(self.selected);
                }
                _ => {}
            },
            InputEvent::MouseDown { pos, .. } => {
                let (prev, next) = Self::page_buttons(area);
                if prev.contains(pos.0, pos.1) {
                    self.set_page(self.page.saturating_sub(1));
                } else if next.contains(pos.0, pos.1) {
                    self.set_page(self.page + 1);
                } else if let Some((id, _)) = self
                    .select_buttons(area)
                    .into_iter()
                    .find(|(_, r)| r.contains(pos.0, pos.1))
                {
                    env.play_sound(Sound::Click);
                    self.open_level(id);
                }
            }
            _ => {}
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(key) = event.key_down() else {
            return;
        };
        let Some(game) = self.game.as_mut() else {
            self.phase = Phase::LevelSelect;
            return;
        };
        match key {
            Key::Escape => {
                self.phase = Phase::LevelSelect;
                return;
            }
            Key::Char('r') => game.restart(),
            Key::Char('u') | Key::Char('z') | Key::Backspace => {
                if game.undo() {
                    env.play_sound(Sound::Move);
                }
            }
            Key::Enter if game.is_won() => {
                let next = game.level_id() + 1;
                if next <= Self::total_levels() {
                    self.open_level(next);
                } else {
                    self.phase = Phase::LevelSelect;
                }
                return;
            }
            _ => {
                let Some(dir) = Direction::from_key(key) else {
                    return;
                };
                match game.try_move(dir) {
                    MoveOutcome::Blocked => {}
                    MoveOutcome::Walked => env.play_sound(Sound::Move),
                    MoveOutcome::Pushed => env.play_sound(Sound::Push),
                    MoveOutcome::Solved => {
                        let id = game.level_id();
                        let moves = game.moves();
                        let profile = env.profile_mut();
                        profile.add_coins(SOLVE_REWARD);
                        self.new_best = profile.record_best_moves(&id.to_string(), moves);
                        env.play_sound(Sound::Win);
                        self.result = Some(SceneResult::new(
                            format!("SOKOBAN LEVEL {id} IN {moves} MOVES"),
                            Some(i64::from(moves)),
                        ));
                    }
                }
            }
        }
    }

    fn draw_select(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        let area = ui_kit::body_rect(gfx.size());
        let pages = sokoban_core::page_count(Self::total_levels());
        let title = format!("SELECT LEVEL   PAGE {}/{}", self.page + 1, pages);
        ui_kit::text_centered(
            gfx,
            Rect::new(area.x, area.y + 16, area.w, 32),
            &title,
            TextStyle::title(ui_kit::TEXT_BODY + 6, ui_kit::COLOR_TEXT),
        );
        for (id, rect) in self.select_buttons(area) {
            let label = match env.profile().best_moves(&id.to_string()) {
                Some(best) => format!("{id} ({best})"),
                None => id.to_string(),
            };
            let look = if id == self.selected {
                ButtonLook::Selected
            } else {
                ButtonLook::Normal
            };
            ui_kit::button(gfx, rect, &label, look);
        }
        let (prev, next) = Self::page_buttons(area);
        let look = |enabled: bool| {
            if enabled {
                ButtonLook::Normal
            } else {
                ButtonLook::Disabled
            }
        };
        ui_kit::button(gfx, prev, "<", look(self.page > 0));
        ui_kit::button(gfx, next, ">", look(self.page + 1 < pages));
        ui_kit::footer_hint(gfx, "LEFT/RIGHT: PAGE   ENTER: PLAY   ESC: BACK TO HUB");
    }

    fn draw_game(&self, gfx: &mut dyn Renderer2d, game: &Sokoban) {
        let body = ui_kit::body_rect(gfx.size());
        let level = game.level();
        let area = body.inset(Insets::symmetric(24, 48));
        let layout = GridLayout::fit(area, level.width, level.height, MAX_CELL_PX);
        for y in 0..level.height {
            for x in 0..level.width {
                let r = layout.cell_rect(x, y);
                match level.tag((x, y)) {
                    CellTag::Wall => gfx.fill_rect(r, COLOR_WALL),
                    CellTag::Floor => gfx.fill_rect(r, COLOR_FLOOR),
                    CellTag::Target => {
                        gfx.fill_rect(r, COLOR_FLOOR);
                        gfx.fill_circle(r.center(), layout.cell / 5, COLOR_TARGET);
                    }
                }
            }
        }
        let inset = Insets::all((layout.cell / 8).max(1));
        for &b in game.boxes() {
            let color = if level.tag(b) == CellTag::Target {
                COLOR_BOX_DONE
            } else {
                COLOR_BOX
            };
            gfx.fill_rounded_rect(layout.cell_rect(b.0, b.1).inset(inset), 4, color);
        }
        let (px, py) = game.player();
        gfx.fill_circle(
            layout.cell_rect(px, py).center(),
            (layout.cell * 2 / 5).max(1),
            COLOR_PLAYER,
        );

        let status = format!("LEVEL {}   MOVES {}", game.level_id(), game.moves());
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 10, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
        if let Some(warning) = &self.level_warning {
            ui_kit::text_centered(
                gfx,
                Rect::new(body.x, body.y + 34, body.w, 16),
                warning,
                TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_BAD),
            );
        }
        ui_kit::footer_hint(gfx, "ARROWS: MOVE   U/Z: UNDO   R: RESTART   ESC: LEVELS");
    }
}

impl Default for SokobanScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for SokobanScene {
    fn name(&self) -> &str {
        "sokoban"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::LevelSelect => self.handle_select(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, _dt: Duration, _env: &mut ArcadeEnv) {}

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "SOKOBAN", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing, Some(game)) => {
                self.draw_game(gfx, game);
                if game.is_won() {
                    let mut lines = vec![format!("MOVES {}", game.moves())];
                    if self.new_best {
                        lines.push("NEW BEST".into());
                    }
                    ui_kit::result_card(gfx, "SOLVED", ui_kit::COLOR_GOOD, &lines);
                }
            }
            _ => self.draw_select(gfx, env),
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn result(&self) -> Option<SceneResult> {
        self.result.clone()
    }
}

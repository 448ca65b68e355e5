use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::{Insets, Rect};
use log::info;

use crate::env::ArcadeEnv;
use crate::linklink_core::{Cell, EMPTY, LinkGame, LinkPreset, PRESETS, PickOutcome};
use crate::profile::Rank;
use crate::round_timer::format_mm_ss;
use crate::sfx::Sound;
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};

const MAX_CELL_PX: u32 = 56;
const PATH_FLASH: Duration = Duration::from_millis(300);
const COLOR_PATH: Color = [255, 230, 80, 255];
const COLOR_HINT: Color = [90, 210, 240, 255];
const GLYPHS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn tile_color(kind: u8) -> Color {
    let hue = u32::from(kind) * 47 % 360;
    let (r, g, b) = match hue / 60 {
        0 => (220, 60 + hue * 2, 70),
        1 => (220 - (hue - 60) * 2, 200, 70),
        2 => (70, 200, 80 + (hue - 120) * 2),
        3 => (70, 200 - (hue - 180) * 2, 210),
        4 => (90 + (hue - 240) * 2, 80, 210),
        _ => (210, 70, 210 - (hue - 300) * 2),
    };
    [r as u8, g as u8, b as u8, 255]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct LinkLinkScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Option<LinkGame>,
    flash: Option<(Vec<(i32, i32)>, Duration)>,
    hint: Option<(Cell, Cell)>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl LinkLinkScene {
    pub fn new() -> Self {
        let mut items: Vec<String> = PRESETS
            .iter()
            .map(|p| format!("{}  {}X{}", p.name, p.cols, p.rows))
            .collect();
        items.push("BACK".into());
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(items),
            game: None,
            flash: None,
            hint: None,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&LinkGame> {
        self.game.as_ref()
    }

    pub fn start(&mut self, preset: LinkPreset, env: &mut ArcadeEnv) {
        info!("link-link {} board", preset.name);
        self.start_with(LinkGame::new(preset, env.next_seed()));
    }

    pub fn start_with(&mut self, game: LinkGame) {
        self.game = Some(game);
        self.flash = None;
        self.hint = None;
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn layout(size: SurfaceSize, game: &LinkGame) -> GridLayout {
        let area = ui_kit::body_rect(size).inset(Insets::symmetric(24, 40));
        // One spare cell on each side for paths that run along the margin.
        let board = game.board();
        GridLayout::fit(
            area,
            board.cols() as u32 + 2,
            board.rows() as u32 + 2,
            MAX_CELL_PX,
        )
    }

    /// Picks the tile at board cell `cell`.
    pub fn pick(&mut self, cell: Cell, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.pick(cell) {
            PickOutcome::Ignored => {}
            PickOutcome::Selected | PickOutcome::Deselected | PickOutcome::Mismatch => {
                env.play_sound(Sound::Click)
            }
            PickOutcome::Linked { path, reshuffled } => {
                self.flash = Some((path, PATH_FLASH));
                self.hint = None;
                env.play_sound(if reshuffled { Sound::Drop } else { Sound::Merge });
            }
            PickOutcome::Cleared => {
                self.hint = None;
                let preset = *game.preset();
                let elapsed = game.elapsed();
                let reward = u64::from(game.pairs());
                let profile = env.profile_mut();
                profile.add_coins(reward);
                self.new_best = profile.record_best(
                    &preset.best_key(),
                    elapsed.as_millis() as i64,
                    Rank::LowerIsBetter,
                );
                env.play_sound(Sound::Win);
                self.result = Some(SceneResult::new(
                    format!("LINK-LINK {} IN {}", preset.name, format_mm_ss(elapsed)),
                    Some(elapsed.as_secs() as i64),
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
            match PRESETS.get(i) {
                Some(preset) => self.start(*preset, env),
                None => self.active = false,
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_mut() else {
            self.phase = Phase::Menu;
            return;
        };
        if let Some(pos) = event.left_click() {
            let layout = Self::layout(env.surface_size(), game);
            if let Some((px, py)) = layout.cell_at(pos) {
                if px >= 1 && py >= 1 {
                    self.pick((px as usize - 1, py as usize - 1), env);
                }
            }
            return;
        }
        match event.key_down() {
            Some(Key::Escape) => self.phase = Phase::Menu,
            Some(Key::Char('h')) => self.hint = game.hint(),
            Some(Key::Char('s')) if !game.is_clear() => {
                game.reshuffle();
                self.hint = None;
                env.play_sound(Sound::Drop);
            }
            Some(Key::Enter) if game.is_clear() => {
                let preset = *game.preset();
                self.start(preset, env);
            }
            _ => {}
        }
    }

    fn draw_game(&self, gfx: &mut dyn Renderer2d, game: &LinkGame) {
        let size = gfx.size();
        let layout = Self::layout(size, game);
        let board = game.board();
        for y in 0..board.rows() {
            for x in 0..board.cols() {
                let kind = board.tile((x, y));
                if kind == EMPTY {
                    continue;
                }
                let rect = layout.cell_rect(x as u32 + 1, y as u32 + 1).inset(Insets::all(2));
                gfx.fill_rounded_rect(rect, 6, tile_color(kind));
                let glyph = GLYPHS[usize::from(kind - 1) % GLYPHS.len()] as char;
                ui_kit::text_centered(
                    gfx,
                    rect,
                    &glyph.to_string(),
                    TextStyle::title(ui_kit::TEXT_BODY + 4, ui_kit::COLOR_BG),
                );
                let marked = game.selected() == Some((x, y))
                    || self.hint.is_some_and(|(a, b)| a == (x, y) || b == (x, y));
                if marked {
                    let color = if game.selected() == Some((x, y)) {
                        ui_kit::COLOR_ACCENT
                    } else {
                        COLOR_HINT
                    };
                    gfx.rect_outline(rect, color);
                    gfx.rect_outline(rect.inset(Insets::all(1)), color);
                }
            }
        }
        if let Some((path, _)) = &self.flash {
            for pair in path.windows(2) {
                let a = layout.cell_rect(pair[0].0 as u32, pair[0].1 as u32).center();
                let b = layout.cell_rect(pair[1].0 as u32, pair[1].1 as u32).center();
                gfx.line(a, b, 4, COLOR_PATH);
            }
        }
        let body = ui_kit::body_rect(size);
        let status = format!(
            "{}   TIME {}   LEFT {}   SHUFFLES {}",
            game.preset().name,
            format_mm_ss(game.elapsed()),
            board.remaining(),
            game.shuffles()
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 8, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Default for LinkLinkScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for LinkLinkScene {
    fn name(&self) -> &str {
        "linklink"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, dt: Duration, _env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some(game) = self.game.as_mut() {
            game.update(dt);
        }
        if let Some((_, left)) = self.flash.as_mut() {
            *left = left.saturating_sub(dt);
            if left.is_zero() {
                self.flash = None;
            }
        }
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "LINK-LINK", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing, Some(game)) => {
                self.draw_game(gfx, game);
                ui_kit::footer_hint(gfx, "CLICK: PICK   H: HINT   S: SHUFFLE   ESC: MENU");
                if game.is_clear() {
                    let mut lines = vec![
                        format!("TIME {}", format_mm_ss(game.elapsed())),
                        format!("COINS +{}", game.pairs()),
                    ];
                    if self.new_best {
                        lines.push("NEW BEST TIME".into());
                    }
                    ui_kit::result_card(gfx, "BOARD CLEARED", ui_kit::COLOR_GOOD, &lines);
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

use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::{Insets, Rect};
use log::info;

use crate::env::ArcadeEnv;
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};
use crate::whack_core::{DAILY_LIMIT, GAME_ID, GRID, MoleKind, WhackGame, WhackOutcome};

const BEST_KEY: &str = "whack";
const MAX_CELL_PX: u32 = 150;
const COLOR_GRASS: Color = [70, 130, 60, 255];
const COLOR_HOLE: Color = [40, 28, 20, 255];
const COLOR_MOLE: Color = [140, 95, 60, 255];
const COLOR_GOLDEN: Color = [240, 200, 60, 255];
const COLOR_FAST: Color = [90, 160, 220, 255];
const COLOR_BOMB: Color = [30, 30, 30, 255];
const FLASH: Duration = Duration::from_millis(250);

fn mole_color(kind: MoleKind) -> Color {
    match kind {
        MoleKind::Normal => COLOR_MOLE,
        MoleKind::Golden => COLOR_GOLDEN,
        MoleKind::Fast => COLOR_FAST,
        MoleKind::Bomb => COLOR_BOMB,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct WhackScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Option<WhackGame>,
    /// Hole and color of the last whack, shown briefly.
    flash: Option<(usize, Color, Duration)>,
    message: Option<String>,
    finished: bool,
    new_best: bool,
    result: Option<SceneResult>,
}

impl WhackScene {
    pub fn new() -> Self {
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(["START", "BACK"]),
            game: None,
            flash: None,
            message: None,
            finished: false,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&WhackGame> {
        self.game.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn plays_left(env: &ArcadeEnv) -> u32 {
        DAILY_LIMIT.saturating_sub(env.profile().plays_today(GAME_ID, env.today()))
    }

    /// Starts a round if today's allowance is not used up. Returns whether it started.
    pub fn try_start(&mut self, env: &mut ArcadeEnv) -> bool {
        if Self::plays_left(env) == 0 {
            self.message = Some(format!("ALL {DAILY_LIMIT} PLAYS USED TODAY. COME BACK TOMORROW"));
            self.phase = Phase::Menu;
            env.play_sound(Sound::Miss);
            return false;
        }
        let today = env.today();
        let count = env.profile_mut().record_play(GAME_ID, today);
        info!("whack-a-mole round {count}/{DAILY_LIMIT} today");
        self.start_with(WhackGame::new(env.next_seed()));
        true
    }

    pub fn start_with(&mut self, game: WhackGame) {
        self.game = Some(game);
        self.flash = None;
        self.message = None;
        self.finished = false;
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn layout(size: SurfaceSize) -> GridLayout {
        let area = ui_kit::body_rect(size).inset(Insets::symmetric(24, 44));
        GridLayout::fit(area, GRID as u32, GRID as u32, MAX_CELL_PX)
    }

    fn whack(&mut self, hole: usize, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let (sound, color) = match game.whack(hole) {
            WhackOutcome::Ignored => return,
            WhackOutcome::Hit { kind, .. } => (
                if kind == MoleKind::Golden { Sound::Coin } else { Sound::Hit },
                ui_kit::COLOR_GOOD,
            ),
            WhackOutcome::Bomb { .. } => (Sound::Explode, ui_kit::COLOR_BAD),
            WhackOutcome::Miss { .. } => (Sound::Miss, ui_kit::COLOR_TEXT_DIM),
        };
        env.play_sound(sound);
        self.flash = Some((hole, color, FLASH));
    }

    fn finish_if_over(&mut self, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if self.finished || !game.is_over() {
            return;
        }
        self.finished = true;
        let score = game.score();
        let profile = env.profile_mut();
        profile.add_coins(score / 10);
        self.new_best = profile.record_best(BEST_KEY, score as i64, Rank::HigherIsBetter);
        env.play_sound(Sound::Win);
        self.result = Some(SceneResult::new(
            format!("WHACK-A-MOLE SCORE {score}"),
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
                0 => {
                    self.try_start(env);
                }
                _ => self.active = false,
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let over = self.game.as_ref().is_none_or(WhackGame::is_over);
        if let Some(pos) = event.left_click() {
            if !over {
                if let Some((x, y)) = Self::layout(env.surface_size()).cell_at(pos) {
                    self.whack(y as usize * GRID + x as usize, env);
                }
            }
            return;
        }
        match event.key_down() {
            Some(Key::Escape) => self.phase = Phase::Menu,
            Some(Key::Enter) if over => {
                self.try_start(env);
            }
            Some(key) if !over => {
                if let Some(d @ 1..=9) = key.digit() {
                    self.whack(usize::from(d) - 1, env);
                }
            }
            _ => {}
        }
    }

    fn draw_game(&self, gfx: &mut dyn Renderer2d, game: &WhackGame) {
        let size = gfx.size();
        let layout = Self::layout(size);
        gfx.fill_rounded_rect(layout.bounds(), 10, COLOR_GRASS);
        for (hole, slot) in game.holes().iter().enumerate() {
            let cell = layout.cell_rect((hole % GRID) as u32, (hole / GRID) as u32);
            let pit = Rect::new(
                cell.x + cell.w as i32 / 8,
                cell.y + cell.h as i32 / 2,
                cell.w * 3 / 4,
                cell.h / 3,
            );
            gfx.fill_ellipse(pit, COLOR_HOLE);
            if let Some(mole) = slot {
                let r = cell.w / 4;
                let (cx, _) = cell.center();
                let cy = pit.y;
                gfx.fill_circle((cx, cy), r, mole_color(mole.kind));
                if mole.kind == MoleKind::Bomb {
                    gfx.line((cx, cy - r as i32), (cx + 8, cy - r as i32 - 10), 3, COLOR_GOLDEN);
                } else {
                    gfx.fill_circle((cx - r as i32 / 3, cy - r as i32 / 4), 3, COLOR_BOMB);
                    gfx.fill_circle((cx + r as i32 / 3, cy - r as i32 / 4), 3, COLOR_BOMB);
                }
            }
            if let Some((flash_hole, color, _)) = self.flash {
                if flash_hole == hole {
                    gfx.rect_outline(cell.inset(Insets::all(4)), color);
                    gfx.rect_outline(cell.inset(Insets::all(5)), color);
                }
            }
            gfx.draw_text(
                cell.x + 6,
                cell.y + 6,
                &(hole + 1).to_string(),
                TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_TEXT_DIM),
            );
        }
        let body = ui_kit::body_rect(size);
        let status = format!(
            "SCORE {}   COMBO {}   TIME {}",
            game.score(),
            game.combo(),
            game.timer().remaining_secs_ceil()
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 10, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Default for WhackScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for WhackScene {
    fn name(&self) -> &str {
        "whack"
    }

    fn enter(&mut self, env: &mut ArcadeEnv) {
        self.menu
            .set_label(0, format!("START ({} LEFT TODAY)", Self::plays_left(env)));
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
        if self.phase == Phase::Menu {
            self.menu
                .set_label(0, format!("START ({} LEFT TODAY)", Self::plays_left(env)));
        }
    }

    fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some(game) = self.game.as_mut() {
            game.update(dt);
        }
        if let Some((_, _, left)) = self.flash.as_mut() {
            *left = left.saturating_sub(dt);
            if left.is_zero() {
                self.flash = None;
            }
        }
        self.finish_if_over(env);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "WHACK-A-MOLE", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing, Some(game)) => {
                self.draw_game(gfx, game);
                ui_kit::footer_hint(gfx, "CLICK OR 1-9 TO WHACK   AVOID BOMBS   ESC: MENU");
                if game.is_over() {
                    let mut lines = vec![
                        format!("SCORE {}", game.score()),
                        format!("HITS {}   BEST COMBO {}", game.hits(), game.best_combo()),
                    ];
                    if self.new_best {
                        lines.push("NEW BEST".into());
                    }
                    lines.push(format!("PLAYS LEFT TODAY {}", Self::plays_left(env)));
                    ui_kit::result_card(gfx, "TIME UP", ui_kit::COLOR_ACCENT, &lines);
                }
            }
            _ => {
                let body = ui_kit::body_rect(gfx.size());
                self.menu.draw(gfx, body);
                if let Some(message) = &self.message {
                    ui_kit::text_centered(
                        gfx,
                        Rect::new(body.x, body.bottom() - 40, body.w, 24),
                        message,
                        TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_BAD),
                    );
                }
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
    use crate::whack_core::ROUND_TIME;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn sixth_round_of_the_day_is_refused() {
        let mut env = ArcadeEnv::headless(3, day(1));
        let mut scene = WhackScene::new();
        for _ in 0..DAILY_LIMIT {
            assert!(scene.try_start(&mut env));
        }
        assert!(!scene.try_start(&mut env));
        assert!(scene.message().is_some());
        assert_eq!(env.profile().plays_today(GAME_ID, day(1)), DAILY_LIMIT);
    }

    #[test]
    fn digit_keys_whack_and_round_end_records_best() {
        let mut env = ArcadeEnv::headless(3, day(2));
        let mut scene = WhackScene::new();
        scene.start_with(WhackGame::scripted(&[(4, MoleKind::Golden)]));
        scene.handle_event(&InputEvent::KeyDown { key: Key::Digit(5) }, &mut env);
        assert_eq!(scene.game().unwrap().score(), 30);
        assert_eq!(env.last_sound(), Some(Sound::Coin));
        scene.update(ROUND_TIME, &mut env);
        assert!(scene.game().unwrap().is_over());
        assert_eq!(env.profile().best_score(BEST_KEY), Some(30));
        assert_eq!(env.profile().get_coins(), 3);
    }
}

use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::Rect;
use log::info;

use crate::env::ArcadeEnv;
use crate::piano_core::{
    JUDGE_BOTTOM, JUDGE_TOP, LANES, Mode, PianoGame, PianoState, PressOutcome, TILE_HEIGHT,
    TileKind,
};
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, MenuInput, MenuList};

const LANE_KEYS: [char; LANES] = ['d', 'f', 'j', 'k'];
const LANE_WIDTH: u32 = 110;
const COLOR_LANE: Color = [236, 236, 240, 255];
const COLOR_LANE_LINE: Color = [190, 190, 200, 255];
const COLOR_TILE: Color = [24, 24, 30, 255];
const COLOR_TILE_DONE: Color = [150, 150, 160, 255];
const COLOR_DOUBLE: Color = [70, 90, 200, 255];
const COLOR_BONUS: Color = [220, 160, 40, 255];
const COLOR_BAND: Color = [255, 120, 120, 255];
const BAND_ALPHA: u8 = 60;

fn lane_for_key(key: Key) -> Option<usize> {
    if let Key::Char(c) = key {
        if let Some(lane) = LANE_KEYS.iter().position(|&k| k == c) {
            return Some(lane);
        }
    }
    key.digit()
        .filter(|d| (1..=LANES as u8).contains(d))
        .map(|d| usize::from(d) - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct PianoScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    game: Option<PianoGame>,
    finished: bool,
    new_best: bool,
    result: Option<SceneResult>,
}

impl PianoScene {
    pub fn new() -> Self {
        let mut items: Vec<String> = Mode::ALL.iter().map(|m| m.name().to_string()).collect();
        items.push("BACK".into());
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(items),
            game: None,
            finished: false,
            new_best: false,
            result: None,
        }
    }

    pub fn game(&self) -> Option<&PianoGame> {
        self.game.as_ref()
    }

    pub fn start(&mut self, mode: Mode, env: &mut ArcadeEnv) {
        info!("piano tiles {} mode", mode.name());
        self.start_with(PianoGame::new(mode, env.next_seed()));
    }

    pub fn start_with(&mut self, game: PianoGame) {
        self.game = Some(game);
        self.finished = false;
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn field(size: SurfaceSize) -> Rect {
        let body = ui_kit::body_rect(size);
        let w = LANE_WIDTH * LANES as u32;
        Rect::new(
            body.x + (body.w as i32 - w as i32) / 2,
            body.y + 8,
            w,
            body.h.saturating_sub(16),
        )
    }

    fn press(&mut self, lane: usize, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.press(lane) {
            PressOutcome::Ignored => {}
            PressOutcome::Partial => env.play_sound(Sound::Click),
            PressOutcome::Hit { .. } => env.play_sound(Sound::Hit),
            PressOutcome::Miss => env.play_sound(Sound::Miss),
        }
        self.finish_if_over(env);
    }

    fn finish_if_over(&mut self, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        if self.finished || !game.is_over() {
            return;
        }
        self.finished = true;
        let mode = game.mode();
        let score = game.score();
        let profile = env.profile_mut();
        profile.add_coins(score / 10);
        self.new_best = profile.record_best(&mode.best_key(), score as i64, Rank::HigherIsBetter);
        env.play_sound(match game.state() {
            PianoState::TimeUp => Sound::Win,
            _ => Sound::Lose,
        });
        self.result = Some(SceneResult::new(
            format!("PIANO {} SCORE {score}", mode.name()),
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
            match Mode::ALL.get(i) {
                Some(mode) => self.start(*mode, env),
                None => self.active = false,
            }
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(game) = self.game.as_ref() else {
            self.phase = Phase::Menu;
            return;
        };
        let over = game.is_over();
        let mode = game.mode();
        if let Some((x, y)) = event.left_click() {
            let field = Self::field(env.surface_size());
            if !over && field.contains(x, y) {
                let lane = ((x - field.x) as u32 / LANE_WIDTH) as usize;
                self.press(lane.min(LANES - 1), env);
            }
            return;
        }
        let Some(key) = event.key_down() else {
            return;
        };
        match key {
            Key::Escape => self.phase = Phase::Menu,
            Key::Enter | Key::Char('r') if over => self.start(mode, env),
            _ if !over => {
                if let Some(lane) = lane_for_key(key) {
                    self.press(lane, env);
                }
            }
            _ => {}
        }
    }

    fn draw_game(&self, gfx: &mut dyn Renderer2d, game: &PianoGame) {
        let size = gfx.size();
        let field = Self::field(size);
        gfx.fill_rect(field, COLOR_LANE);
        let fh = field.h as f32;
        let band_y = field.y + (JUDGE_TOP * fh) as i32;
        let band_h = ((JUDGE_BOTTOM - JUDGE_TOP) * fh) as u32;
        gfx.blend_rect(Rect::new(field.x, band_y, field.w, band_h), COLOR_BAND, BAND_ALPHA);

        gfx.push_clip(field);
        for tile in game.tiles() {
            let x = field.x + (tile.lane as u32 * LANE_WIDTH) as i32;
            let y = field.y + (tile.y * fh) as i32;
            let rect = Rect::new(x + 1, y + 1, LANE_WIDTH - 2, (TILE_HEIGHT * fh) as u32 - 2);
            let color = match (tile.is_done(), tile.kind) {
                (true, _) => COLOR_TILE_DONE,
                (false, TileKind::Normal) => COLOR_TILE,
                (false, TileKind::Double) => COLOR_DOUBLE,
                (false, TileKind::Bonus) => COLOR_BONUS,
            };
            gfx.fill_rect(rect, color);
            if tile.kind == TileKind::Double && tile.taps_left == 2 {
                ui_kit::text_centered(gfx, rect, "x2", TextStyle::title(ui_kit::TEXT_BODY, COLOR_LANE));
            }
        }
        gfx.pop_clip();

        for lane in 1..LANES {
            let x = field.x + (lane as u32 * LANE_WIDTH) as i32;
            gfx.line((x, field.y), (x, field.bottom()), 1, COLOR_LANE_LINE);
        }
        for (lane, key) in LANE_KEYS.iter().enumerate() {
            let x = field.x + (lane as u32 * LANE_WIDTH) as i32;
            ui_kit::text_centered(
                gfx,
                Rect::new(x, band_y + band_h as i32 - 24, LANE_WIDTH, 20),
                &key.to_ascii_uppercase().to_string(),
                TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_TEXT_DIM),
            );
        }

        let mut status = format!("SCORE {}   COMBO {}", game.score(), game.combo());
        if game.mode() == Mode::Challenge {
            status.push_str(&format!("   TIME {}", game.timer().remaining_secs_ceil()));
        }
        if game.mode() == Mode::Zen {
            status.push_str(&format!("   MISSES {}", game.misses()));
        }
        gfx.draw_text(
            16,
            field.y + 4,
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Default for PianoScene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for PianoScene {
    fn name(&self) -> &str {
        "piano"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let misses = game.misses();
        game.update(dt);
        if game.misses() > misses {
            env.play_sound(Sound::Miss);
        }
        self.finish_if_over(env);
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "PIANO TILES", env.profile().get_coins());
        match (self.phase, self.game.as_ref()) {
            (Phase::Playing, Some(game)) => {
                self.draw_game(gfx, game);
                ui_kit::footer_hint(gfx, "D F J K OR CLICK A LANE   ESC: MENU");
                if game.is_over() {
                    let title = match game.state() {
                        PianoState::TimeUp => "TIME UP",
                        _ => "MISSED",
                    };
                    let mut lines = vec![
                        format!("SCORE {}", game.score()),
                        format!("BEST COMBO {}", game.best_combo()),
                    ];
                    if self.new_best {
                        lines.push("NEW BEST".into());
                    }
                    ui_kit::result_card(gfx, title, ui_kit::COLOR_ACCENT, &lines);
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
        ArcadeEnv::headless(4, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
    }

    fn key(c: char) -> InputEvent {
        InputEvent::KeyDown { key: Key::Char(c) }
    }

    #[test]
    fn lane_keys_hit_and_wrong_key_ends_classic() {
        let mut env = env();
        let mut scene = PianoScene::new();
        let tiles = vec![
            PianoGame::new_tile(1, JUDGE_TOP, TileKind::Normal),
            PianoGame::new_tile(3, JUDGE_TOP - TILE_HEIGHT, TileKind::Normal),
        ];
        scene.start_with(PianoGame::with_tiles(Mode::Classic, tiles, 0.0));
        scene.handle_event(&key('f'), &mut env);
        assert_eq!(scene.game().unwrap().score(), 1);
        scene.handle_event(&key('d'), &mut env);
        assert!(scene.game().unwrap().is_over());
        assert_eq!(env.profile().best_score(&Mode::Classic.best_key()), Some(1));
        assert!(scene.result().is_some());
    }

    #[test]
    fn zen_keeps_going_after_an_escaped_tile() {
        let mut env = env();
        let mut scene = PianoScene::new();
        let tiles = vec![PianoGame::new_tile(0, JUDGE_TOP, TileKind::Normal)];
        scene.start_with(PianoGame::with_tiles(Mode::Zen, tiles, 1.0));
        scene.update(Duration::from_millis(400), &mut env);
        let game = scene.game().unwrap();
        assert_eq!(game.misses(), 1);
        assert!(!game.is_over());
        assert_eq!(env.last_sound(), Some(Sound::Miss));
    }

    #[test]
    fn digits_map_to_lanes() {
        assert_eq!(lane_for_key(Key::Digit(1)), Some(0));
        assert_eq!(lane_for_key(Key::Char('k')), Some(3));
        assert_eq!(lane_for_key(Key::Digit(5)), None);
    }
}

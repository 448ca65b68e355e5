//! The activity hub: a scrollable catalog of games that hosts at most one running game.
//!
//! The hub owns the scroll offset, turns wheel, key and drag input into one clamped offset,
//! hit-tests only the cards that are on screen, and installs the chosen game into its
//! [`ChildSlot`]. While a game runs, every event, tick and frame goes to the game; when the game
//! leaves, the hub reads its result for the banner and takes over again.

use std::time::Duration;

use engine::graphics::{Renderer2d, TextStyle, measure_text};
use engine::input::{InputEvent, Key, MouseButton};
use engine::scene::{ChildExit, ChildSlot, Scene};
use engine::surface::SurfaceSize;
use engine::ui::{Insets, Rect};
use log::{info, warn};

use crate::env::ArcadeEnv;
use crate::game2048_ui::Game2048Scene;
use crate::jigsaw_ui::JigsawScene;
use crate::linklink_ui::LinkLinkScene;
use crate::maze_ui::MazeScene;
use crate::minesweeper_ui::MinesweeperScene;
use crate::piano_ui::PianoScene;
use crate::point24_ui::Point24Scene;
use crate::pong_ui::PongScene;
use crate::sfx::Sound;
use crate::sokoban_ui::SokobanScene;
use crate::sudoku_ui::SudokuScene;
use crate::tetris_ui::TetrisScene;
use crate::ui_kit::{self, ButtonLook};
use crate::whack_ui::WhackScene;

pub const CARD_HEIGHT: u32 = 72;
pub const CARD_GAP: u32 = 12;
pub const CARD_MAX_WIDTH: u32 = 640;
/// Padding above the first card and below the last one.
pub const LIST_PADDING: u32 = 16;
/// Pointer travel, in pixels, after which a press becomes a drag instead of a click.
pub const DRAG_THRESHOLD: i32 = 6;
pub const WHEEL_STEP: i32 = 48;
const FOOTER_HEIGHT: u32 = 44;
const CLOSE_SIZE: (u32, u32) = (104, 32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Minesweeper,
    Game2048,
    Tetris,
    Sokoban,
    Sudoku,
    Maze,
    Pong,
    PianoTiles,
    WhackAMole,
    Point24,
    LinkLink,
    Jigsaw,
    ComingSoon,
}

impl Activity {
    pub const ALL: [Activity; 13] = [
        Activity::Minesweeper,
        Activity::Game2048,
        Activity::Tetris,
        Activity::Sokoban,
        Activity::Sudoku,
        Activity::Maze,
        Activity::Pong,
        Activity::PianoTiles,
        Activity::WhackAMole,
        Activity::Point24,
        Activity::LinkLink,
        Activity::Jigsaw,
        Activity::ComingSoon,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Activity::Minesweeper => "MINESWEEPER",
            Activity::Game2048 => "2048",
            Activity::Tetris => "TETRIS",
            Activity::Sokoban => "SOKOBAN",
            Activity::Sudoku => "SUDOKU",
            Activity::Maze => "MAZE",
            Activity::Pong => "PONG",
            Activity::PianoTiles => "PIANO TILES",
            Activity::WhackAMole => "WHACK-A-MOLE",
            Activity::Point24 => "24 POINT",
            Activity::LinkLink => "LINK-LINK",
            Activity::Jigsaw => "JIGSAW",
            Activity::ComingSoon => "COMING SOON",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Activity::Minesweeper => "Clear the field without touching a mine",
            Activity::Game2048 => "Slide and merge tiles up to 2048",
            Activity::Tetris => "Stack falling pieces and clear lines",
            Activity::Sokoban => "Push every box onto a target",
            Activity::Sudoku => "Fill the grid, one of each digit per unit",
            Activity::Maze => "Find the exit before the clock runs out",
            Activity::Pong => "Break the wall with a bouncing ball",
            Activity::PianoTiles => "Tap the black tiles, never the white",
            Activity::WhackAMole => "Thirty seconds, nine holes, five rounds a day",
            Activity::Point24 => "Make 24 from four cards",
            Activity::LinkLink => "Connect matching pairs with two turns at most",
            Activity::Jigsaw => "Swap the pieces back into place",
            Activity::ComingSoon => "More games on the way",
        }
    }

    pub fn is_playable(self) -> bool {
        self != Activity::ComingSoon
    }

    /// Builds the scene for this entry; `None` for locked entries.
    pub fn launch(self, env: &mut ArcadeEnv) -> Option<Box<dyn Scene<ArcadeEnv>>> {
        let scene: Box<dyn Scene<ArcadeEnv>> = match self {
            Activity::Minesweeper => Box::new(MinesweeperScene::new(env)),
            Activity::Game2048 => Box::new(Game2048Scene::new(env)),
            Activity::Tetris => Box::new(TetrisScene::new()),
            Activity::Sokoban => Box::new(SokobanScene::new()),
            Activity::Sudoku => Box::new(SudokuScene::new()),
            Activity::Maze => Box::new(MazeScene::new(env)),
            Activity::Pong => Box::new(PongScene::new()),
            Activity::PianoTiles => Box::new(PianoScene::new()),
            Activity::WhackAMole => Box::new(WhackScene::new()),
            Activity::Point24 => Box::new(Point24Scene::new()),
            Activity::LinkLink => Box::new(LinkLinkScene::new()),
            Activity::Jigsaw => Box::new(JigsawScene::new()),
            Activity::ComingSoon => return None,
        };
        Some(scene)
    }
}

/// Total height of a card list with `count` entries.
pub fn content_height(count: usize) -> u32 {
    let n = count as u32;
    2 * LIST_PADDING + n * CARD_HEIGHT + n.saturating_sub(1) * CARD_GAP
}

/// The scrolling area between the header and the footer.
pub fn viewport(size: SurfaceSize) -> Rect {
    let body = ui_kit::body_rect(size);
    Rect::new(body.x, body.y, body.w, body.h.saturating_sub(FOOTER_HEIGHT))
}

pub fn close_button(size: SurfaceSize) -> Rect {
    let (w, h) = CLOSE_SIZE;
    Rect::new(
        size.width as i32 - w as i32 - 16,
        size.height as i32 - h as i32 - 6,
        w,
        h,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Press {
    origin: (i32, i32),
    last: (i32, i32),
    travelled: i32,
}

impl Press {
    fn is_drag(&self) -> bool {
        self.travelled > DRAG_THRESHOLD
    }
}

pub struct HubScene {
    active: bool,
    entries: Vec<Activity>,
    scroll: i32,
    focused: usize,
    press: Option<Press>,
    child: ChildSlot<ArcadeEnv>,
    banner: Option<String>,
}

impl HubScene {
    pub fn new() -> Self {
        Self::with_entries(Activity::ALL.to_vec())
    }

    pub fn with_entries(entries: Vec<Activity>) -> Self {
        Self {
            active: true,
            entries,
            scroll: 0,
            focused: 0,
            press: None,
            child: ChildSlot::new(),
            banner: None,
        }
    }

    pub fn entries(&self) -> &[Activity] {
        &self.entries
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn scroll(&self) -> i32 {
        self.scroll
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn show_banner(&mut self, text: impl Into<String>) {
        self.banner = Some(text.into());
    }

    pub fn child_name(&self) -> Option<&str> {
        self.child.name()
    }

    pub fn has_child(&self) -> bool {
        self.child.is_occupied()
    }

    pub fn scroll_max(&self, size: SurfaceSize) -> i32 {
        let content = content_height(self.entries.len());
        content.saturating_sub(viewport(size).h) as i32
    }

    /// Every scroll source lands here.
    fn set_scroll(&mut self, offset: i32, size: SurfaceSize) {
        self.scroll = offset.clamp(0, self.scroll_max(size));
    }

    fn scroll_by(&mut self, delta: i32, size: SurfaceSize) {
        self.set_scroll(self.scroll.saturating_add(delta), size);
    }

    fn card_width(size: SurfaceSize) -> u32 {
        viewport(size).w.saturating_sub(48).min(CARD_MAX_WIDTH)
    }

    /// Rectangle of entry `index` in surface coordinates at the current scroll offset.
    pub fn card_rect(&self, index: usize, size: SurfaceSize) -> Rect {
        let view = viewport(size);
        let w = Self::card_width(size);
        let x = view.x + (view.w.saturating_sub(w) / 2) as i32;
        let y = view.y + LIST_PADDING as i32 + index as i32 * (CARD_HEIGHT + CARD_GAP) as i32
            - self.scroll;
        Rect::new(x, y, w, CARD_HEIGHT)
    }

    /// Indices of the entries whose cards intersect the viewport.
    pub fn visible_entries(&self, size: SurfaceSize) -> Vec<usize> {
        let view = viewport(size);
        (0..self.entries.len())
            .filter(|&i| self.card_rect(i, size).intersects(&view))
            .collect()
    }

    pub fn entry_at(&self, pos: (i32, i32), size: SurfaceSize) -> Option<usize> {
        if !viewport(size).contains(pos.0, pos.1) {
            return None;
        }
        self.visible_entries(size)
            .into_iter()
            .find(|&i| self.card_rect(i, size).contains(pos.0, pos.1))
    }

    /// Starts `activity` as the running game. Returns `false` for locked entries.
    pub fn launch(&mut self, activity: Activity, env: &mut ArcadeEnv) -> bool {
        let Some(scene) = activity.launch(env) else {
            return false;
        };
        info!("launching {}", activity.title());
        env.play_sound(Sound::Click);
        self.install(scene, env);
        true
    }

    /// Installs an already built scene as the running game.
    pub fn install(&mut self, scene: Box<dyn Scene<ArcadeEnv>>, env: &mut ArcadeEnv) {
        self.banner = None;
        self.press = None;
        self.child.install(scene, env);
        self.reap_child(env);
    }

    fn reap_child(&mut self, env: &mut ArcadeEnv) {
        let Some(exit) = self.child.reap(env) else {
            return;
        };
        self.banner = match exit {
            ChildExit::Returned { result, .. } => result.map(|r| r.label),
            ChildExit::Crashed { scene, message } => {
                warn!("{scene} stopped: {message}");
                Some(format!("{} STOPPED AFTER AN ERROR", scene.to_uppercase()))
            }
        };
        // The surface may have changed size while the game ran.
        self.set_scroll(self.scroll, env.surface_size());
    }

    fn ensure_focused_visible(&mut self, size: SurfaceSize) {
        let view = viewport(size);
        let card = self.card_rect(self.focused, size);
        if card.y < view.y {
            self.scroll_by(card.y - view.y - LIST_PADDING as i32, size);
        } else if card.bottom() > view.bottom() {
            self.scroll_by(card.bottom() - view.bottom() + LIST_PADDING as i32, size);
        }
    }

    fn focus(&mut self, index: usize, size: SurfaceSize) {
        if self.entries.is_empty() {
            return;
        }
        self.focused = index.min(self.entries.len() - 1);
        self.ensure_focused_visible(size);
    }

    fn handle_key(&mut self, key: Key, env: &mut ArcadeEnv) {
        let size = env.surface_size();
        let page = viewport(size).h as i32;
        match key {
            Key::Escape => self.active = false,
            Key::Up | Key::Char('w') => self.focus(self.focused.saturating_sub(1), size),
            Key::Down | Key::Char('s') => self.focus(self.focused + 1, size),
            Key::Home => {
                self.focused = 0;
                self.set_scroll(0, size);
            }
            Key::End => {
                self.focused = self.entries.len().saturating_sub(1);
                self.set_scroll(i32::MAX, size);
            }
            Key::PageUp => self.scroll_by(-page, size),
            Key::PageDown => self.scroll_by(page, size),
            Key::Enter | Key::Space => {
                if let Some(&activity) = self.entries.get(self.focused) {
                    self.launch(activity, env);
                }
            }
            _ => {}
        }
    }

    fn click(&mut self, pos: (i32, i32), env: &mut ArcadeEnv) {
        let size = env.surface_size();
        if close_button(size).contains(pos.0, pos.1) {
            self.active = false;
            return;
        }
        let Some(index) = self.entry_at(pos, size) else {
            return;
        };
        self.focused = index;
        let activity = self.entries[index];
        self.launch(activity, env);
    }

    pub fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        if matches!(event, InputEvent::Quit) {
            // The running game still gets its exit hook so it can save.
            self.child.close(env);
            self.active = false;
            return;
        }
        if self.child.dispatch(event, env) {
            self.reap_child(env);
            return;
        }
        let size = env.surface_size();
        match *event {
            InputEvent::KeyDown { key } => self.handle_key(key, env),
            InputEvent::Wheel { dy } => {
                // Positive wheel deltas scroll towards the top of the list.
                self.scroll_by(-(dy * WHEEL_STEP as f32).round() as i32, size);
            }
            InputEvent::MouseDown {
                button: MouseButton::Left,
                pos,
            } => {
                self.press = Some(Press {
                    origin: pos,
                    last: pos,
                    travelled: 0,
                });
            }
            InputEvent::MouseMove { pos } => {
                let Some(mut press) = self.press else {
                    return;
                };
                let was_drag = press.is_drag();
                let (dx, dy) = (pos.0 - press.last.0, pos.1 - press.last.1);
                press.travelled += dx.abs() + dy.abs();
                press.last = pos;
                self.press = Some(press);
                if press.is_drag() {
                    // Crossing the threshold catches up on the travel held back so far.
                    let dy = if was_drag { dy } else { pos.1 - press.origin.1 };
                    self.scroll_by(-dy, size);
                }
            }
            InputEvent::MouseUp {
                button: MouseButton::Left,
                pos,
            } => {
                if let Some(press) = self.press.take() {
                    if !press.is_drag() {
                        self.click(pos, env);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.child.update(dt, env) {
            self.reap_child(env);
        } else {
            self.set_scroll(self.scroll, env.surface_size());
        }
    }

    pub fn render(&mut self, gfx: &mut dyn Renderer2d, env: &mut ArcadeEnv) {
        if self.child.is_occupied() {
            if self.child.draw(gfx, env) {
                return;
            }
            self.reap_child(env);
        }
        self.draw_catalog(gfx, env);
    }

    fn draw_catalog(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        let size = gfx.size();
        let bar = ui_kit::header(gfx, "ACTIVITIES", env.profile().get_coins());
        if let Some(banner) = &self.banner {
            let style = TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_GOOD);
            let (w, h) = measure_text(banner, style.size);
            let x = (size.width.saturating_sub(w) / 2) as i32;
            let y = bar.y + (bar.h.saturating_sub(h) / 2) as i32;
            gfx.draw_text(x, y, banner, style);
        }

        let view = viewport(size);
        gfx.push_clip(view);
        for i in self.visible_entries(size) {
            self.draw_card(gfx, i, size);
        }
        gfx.pop_clip();

        let max = self.scroll_max(size);
        if max > 0 {
            let track = Rect::new(view.right() - 10, view.y + 4, 4, view.h.saturating_sub(8));
            gfx.fill_rect(track, ui_kit::COLOR_PANEL_BORDER);
            let thumb_h = (track.h * view.h / content_height(self.entries.len()).max(1)).max(16);
            let travel = track.h.saturating_sub(thumb_h) as i64;
            let offset = travel * i64::from(self.scroll) / i64::from(max);
            let thumb = Rect::new(track.x, track.y + offset as i32, track.w, thumb_h);
            gfx.fill_rect(thumb, ui_kit::COLOR_TEXT_DIM);
        }

        ui_kit::footer_hint(gfx, "WHEEL/DRAG: SCROLL   ENTER/CLICK: PLAY   ESC: CLOSE");
        ui_kit::button(gfx, close_button(size), "CLOSE", ButtonLook::Normal);
    }

    fn draw_card(&self, gfx: &mut dyn Renderer2d, index: usize, size: SurfaceSize) {
        let activity = self.entries[index];
        let card = self.card_rect(index, size);
        let look = if !activity.is_playable() {
            ButtonLook::Disabled
        } else if index == self.focused {
            ButtonLook::Selected
        } else {
            ButtonLook::Normal
        };
        ui_kit::button(gfx, card, "", look);
        let inner = card.inset(Insets::symmetric(20, 12));
        let title_color = if activity.is_playable() {
            ui_kit::COLOR_TEXT
        } else {
            ui_kit::COLOR_TEXT_DIM
        };
        gfx.draw_text(
            inner.x,
            inner.y,
            activity.title(),
            TextStyle::title(ui_kit::TEXT_BODY + 4, title_color),
        );
        gfx.draw_text(
            inner.x,
            inner.y + 28,
            activity.subtitle(),
            TextStyle::body(ui_kit::TEXT_SMALL + 2, ui_kit::COLOR_TEXT_DIM),
        );
        if !activity.is_playable() {
            let lock = "LOCKED";
            let (w, _) = measure_text(lock, ui_kit::TEXT_SMALL);
            gfx.draw_text(
                inner.right() - w as i32,
                inner.y,
                lock,
                TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_TEXT_DIM),
            );
        }
    }
}

impl Default for HubScene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use engine::scene::SceneResult;

    use super::*;

    fn env() -> ArcadeEnv {
        ArcadeEnv::headless(3, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    fn press(hub: &mut HubScene, env: &mut ArcadeEnv, key: Key) {
        hub.handle_event(&InputEvent::KeyDown { key }, env);
    }

    #[test]
    fn content_height_follows_entry_count() {
        assert_eq!(content_height(0), 2 * LIST_PADDING);
        assert_eq!(content_height(1), 2 * LIST_PADDING + CARD_HEIGHT);
        assert_eq!(
            content_height(13),
            2 * LIST_PADDING + 13 * CARD_HEIGHT + 12 * CARD_GAP
        );
    }

    #[test]
    fn short_catalog_cannot_scroll() {
        let mut env = env();
        let mut hub = HubScene::with_entries(vec![Activity::Sokoban, Activity::Jigsaw]);
        assert_eq!(hub.scroll_max(env.surface_size()), 0);
        hub.handle_event(&InputEvent::Wheel { dy: -5.0 }, &mut env);
        press(&mut hub, &mut env, Key::End);
        assert_eq!(hub.scroll(), 0);
    }

    #[test]
    fn end_and_home_hit_the_clamp_bounds() {
        let mut env = env();
        let mut hub = HubScene::new();
        let max = hub.scroll_max(env.surface_size());
        assert!(max > 0);
        press(&mut hub, &mut env, Key::End);
        assert_eq!(hub.scroll(), max);
        assert_eq!(hub.focused(), Activity::ALL.len() - 1);
        press(&mut hub, &mut env, Key::Home);
        assert_eq!(hub.scroll(), 0);
        assert_eq!(hub.focused(), 0);
    }

    #[test]
    fn enter_launches_the_focused_entry() {
        let mut env = env();
        let mut hub = HubScene::new();
        press(&mut hub, &mut env, Key::Down);
        press(&mut hub, &mut env, Key::Enter);
        assert_eq!(hub.child_name(), Some("2048"));
    }

    #[test]
    fn child_result_becomes_the_banner_until_next_launch() {
        struct Done;
        impl Scene<ArcadeEnv> for Done {
            fn name(&self) -> &str {
                "done"
            }
            fn handle_event(&mut self, _event: &InputEvent, _env: &mut ArcadeEnv) {}
            fn update(&mut self, _dt: Duration, _env: &mut ArcadeEnv) {}
            fn draw(&self, _gfx: &mut dyn Renderer2d, _env: &ArcadeEnv) {}
            fn is_active(&self) -> bool {
                false
            }
            fn result(&self) -> Option<SceneResult> {
                Some(SceneResult::new("CLEARED IN 40 MOVES", Some(40)))
            }
        }

        let mut env = env();
        let mut hub = HubScene::new();
        hub.install(Box::new(Done), &mut env);
        assert!(!hub.has_child());
        assert_eq!(hub.banner(), Some("CLEARED IN 40 MOVES"));

        assert!(hub.launch(Activity::Sudoku, &mut env));
        assert_eq!(hub.banner(), None);
    }
}

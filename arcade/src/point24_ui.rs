use std::time::Duration;

use engine::graphics::{Renderer2d, TextStyle};
use engine::input::{InputEvent, Key};
use engine::scene::{Scene, SceneResult};
use engine::surface::SurfaceSize;
use engine::ui::{Anchor, Rect, Size};

use crate::env::ArcadeEnv;
use crate::point24_core::{CombineOutcome, Op, Point24Session, Rejected, SessionState};
use crate::profile::Rank;
use crate::sfx::Sound;
use crate::ui_kit::{self, ButtonLook, MenuInput, MenuList};

pub const BEST_KEY: &str = "point24";
const SOLVE_REWARD: u64 = 5;
const CARD_SIZE: Size = Size { w: 150, h: 200 };
const CARD_GAP: u32 = 24;
const OP_SIZE: Size = Size { w: 80, h: 56 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct Point24Scene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    session: Option<Point24Session>,
    selected: Vec<usize>,
    message: Option<String>,
    new_best: bool,
    result: Option<SceneResult>,
}

fn op_for_key(key: Key) -> Option<Op> {
    match key {
        Key::Char('+') | Key::Char('=') => Some(Op::Add),
        Key::Char('-') => Some(Op::Sub),
        Key::Char('*') | Key::Char('x') => Some(Op::Mul),
        Key::Char('/') => Some(Op::Div),
        _ => None,
    }
}

impl Point24Scene {
    pub fn new() -> Self {
        Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(["START", "BACK"]),
            session: None,
            selected: Vec::new(),
            message: None,
            new_best: false,
            result: None,
        }
    }

    pub fn session(&self) -> Option<&Point24Session> {
        self.session.as_ref()
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn start(&mut self, env: &mut ArcadeEnv) {
        self.start_with(Point24Session::new(env.next_seed()));
    }

    pub fn start_with(&mut self, session: Point24Session) {
        self.session = Some(session);
        self.selected.clear();
        self.message = None;
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn card_rects(size: SurfaceSize, count: usize) -> Vec<Rect> {
        let body = ui_kit::body_rect(size);
        let n = count as u32;
        let row = Size::new(n * CARD_SIZE.w + n.saturating_sub(1) * CARD_GAP, CARD_SIZE.h);
        let area = Rect::new(body.x, body.y + 60, body.w, CARD_SIZE.h + 20);
        let row = area.place(row, Anchor::Center);
        (0..n)
            .map(|i| {
                Rect::new(
                    row.x + (i * (CARD_SIZE.w + CARD_GAP)) as i32,
                    row.y,
                    CARD_SIZE.w,
                    CARD_SIZE.h,
                )
            })
            .collect()
    }

    fn op_rects(size: SurfaceSize) -> Vec<(Op, Rect)> {
        let body = ui_kit::body_rect(size);
        let n = Op::ALL.len() as u32;
        let row = Size::new(n * OP_SIZE.w + (n - 1) * CARD_GAP, OP_SIZE.h);
        let area = Rect::new(body.x, body.y + 300, body.w, OP_SIZE.h + 20);
        let row = area.place(row, Anchor::Center);
        Op::ALL
            .into_iter()
            .enumerate()
            .map(|(i, op)| {
                let x = row.x + (i as u32 * (OP_SIZE.w + CARD_GAP)) as i32;
                (op, Rect::new(x, row.y, OP_SIZE.w, OP_SIZE.h))
            })
            .collect()
    }

    fn toggle(&mut self, index: usize) {
        let count = self.session.as_ref().map_or(0, |s| s.cards().len());
        if index >= count {
            return;
        }
        if let Some(at) = self.selected.iter().position(|&i| i == index) {
            self.selected.remove(at);
        } else {
            self.selected.push(index);
        }
    }

    fn apply(&mut self, op: Op, env: &mut ArcadeEnv) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let outcome = session.combine(&self.selected, op);
        match outcome {
            CombineOutcome::Combined(_) => {
                self.selected.clear();
                self.message = None;
                env.play_sound(Sound::Merge);
            }
            CombineOutcome::DeadEnd(v) => {
                self.selected.clear();
                self.message = Some(format!("{v} IS NOT 24. U: UNDO  R: RESET"));
                env.play_sound(Sound::Miss);
            }
            CombineOutcome::Solved(points) => {
                self.selected.clear();
                self.message = Some(format!("24! +{points}"));
                env.profile_mut().add_coins(SOLVE_REWARD);
                env.play_sound(Sound::Win);
            }
            CombineOutcome::Rejected(reason) => {
                self.message = Some(
                    match reason {
                        Rejected::TooFewOperands => "PICK AT LEAST TWO CARDS",
                        Rejected::TwoOperandsOnly => "- AND / TAKE EXACTLY TWO CARDS",
                        Rejected::NotDivisible => "DIVISION MUST BE EXACT",
                        Rejected::RoundOver => "ROUND OVER",
                    }
                    .to_string(),
                );
                env.play_sound(Sound::Miss);
            }
        }
    }

    fn finish(&mut self, env: &mut ArcadeEnv) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let score = i64::from(session.score());
        self.new_best = score > 0
            && env
                .profile_mut()
                .record_best(BEST_KEY, score, Rank::HigherIsBetter);
        self.result = Some(SceneResult::new(
            format!("24-POINT {score} POINTS, {} ROUNDS", session.rounds_won()),
            Some(score),
        ));
    }

    fn handle_menu(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        if event.is_escape() {
            self.active = false;
            return;
        }
        let area = ui_kit::body_rect(env.surface_size());
        match self.menu.handle(event, area) {
            MenuInput::Activated(0) => {
                env.play_sound(Sound::Click);
                self.start(env);
            }
            MenuInput::Activated(_) => self.active = false,
            MenuInput::Moved | MenuInput::Ignored => {}
        }
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let Some(state) = self.session.as_ref().map(Point24Session::state) else {
            self.phase = Phase::Menu;
            return;
        };
        if let Some(pos) = event.left_click() {
            if state != SessionState::Playing {
                return;
            }
            let size = env.surface_size();
            let count = self.session.as_ref().map_or(0, |s| s.cards().len());
            if let Some(i) = Self::card_rects(size, count)
                .iter()
                .position(|r| r.contains(pos.0, pos.1))
            {
                self.toggle(i);
                env.play_sound(Sound::Click);
            } else if let Some((op, _)) = Self::op_rects(size)
                .into_iter()
                .find(|(_, r)| r.contains(pos.0, pos.1))
            {
                self.apply(op, env);
            }
            return;
        }
        let Some(key) = event.key_down() else {
            return;
        };
        if key == Key::Escape {
            if state == SessionState::Playing {
                self.finish(env);
            }
            self.phase = Phase::Menu;
            return;
        }
        match state {
            SessionState::Solved => {
                if key == Key::Enter {
                    if let Some(session) = self.session.as_mut() {
                        session.next_round();
                    }
                    self.message = None;
                }
            }
            SessionState::TimeUp => {
                if key == Key::Enter {
                    self.start(env);
                }
            }
            SessionState::Playing => {
                if let Some(op) = op_for_key(key) {
                    self.apply(op, env);
                    return;
                }
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                match key {
                    Key::Char('u') | Key::Backspace => {
                        if session.undo() {
                            self.selected.clear();
                        }
                    }
                    Key::Char('r') => {
                        session.reset_round();
                        self.selected.clear();
                        self.message = None;
                    }
                    Key::Char('h') => {
                        self.message = Some(match session.hint() {
                            Some(expr) => format!("HINT: {expr}"),
                            None => "NO SOLUTION".into(),
                        });
                    }
                    _ => {
                        if let Some(d) = key.digit().filter(|d| (1..=4).contains(d)) {
                            self.toggle(usize::from(d - 1));
                        }
                    }
                }
            }
        }
    }

    fn draw_session(&self, gfx: &mut dyn Renderer2d, session: &Point24Session) {
        let size = gfx.size();
        let body = ui_kit::body_rect(size);
        let status = format!(
            "SCORE {}   ROUNDS {}   TIME {}",
            session.score(),
            session.rounds_won(),
            session.timer().remaining_secs_ceil()
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 12, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
        let cards = session.cards();
        for (i, rect) in Self::card_rects(size, cards.len()).into_iter().enumerate() {
            let look = if self.selected.contains(&i) {
                ButtonLook::Selected
            } else {
                ButtonLook::Normal
            };
            ui_kit::button(gfx, rect, "", look);
            ui_kit::text_centered(
                gfx,
                rect,
                &cards[i].value.to_string(),
                TextStyle::title(ui_kit::TEXT_TITLE + 18, ui_kit::COLOR_TEXT),
            );
            let expr = Rect::new(rect.x, rect.bottom() - 30, rect.w, 24);
            ui_kit::text_centered(
                gfx,
                expr,
                &cards[i].expr,
                TextStyle::body(ui_kit::TEXT_SMALL, ui_kit::COLOR_TEXT_DIM),
            );
        }
        for (op, rect) in Self::op_rects(size) {
            ui_kit::button(gfx, rect, op.symbol(), ButtonLook::Normal);
        }
        if let Some(message) = &self.message {
            ui_kit::text_centered(
                gfx,
                Rect::new(body.x, body.y + 390, body.w, 28),
                message,
                TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_ACCENT),
            );
        }
    }
}

impl Default for Point24Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene<ArcadeEnv> for Point24Scene {
    fn name(&self) -> &str {
        "point24"
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
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let was_playing = session.state() == SessionState::Playing;
        session.update(dt);
        if was_playing && session.state() == SessionState::TimeUp {
            env.play_sound(Sound::Lose);
            self.selected.clear();
            self.finish(env);
        }
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "24 POINT", env.profile().get_coins());
        match (self.phase, self.session.as_ref()) {
            (Phase::Playing, Some(session)) => {
                self.draw_session(gfx, session);
                ui_kit::footer_hint(
                    gfx,
                    "1-4: PICK   + - * /: COMBINE   U: UNDO   R: RESET   H: HINT   ESC: MENU",
                );
                match session.state() {
                    SessionState::Solved => {
                        let lines = vec![
                            format!("+{} POINTS", session.last_points()),
                            "ENTER: NEXT HAND".to_string(),
                        ];
                        ui_kit::result_card(gfx, "24!", ui_kit::COLOR_GOOD, &lines);
                    }
                    SessionState::TimeUp => {
                        let best = env.profile().best_score(BEST_KEY).unwrap_or(0);
                        let mut lines = vec![
                            format!("SCORE {}", session.score()),
                            format!("BEST {best}"),
                        ];
                        if let Some(expr) = session.hint() {
                            lines.push(format!("ANSWER {expr}"));
                        }
                        if self.new_best {
                            lines.push("NEW BEST".into());
                        }
                        ui_kit::result_card(gfx, "TIME UP", ui_kit::COLOR_BAD, &lines);
                    }
                    SessionState::Playing => {}
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

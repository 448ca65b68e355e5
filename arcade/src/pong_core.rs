//! Breakout-style Pong: a paddle, one or more balls and a wall of bricks, some of them special.
//!
//! Coordinates are field pixels with the origin top-left. Physics advances in fixed sub-steps so
//! a fast ball cannot tunnel through a brick in a long frame.

use std::f32::consts::PI;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const FIELD_W: f32 = 640.0;
pub const FIELD_H: f32 = 560.0;

pub const PADDLE_W: f32 = 100.0;
pub const PADDLE_H: f32 = 14.0;
pub const PADDLE_Y: f32 = FIELD_H - 40.0;
pub const PADDLE_SPEED: f32 = 560.0;
pub const WIDE_FACTOR: f32 = 1.6;

pub const BALL_RADIUS: f32 = 7.0;
pub const BALL_SPEED: f32 = 360.0;
pub const MAX_BALLS: usize = 12;
pub const SLOW_FACTOR: f32 = 0.6;

pub const BRICK_COLS: usize = 10;
pub const BRICK_ROWS: usize = 6;
pub const BRICK_W: f32 = FIELD_W / BRICK_COLS as f32;
pub const BRICK_H: f32 = 22.0;
pub const BRICK_TOP: f32 = 60.0;
const BRICK_GAP: f32 = 2.0;

pub const INITIAL_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 9;
pub const BRICK_POINTS: u64 = 10;

pub const WIDE_TIME: Duration = Duration::from_secs(10);
pub const SLOW_TIME: Duration = Duration::from_secs(8);
pub const MULTIPLIER_TIME: Duration = Duration::from_secs(10);

const SUB_STEP: f32 = 1.0 / 240.0;
/// Largest paddle deflection from vertical.
const MAX_BOUNCE: f32 = PI * 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrickKind {
    Normal,
    /// Takes two hits.
    Tough,
    /// Every ball in play splits in two.
    Split,
    /// A fresh ball leaves the paddle.
    AddBall,
    Wide,
    Slow,
    ExtraLife,
    /// Doubles brick points for a while.
    Multiplier,
    /// Destroys its eight neighbors.
    Explosive,
}

impl BrickKind {
    const SPECIALS: [BrickKind; 7] = [
        BrickKind::Split,
        BrickKind::AddBall,
        BrickKind::Wide,
        BrickKind::Slow,
        BrickKind::ExtraLife,
        BrickKind::Multiplier,
        BrickKind::Explosive,
    ];

    fn hit_points(self) -> u8 {
        match self {
            BrickKind::Tough => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brick {
    pub col: usize,
    pub row: usize,
    pub kind: BrickKind,
    pub hp: u8,
    pub alive: bool,
}

impl Brick {
    pub fn new(col: usize, row: usize, kind: BrickKind) -> Self {
        Self {
            col,
            row,
            kind,
            hp: kind.hit_points(),
            alive: true,
        }
    }

    /// `(x, y, w, h)` in field pixels.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        (
            self.col as f32 * BRICK_W + BRICK_GAP / 2.0,
            BRICK_TOP + self.row as f32 * BRICK_H + BRICK_GAP / 2.0,
            BRICK_W - BRICK_GAP,
            BRICK_H - BRICK_GAP,
        )
    }

    fn touches(&self, other: &Brick) -> bool {
        self.col.abs_diff(other.col) <= 1 && self.row.abs_diff(other.row) <= 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl Ball {
    pub fn new(x: f32, y: f32, vx: f32, vy: f32) -> Self {
        Self { x, y, vx, vy }
    }

    fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PongState {
    /// The ball rests on the paddle until launched.
    Serving,
    Playing,
    GameOver,
}

/// What happened during one `update`, for sounds and the result banner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PongEvents {
    pub bricks_broken: u32,
    pub paddle_hits: u32,
    pub specials: u32,
    pub ball_lost: bool,
    pub wave_cleared: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone)]
pub struct PongGame {
    rng: StdRng,
    paddle_x: f32,
    paddle_dir: f32,
    balls: Vec<Ball>,
    bricks: Vec<Brick>,
    state: PongState,
    lives: u32,
    score: u64,
    level: u32,
    wide_left: Duration,
    slow_left: Duration,
    multiplier_left: Duration,
}

impl PongGame {
    pub fn new(seed: u64) -> Self {
        let mut game = Self::blank(StdRng::seed_from_u64(seed));
        game.bricks = Self::generate_wave(&mut game.rng, 1);
        game.serve();
        game
    }

    /// A game already in play with the given bricks and balls.
    pub fn with_layout(bricks: Vec<Brick>, balls: Vec<Ball>, lives: u32) -> Self {
        let mut game = Self::blank(StdRng::seed_from_u64(0));
        game.bricks = bricks;
        game.balls = balls;
        game.lives = lives;
        game.state = PongState::Playing;
        game
    }

    fn blank(rng: StdRng) -> Self {
        Self {
            rng,
            paddle_x: (FIELD_W - PADDLE_W) / 2.0,
            paddle_dir: 0.0,
            balls: Vec::new(),
            bricks: Vec::new(),
            state: PongState::Serving,
            lives: INITIAL_LIVES,
            score: 0,
            level: 1,
            wide_left: Duration::ZERO,
            slow_left: Duration::ZERO,
            multiplier_left: Duration::ZERO,
        }
    }

    fn generate_wave(rng: &mut StdRng, level: u32) -> Vec<Brick> {
        let rows = (BRICK_ROWS - 2 + level as usize).min(BRICK_ROWS);
        let mut bricks = Vec::with_capacity(rows * BRICK_COLS);
        for row in 0..rows {
            for col in 0..BRICK_COLS {
                let roll: f32 = rng.random();
                let kind = if roll < 0.15 {
                    BrickKind::SPECIALS[rng.random_range(0..BrickKind::SPECIALS.len())]
                } else if roll < 0.15 + 0.05 * level.min(6) as f32 {
                    BrickKind::Tough
                } else {
                    BrickKind::Normal
                };
                bricks.push(Brick::new(col, row, kind));
            }
        }
        bricks
    }

    pub fn paddle_width(&self) -> f32 {
        if self.wide_left.is_zero() {
            PADDLE_W
        } else {
            PADDLE_W * WIDE_FACTOR
        }
    }

    /// `(x, y, w, h)` of the paddle.
    pub fn paddle_rect(&self) -> (f32, f32, f32, f32) {
        (self.paddle_x, PADDLE_Y, self.paddle_width(), PADDLE_H)
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn state(&self) -> PongState {
        self.state
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn multiplier(&self) -> u64 {
        if self.multiplier_left.is_zero() { 1 } else { 2 }
    }

    pub fn wide_left(&self) -> Duration {
        self.wide_left
    }

    pub fn slow_left(&self) -> Duration {
        self.slow_left
    }

    fn ball_speed(&self) -> f32 {
        BALL_SPEED * (1.0 + 0.08 * (self.level.min(8) - 1) as f32)
    }

    /// Held paddle direction: negative left, positive right, zero stops.
    pub fn set_paddle_dir(&mut self, dir: f32) {
        self.paddle_dir = if dir < 0.0 {
            -1.0
        } else if dir > 0.0 {
            1.0
        } else {
            0.0
        };
    }

    /// Centers the paddle on `x` (mouse control).
    pub fn move_paddle_to(&mut self, x: f32) {
        self.paddle_x = (x - self.paddle_width() / 2.0).clamp(0.0, FIELD_W - self.paddle_width());
        if self.state == PongState::Serving {
            self.stick_ball_to_paddle();
        }
    }

    fn serve(&mut self) {
        self.state = PongState::Serving;
        self.balls = vec![Ball::new(0.0, 0.0, 0.0, 0.0)];
        self.stick_ball_to_paddle();
    }

    fn stick_ball_to_paddle(&mut self) {
        let cx = self.paddle_x + self.paddle_width() / 2.0;
        if let Some(ball) = self.balls.first_mut() {
            ball.x = cx;
            ball.y = PADDLE_Y - BALL_RADIUS - 1.0;
        }
    }

    pub fn launch(&mut self) -> bool {
        if self.state != PongState::Serving {
            return false;
        }
        let angle = self.rng.random_range(-0.4f32..0.4);
        let speed = self.ball_speed();
        if let Some(ball) = self.balls.first_mut() {
            ball.vx = angle.sin() * speed;
            ball.vy = -angle.cos() * speed;
        }
        self.state = PongState::Playing;
        true
    }

    pub fn update(&mut self, dt: Duration) -> PongEvents {
        let mut events = PongEvents::default();
        if self.state == PongState::GameOver {
            return events;
        }
        self.wide_left = self.wide_left.saturating_sub(dt);
        self.slow_left = self.slow_left.saturating_sub(dt);
        self.multiplier_left = self.multiplier_left.saturating_sub(dt);
        self.paddle_x = self.paddle_x.clamp(0.0, FIELD_W - self.paddle_width());

        let mut left = dt.as_secs_f32();
        while left > 0.0 {
            let step = left.min(SUB_STEP);
            left -= step;
            self.step(step, &mut events);
            if self.state != PongState::Playing && self.state != PongState::Serving {
                break;
            }
        }
        events
    }

    fn step(&mut self, dt: f32, events: &mut PongEvents) {
        let width = self.paddle_width();
        self.paddle_x = (self.paddle_x + self.paddle_dir * PADDLE_SPEED * dt).clamp(0.0, FIELD_W - width);
        if self.state == PongState::Serving {
            self.stick_ball_to_paddle();
            return;
        }

        let factor = if self.slow_left.is_zero() { 1.0 } else { SLOW_FACTOR };
        let count = self.balls.len();
        for i in 0..count {
            let ball = &mut self.balls[i];
            ball.x += ball.vx * dt * factor;
            ball.y += ball.vy * dt * factor;
            Self::bounce_walls(ball);
            if self.bounce_paddle(i) {
                events.paddle_hits += 1;
            }
            self.collide_bricks(i, events);
        }

        self.balls.retain(|b| b.y - BALL_RADIUS <= FIELD_H);
        if self.balls.is_empty() {
            events.ball_lost = true;
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.state = PongState::GameOver;
                events.game_over = true;
            } else {
                self.serve();
            }
            return;
        }

        self.bricks.retain(|b| b.alive);
        if self.bricks.is_empty() {
            events.wave_cleared = true;
            self.score += 100 * u64::from(self.level);
            self.level += 1;
            self.bricks = Self::generate_wave(&mut self.rng, self.level);
            self.serve();
        }
    }

    fn bounce_walls(ball: &mut Ball) {
        if ball.x - BALL_RADIUS < 0.0 {
            ball.x = BALL_RADIUS;
            ball.vx = ball.vx.abs();
        }
        if ball.x + BALL_RADIUS > FIELD_W {
            ball.x = FIELD_W - BALL_RADIUS;
            ball.vx = -ball.vx.abs();
        }
        if ball.y - BALL_RADIUS < 0.0 {
            ball.y = BALL_RADIUS;
            ball.vy = ball.vy.abs();
        }
    }

    fn bounce_paddle(&mut self, i: usize) -> bool {
        let (px, py, pw, ph) = self.paddle_rect();
        let ball = &mut self.balls[i];
        let overlaps = ball.x + BALL_RADIUS > px
            && ball.x - BALL_RADIUS < px + pw
            && ball.y + BALL_RADIUS > py
            && ball.y - BALL_RADIUS < py + ph;
        if !overlaps || ball.vy <= 0.0 {
            return false;
        }
        ball.y = py - BALL_RADIUS;
        let hit = ((ball.x - px) / pw).clamp(0.0, 1.0);
        let angle = (hit - 0.5) * 2.0 * MAX_BOUNCE;
        let speed = ball.speed();
        ball.vx = angle.sin() * speed;
        ball.vy = -angle.cos().abs() * speed;
        true
    }

    fn collide_bricks(&mut self, i: usize, events: &mut PongEvents) {
        let ball = self.balls[i];
        let hit = self.bricks.iter().position(|brick| {
            if !brick.alive {
                return false;
            }
            let (bx, by, bw, bh) = brick.rect();
            ball.x + BALL_RADIUS > bx
                && ball.x - BALL_RADIUS < bx + bw
                && ball.y + BALL_RADIUS > by
                && ball.y - BALL_RADIUS < by + bh
        });
        let Some(index) = hit else {
            return;
        };
        let (bx, by, bw, bh) = self.bricks[index].rect();
        let overlap_x = ((ball.x + BALL_RADIUS) - bx).min((bx + bw) - (ball.x - BALL_RADIUS));
        let overlap_y = ((ball.y + BALL_RADIUS) - by).min((by + bh) - (ball.y - BALL_RADIUS));
        let ball = &mut self.balls[i];
        if overlap_x < overlap_y {
            ball.vx = if ball.x < bx + bw / 2.0 { -ball.vx.abs() } else { ball.vx.abs() };
        } else {
            ball.vy = if ball.y < by + bh / 2.0 { -ball.vy.abs() } else { ball.vy.abs() };
        }

        let brick = &mut self.bricks[index];
        brick.hp = brick.hp.saturating_sub(1);
        if brick.hp == 0 {
            self.break_brick(index, events);
        }
    }

    /// Removes a brick and resolves its effect; explosions chain into neighboring specials.
    fn break_brick(&mut self, index: usize, events: &mut PongEvents) {
        let mut queue = vec![index];
        while let Some(i) = queue.pop() {
            if !self.bricks[i].alive {
                continue;
            }
            let brick = self.bricks[i];
            self.bricks[i].alive = false;
            events.bricks_broken += 1;
            let base = match brick.kind {
                BrickKind::Tough => 2 * BRICK_POINTS,
                _ => BRICK_POINTS,
            };
            self.score += base * self.multiplier();
            match brick.kind {
                BrickKind::Normal | BrickKind::Tough => {}
                BrickKind::Explosive => {
                    events.specials += 1;
                    queue.extend(
                        self.bricks
                            .iter()
                            .enumerate()
                            .filter(|(_, b)| b.alive && b.touches(&brick))
                            .map(|(j, _)| j),
                    );
                }
                special => {
                    events.specials += 1;
                    self.apply_special(special);
                }
            }
        }
    }

    fn apply_special(&mut self, kind: BrickKind) {
        match kind {
            BrickKind::Split => {
                let clones: Vec<Ball> = self
                    .balls
                    .iter()
                    .map(|b| Ball::new(b.x, b.y, -b.vx, b.vy))
                    .collect();
                for ball in clones {
                    if self.balls.len() >= MAX_BALLS {
                        break;
                    }
                    self.balls.push(ball);
                }
            }
            BrickKind::AddBall => {
                if self.balls.len() < MAX_BALLS {
                    let cx = self.paddle_x + self.paddle_width() / 2.0;
                    let speed = self.ball_speed();
                    self.balls.push(Ball::new(cx, PADDLE_Y - BALL_RADIUS - 1.0, 0.0, -speed));
                }
            }
            BrickKind::Wide => self.wide_left = WIDE_TIME,
            BrickKind::Slow => self.slow_left = SLOW_TIME,
            BrickKind::ExtraLife => self.lives = (self.lives + 1).min(MAX_LIVES),
            BrickKind::Multiplier => self.multiplier_left = MULTIPLIER_TIME,
            BrickKind::Normal | BrickKind::Tough | BrickKind::Explosive => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_serves_from_the_paddle() {
        let mut game = PongGame::new(5);
        assert_eq!(game.state(), PongState::Serving);
        assert_eq!(game.bricks().len(), (BRICK_ROWS - 1) * BRICK_COLS);
        game.move_paddle_to(100.0);
        assert_eq!(game.balls()[0].x, 100.0);
        assert!(game.launch());
        assert!(game.balls()[0].vy < 0.0);
        assert!(!game.launch());
    }

    #[test]
    fn paddle_edge_deflects_the_ball_sideways() {
        let (px, _, pw, _) = PongGame::new(1).paddle_rect();
        let ball = Ball::new(px + pw - 2.0, PADDLE_Y - BALL_RADIUS - 2.0, 0.0, BALL_SPEED);
        let mut game = PongGame::with_layout(vec![Brick::new(0, 0, BrickKind::Normal)], vec![ball], 3);
        let events = game.update(Duration::from_millis(20));
        assert_eq!(events.paddle_hits, 1);
        let ball = game.balls()[0];
        assert!(ball.vy < 0.0);
        assert!(ball.vx > 0.0);
    }

    #[test]
    fn wave_clear_advances_the_level() {
        let ball = Ball::new(BRICK_W * 4.5, 150.0, 0.0, -BALL_SPEED);
        let mut game = PongGame::with_layout(vec![Brick::new(4, 0, BrickKind::Normal)], vec![ball], 3);
        let events = game.update(Duration::from_millis(400));
        assert!(events.wave_cleared);
        assert_eq!(game.level(), 2);
        assert_eq!(game.score(), BRICK_POINTS + 100);
        assert_eq!(game.state(), PongState::Serving);
        assert_eq!(game.bricks().len(), BRICK_ROWS * BRICK_COLS);
    }
}

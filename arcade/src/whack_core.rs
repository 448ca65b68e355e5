//! Whack-a-Mole: a 30-second round over a 3×3 field of holes.
//!
//! Moles pop up in batches, stay up for a show time that shrinks as the score grows, and come in
//! four kinds. Whacking an empty hole or a bomb costs points; so does letting a mole escape.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::round_timer::RoundTimer;

pub const HOLES: usize = 9;
pub const GRID: usize = 3;
pub const ROUND_TIME: Duration = Duration::from_secs(30);
pub const DAILY_LIMIT: u32 = 5;
pub const GAME_ID: &str = "whack";

pub const MISS_PENALTY: u64 = 5;
pub const ESCAPE_PENALTY: u64 = 3;
pub const BOMB_PENALTY: u64 = 30;

const BASE_SHOW_MS: f32 = 1400.0;
const MIN_SHOW_MS: f32 = 500.0;
/// Show time lost per point scored.
const SHOW_MS_PER_POINT: f32 = 2.5;
const SPAWN_INTERVAL: Duration = Duration::from_millis(650);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoleKind {
    Normal,
    Golden,
    Fast,
    Bomb,
}

impl MoleKind {
    pub fn points(self) -> u64 {
        match self {
            MoleKind::Normal => 10,
            MoleKind::Golden => 30,
            MoleKind::Fast => 20,
            MoleKind::Bomb => 0,
        }
    }

    fn show_factor(self) -> f32 {
        match self {
            MoleKind::Fast => 0.55,
            MoleKind::Golden => 0.8,
            MoleKind::Normal | MoleKind::Bomb => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mole {
    pub kind: MoleKind,
    pub left: Duration,
    pub shown_for: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhackOutcome {
    Ignored,
    Hit { kind: MoleKind, points: u64 },
    Bomb { penalty: u64 },
    Miss { penalty: u64 },
}

#[derive(Debug, Clone)]
pub struct WhackGame {
    rng: StdRng,
    holes: [Option<Mole>; HOLES],
    timer: RoundTimer,
    spawn_in: Duration,
    score: u64,
    combo: u32,
    best_combo: u32,
    hits: u32,
    escaped: u32,
    spawning: bool,
}

/// Show time in milliseconds for a normal mole at `score`.
pub fn show_time_ms(score: u64) -> f32 {
    (BASE_SHOW_MS - SHOW_MS_PER_POINT * score as f32).max(MIN_SHOW_MS)
}

impl WhackGame {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            holes: [None; HOLES],
            timer: RoundTimer::new(ROUND_TIME),
            spawn_in: Duration::ZERO,
            score: 0,
            combo: 0,
            best_combo: 0,
            hits: 0,
            escaped: 0,
            spawning: true,
        }
    }

    /// A round with hand-placed moles and no random spawns.
    pub fn scripted(moles: &[(usize, MoleKind)]) -> Self {
        let mut game = Self::new(0);
        game.spawning = false;
        for &(hole, kind) in moles {
            if hole < HOLES {
                game.holes[hole] = Some(game.make_mole(kind));
            }
        }
        game
    }

    pub fn holes(&self) -> &[Option<Mole>; HOLES] {
        &self.holes
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn best_combo(&self) -> u32 {
        self.best_combo
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn escaped(&self) -> u32 {
        self.escaped
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn is_over(&self) -> bool {
        self.timer.is_up()
    }

    fn make_mole(&self, kind: MoleKind) -> Mole {
        let ms = show_time_ms(self.score) * kind.show_factor();
        Mole {
            kind,
            left: Duration::from_millis(ms as u64),
            shown_for: Duration::ZERO,
        }
    }

    fn roll_kind(&mut self) -> MoleKind {
        match self.rng.random_range(0..100) {
            0..=59 => MoleKind::Normal,
            60..=74 => MoleKind::Fast,
            75..=84 => MoleKind::Golden,
            _ => MoleKind::Bomb,
        }
    }

    /// Up to three moles at once as the score climbs.
    fn batch_size(&self) -> usize {
        1 + (self.score / 150).min(2) as usize
    }

    fn spawn_batch(&mut self) {
        let mut free: Vec<usize> = (0..HOLES).filter(|&i| self.holes[i].is_none()).collect();
        free.shuffle(&mut self.rng);
        let batch = self.batch_size();
        let count = self.rng.random_range(1..=batch).min(free.len());
        for &hole in &free[..count] {
            let kind = self.roll_kind();
            self.holes[hole] = Some(self.make_mole(kind));
        }
    }

    fn deduct(&mut self, penalty: u64) {
        self.score = self.score.saturating_sub(penalty);
        self.combo = 0;
    }

    pub fn whack(&mut self, hole: usize) -> WhackOutcome {
        if self.is_over() || hole >= HOLES {
            return WhackOutcome::Ignored;
        }
        match self.holes[hole].take() {
            None => {
                self.deduct(MISS_PENALTY);
                WhackOutcome::Miss {
                    penalty: MISS_PENALTY,
                }
            }
            Some(Mole {
                kind: MoleKind::Bomb,
                ..
            }) => {
                self.deduct(BOMB_PENALTY);
                WhackOutcome::Bomb {
                    penalty: BOMB_PENALTY,
                }
            }
            Some(mole) => {
                self.combo += 1;
                self.best_combo = self.best_combo.max(self.combo);
                self.hits += 1;
                let points = mole.kind.points() + 2 * u64::from(self.combo.saturating_sub(1).min(10));
                self.score += points;
                WhackOutcome::Hit {
                    kind: mole.kind,
                    points,
                }
            }
        }
    }

    pub fn update(&mut self, dt: Duration) {
        if self.is_over() {
            return;
        }
        self.timer.tick_if_running(dt, true);
        if self.is_over() {
            self.holes = [None; HOLES];
            return;
        }
        let mut escaped = 0;
        for slot in &mut self.holes {
            let gone = match slot {
                Some(mole) => {
                    mole.shown_for += dt;
                    mole.left = mole.left.saturating_sub(dt);
                    mole.left.is_zero().then_some(mole.kind)
                }
                None => None,
            };
            if let Some(kind) = gone {
                if kind != MoleKind::Bomb {
                    escaped += 1;
                }
                *slot = None;
            }
        }
        for _ in 0..escaped {
            self.escaped += 1;
            self.deduct(ESCAPE_PENALTY);
        }
        if !self.spawning {
            return;
        }
        self.spawn_in = self.spawn_in.saturating_sub(dt);
        if self.spawn_in.is_zero() {
            self.spawn_batch();
            self.spawn_in = SPAWN_INTERVAL;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_time_shrinks_with_score_down_to_a_floor() {
        assert_eq!(show_time_ms(0), BASE_SHOW_MS);
        assert!(show_time_ms(200) < show_time_ms(100));
        assert_eq!(show_time_ms(10_000), MIN_SHOW_MS);
    }

    #[test]
    fn first_update_spawns_moles() {
        let mut game = WhackGame::new(9);
        game.update(Duration::from_millis(16));
        assert!(game.holes().iter().any(Option::is_some));
    }

    #[test]
    fn combo_adds_a_bonus_and_misses_reset_it() {
        let mut game = WhackGame::scripted(&[(0, MoleKind::Normal), (1, MoleKind::Normal)]);
        assert_eq!(
            game.whack(0),
            WhackOutcome::Hit {
                kind: MoleKind::Normal,
                points: 10
            }
        );
        assert_eq!(
            game.whack(1),
            WhackOutcome::Hit {
                kind: MoleKind::Normal,
                points: 12
            }
        );
        assert_eq!(game.combo(), 2);
        assert_eq!(game.whack(1), WhackOutcome::Miss { penalty: MISS_PENALTY });
        assert_eq!(game.combo(), 0);
        assert_eq!(game.score(), 22 - MISS_PENALTY);
    }
}

//! Piano Tiles: tiles fall down four lanes and must be tapped while they cross the judge band.
//!
//! Positions are in field units: the visible field spans `0.0..=1.0` from top to bottom and a
//! tile's `y` is its top edge.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::round_timer::RoundTimer;

pub const LANES: usize = 4;
pub const TILE_HEIGHT: f32 = 0.25;
pub const JUDGE_TOP: f32 = 0.70;
pub const JUDGE_BOTTOM: f32 = 0.92;
/// Field heights per second.
pub const BASE_SPEED: f32 = 0.55;
pub const CRAZY_SPEED: (f32, f32) = (0.40, 1.00);
pub const CHALLENGE_TIME: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Classic,
    Crazy,
    Zen,
    Challenge,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Classic, Mode::Crazy, Mode::Zen, Mode::Challenge];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Classic => "CLASSIC",
            Mode::Crazy => "CRAZY",
            Mode::Zen => "ZEN",
            Mode::Challenge => "CHALLENGE",
        }
    }

    pub fn best_key(self) -> String {
        format!("piano.{}", self.name().to_ascii_lowercase())
    }

    /// Zen never ends on a miss.
    pub fn forgives_misses(self) -> bool {
        self == Mode::Zen
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Normal,
    /// Needs two taps.
    Double,
    /// Worth three points.
    Bonus,
}

impl TileKind {
    fn taps(self) -> u8 {
        match self {
            TileKind::Double => 2,
            _ => 1,
        }
    }

    fn points(self) -> u64 {
        match self {
            TileKind::Normal => 1,
            TileKind::Double => 2,
            TileKind::Bonus => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub lane: usize,
    pub y: f32,
    pub kind: TileKind,
    pub taps_left: u8,
}

impl Tile {
    pub fn is_done(&self) -> bool {
        self.taps_left == 0
    }

    pub fn in_judge_band(&self) -> bool {
        self.y + TILE_HEIGHT > JUDGE_TOP && self.y < JUDGE_BOTTOM
    }

    fn passed_judge_band(&self) -> bool {
        self.y >= JUDGE_BOTTOM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PianoState {
    Playing,
    Failed,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressOutcome {
    Ignored,
    /// Tapped a double tile that still needs another tap.
    Partial,
    Hit { points: u64 },
    Miss,
}

#[derive(Debug, Clone)]
pub struct PianoGame {
    mode: Mode,
    rng: StdRng,
    tiles: Vec<Tile>,
    speed: f32,
    score: u64,
    combo: u32,
    best_combo: u32,
    misses: u32,
    state: PianoState,
    timer: RoundTimer,
    last_lane: Option<usize>,
    spawning: bool,
}

impl PianoGame {
    pub fn new(mode: Mode, seed: u64) -> Self {
        let timer = match mode {
            Mode::Challenge => RoundTimer::new(CHALLENGE_TIME),
            _ => RoundTimer::stopwatch(),
        };
        let mut game = Self {
            mode,
            rng: StdRng::seed_from_u64(seed),
            tiles: Vec::new(),
            speed: BASE_SPEED,
            score: 0,
            combo: 0,
            best_combo: 0,
            misses: 0,
            state: PianoState::Playing,
            timer,
            last_lane: None,
            spawning: true,
        };
        game.fill_field();
        game
    }

    /// A game over a fixed set of tiles with no further spawning, for scripted play.
    pub fn with_tiles(mode: Mode, tiles: Vec<Tile>, speed: f32) -> Self {
        let mut game = Self::new(mode, 0);
        game.tiles = tiles;
        game.speed = speed;
        game.spawning = false;
        game
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn speed(&self) -> f32 {
        self.speed
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

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn state(&self) -> PianoState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state != PianoState::Playing
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn new_tile(lane: usize, y: f32, kind: TileKind) -> Tile {
        Tile {
            lane,
            y,
            kind,
            taps_left: kind.taps(),
        }
    }

    fn spawn_above(&mut self, y: f32) {
        let mut lane = self.rng.random_range(0..LANES);
        if Some(lane) == self.last_lane {
            lane = (lane + self.rng.random_range(1..LANES)) % LANES;
        }
        self.last_lane = Some(lane);
        let kind = if self.mode == Mode::Crazy {
            match self.rng.random_range(0..10) {
                0..=5 => TileKind::Normal,
                6 | 7 => TileKind::Double,
                _ => TileKind::Bonus,
            }
        } else {
            TileKind::Normal
        };
        if self.mode == Mode::Crazy {
            self.speed = self.rng.random_range(CRAZY_SPEED.0..=CRAZY_SPEED.1);
        }
        self.tiles.push(Self::new_tile(lane, y, kind));
    }

    /// Stacks one tile per row above the highest tile until a full row waits above the field.
    /// An empty field starts with its first tile resting just above the judge band.
    fn fill_field(&mut self) {
        if !self.spawning {
            return;
        }
        let mut top = self
            .tiles
            .iter()
            .map(|t| t.y)
            .fold(JUDGE_TOP, f32::min);
        while top > -TILE_HEIGHT {
            top -= TILE_HEIGHT;
            self.spawn_above(top);
        }
    }

    fn register_miss(&mut self) {
        self.misses += 1;
        self.combo = 0;
        if !self.mode.forgives_misses() {
            self.state = PianoState::Failed;
        }
    }

    /// The lowest unfinished tile, which is the only one a tap may count against.
    fn lowest_pending(&self) -> Option<usize> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_done())
            .max_by(|a, b| a.1.y.total_cmp(&b.1.y))
            .map(|(i, _)| i)
    }

    pub fn press(&mut self, lane: usize) -> PressOutcome {
        if self.is_over() || lane >= LANES {
            return PressOutcome::Ignored;
        }
        let target = self
            .lowest_pending()
            .filter(|&i| self.tiles[i].lane == lane && self.tiles[i].in_judge_band());
        let Some(i) = target else {
            self.register_miss();
            return PressOutcome::Miss;
        };
        let tile = &mut self.tiles[i];
        tile.taps_left -= 1;
        if !tile.is_done() {
            return PressOutcome::Partial;
        }
        let kind = tile.kind;
        self.combo += 1;
        self.best_combo = self.best_combo.max(self.combo);
        let points = kind.points() + u64::from(self.combo / 20);
        self.score += points;
        PressOutcome::Hit { points }
    }

    pub fn update(&mut self, dt: Duration) {
        if self.is_over() {
            return;
        }
        self.timer.tick_if_running(dt, true);
        if self.timer.is_up() {
            self.state = PianoState::TimeUp;
            return;
        }
        let step = self.speed * dt.as_secs_f32();
        for tile in &mut self.tiles {
            tile.y += step;
        }
        let escaped = self
            .tiles
            .iter()
            .filter(|t| !t.is_done() && t.passed_judge_band())
            .count();
        for _ in 0..escaped {
            self.register_miss();
            if self.is_over() {
                return;
            }
        }
        self.tiles
            .retain(|t| t.y < 1.0 && !(t.passed_judge_band() && !t.is_done()));
        self.fill_field();
    }
}

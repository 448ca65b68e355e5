//! 2048 on a 4x4 board: slide, merge once per move, spawn, and the slide animation bookkeeping.

use std::time::Duration;

use engine::input::Direction;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

pub const SIZE: usize = 4;
pub const WIN_TILE: u32 = 2048;
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;
pub const SLIDE_ANIMATION: Duration = Duration::from_millis(120);

pub type Board = [[u32; SIZE]; SIZE];
pub type Cell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Playing,
    /// 2048 was reached; waiting for the player to continue or restart.
    Won,
    /// Playing on past 2048.
    Continuing,
    Over,
}

/// Where one tile travelled during the last move. `merged` marks the tile that absorbed another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileMove {
    pub from: Cell,
    pub to: Cell,
    pub value: u32,
    pub merged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub moved: bool,
    pub gained: u32,
    pub tiles: Vec<TileMove>,
    pub spawned: Option<(Cell, u32)>,
}

#[derive(Debug, Clone)]
pub struct Game2048 {
    board: Board,
    score: u32,
    state: State,
    last: SlideOutcome,
    anim_elapsed: Duration,
    rng: StdRng,
}

/// Slides one line towards index 0. Returns the new line, the points gained and, for each source
/// index, its destination index and whether it took part in a merge.
fn slide_line(line: [u32; SIZE]) -> ([u32; SIZE], u32, Vec<(usize, usize, bool)>) {
    let mut out = [0; SIZE];
    let mut trail = Vec::new();
    let mut gained = 0;
    let mut write = 0;
    let mut can_merge = false;
    for (src, &v) in line.iter().enumerate() {
        if v == 0 {
            continue;
        }
        if can_merge && out[write - 1] == v {
            out[write - 1] = v * 2;
            gained += v * 2;
            trail.push((src, write - 1, true));
            can_merge = false;
        } else {
            out[write] = v;
            trail.push((src, write, false));
            write += 1;
            can_merge = true;
        }
    }
    (out, gained, trail)
}

/// Board cell for position `i` along line `k` when sliding towards `dir`.
fn line_cell(dir: Direction, k: usize, i: usize) -> Cell {
    let last = SIZE - 1;
    match dir {
        Direction::Left => (i, k),
        Direction::Right => (last - i, k),
        Direction::Up => (k, i),
        Direction::Down => (k, last - i),
    }
}

impl Game2048 {
    pub fn new(seed: u64) -> Self {
        let mut game = Self::with_board([[0; SIZE]; SIZE], seed);
        game.spawn_tile();
        game.spawn_tile();
        game
    }

    pub fn with_board(board: Board, seed: u64) -> Self {
        Self {
            board,
            score: 0,
            state: State::Playing,
            last: SlideOutcome::default(),
            anim_elapsed: SLIDE_ANIMATION,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn restart(&mut self) {
        self.board = [[0; SIZE]; SIZE];
        self.score = 0;
        self.state = State::Playing;
        self.last = SlideOutcome::default();
        self.anim_elapsed = SLIDE_ANIMATION;
        self.spawn_tile();
        self.spawn_tile();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Value at column `x`, row `y`.
    pub fn tile(&self, (x, y): Cell) -> u32 {
        self.board[y][x]
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn last_move(&self) -> &SlideOutcome {
        &self.last
    }

    pub fn max_tile(&self) -> u32 {
        self.board.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn empty_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..SIZE {
            for x in 0..SIZE {
                if self.board[y][x] == 0 {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    fn spawn_tile(&mut self) -> Option<(Cell, u32)> {
        let cells = self.empty_cells();
        let &(x, y) = cells.choose(&mut self.rng)?;
        let value = if self.rng.random_bool(SPAWN_TWO_PROBABILITY) {
            2
        } else {
            4
        };
        self.board[y][x] = value;
        Some(((x, y), value))
    }

    pub fn can_move(&self) -> bool {
        for y in 0..SIZE {
            for x in 0..SIZE {
                let v = self.board[y][x];
                if v == 0 {
                    return true;
                }
                if x + 1 < SIZE && self.board[y][x + 1] == v {
                    return true;
                }
                if y + 1 < SIZE && self.board[y + 1][x] == v {
                    return true;
                }
            }
        }
        false
    }

    /// After a win, keeps playing past 2048.
    pub fn continue_after_win(&mut self) {
        if self.state == State::Won {
            self.state = if self.can_move() {
                State::Continuing
            } else {
                State::Over
            };
        }
    }

    pub fn slide(&mut self, dir: Direction) -> &SlideOutcome {
        if matches!(self.state, State::Won | State::Over) {
            self.last = SlideOutcome::default();
            return &self.last;
        }
        let mut next = [[0; SIZE]; SIZE];
        let mut outcome = SlideOutcome::default();
        for k in 0..SIZE {
            let mut line = [0; SIZE];
            for (i, slot) in line.iter_mut().enumerate() {
                let (x, y) = line_cell(dir, k, i);
                *slot = self.board[y][x];
            }
            let (slid, gained, trail) = slide_line(line);
            outcome.gained += gained;
            for (i, v) in slid.iter().enumerate() {
                let (x, y) = line_cell(dir, k, i);
                next[y][x] = *v;
            }
            for (src, dst, merged) in trail {
                let from = line_cell(dir, k, src);
                let to = line_cell(dir, k, dst);
                outcome.tiles.push(TileMove {
                    from,
                    to,
                    value: line[src],
                    merged,
                });
            }
        }
        outcome.moved = next != self.board;
        if outcome.moved {
            self.board = next;
            self.score += outcome.gained;
            outcome.spawned = self.spawn_tile();
            self.anim_elapsed = Duration::ZERO;
            if self.state == State::Playing && self.max_tile() >= WIN_TILE {
                self.state = State::Won;
            } else if !self.can_move() {
                self.state = State::Over;
            }
        }
        self.last = outcome;
        &self.last
    }

    pub fn update(&mut self, dt: Duration) {
        self.anim_elapsed = (self.anim_elapsed + dt).min(SLIDE_ANIMATION);
    }

    /// Slide progress in `0.0..=1.0`; 1.0 once the last move has finished animating.
    pub fn animation_progress(&self) -> f32 {
        self.anim_elapsed.as_secs_f32() / SLIDE_ANIMATION.as_secs_f32()
    }

    pub fn is_animating(&self) -> bool {
        self.anim_elapsed < SLIDE_ANIMATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_once_per_move() {
        assert_eq!(slide_line([2, 2, 2, 2]).0, [4, 4, 0, 0]);
        assert_eq!(slide_line([4, 4, 8, 0]).0, [8, 8, 0, 0]);
        assert_eq!(slide_line([0, 2, 0, 2]).0, [4, 0, 0, 0]);
        assert_eq!(slide_line([2, 4, 2, 4]).0, [2, 4, 2, 4]);
        assert_eq!(slide_line([2, 2, 4, 0]).1, 4);
    }

    #[test]
    fn new_game_has_two_small_tiles() {
        let game = Game2048::new(3);
        let tiles: Vec<u32> = game.board().iter().flatten().copied().filter(|v| *v > 0).collect();
        assert_eq!(tiles.len(), 2);
        assert!(tiles.iter().all(|v| *v == 2 || *v == 4));
    }

    #[test]
    fn trail_reports_sources_and_merges() {
        let mut board = [[0; SIZE]; SIZE];
        board[0] = [0, 2, 0, 2];
        let mut game = Game2048::with_board(board, 1);
        let outcome = game.slide(Direction::Right).clone();
        assert!(outcome.moved);
        assert_eq!(game.tile((3, 0)), 4);
        assert!(outcome.tiles.contains(&TileMove {
            from: (3, 0),
            to: (3, 0),
            value: 2,
            merged: false
        }));
        assert!(outcome.tiles.contains(&TileMove {
            from: (1, 0),
            to: (3, 0),
            value: 2,
            merged: true
        }));
        assert!(game.is_animating());
        game.update(Duration::from_millis(200));
        assert!(!game.is_animating());
    }
}

//! Link-Link (tile matching): two equal tiles vanish when a path with at most two turns joins
//! them through empty cells. The path may leave the board and run along a one-cell margin.

use std::collections::VecDeque;
use std::time::Duration;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::round_timer::RoundTimer;

pub const EMPTY: u8 = 0;
pub const MAX_TURNS: u32 = 2;
const MAX_SHUFFLES: usize = 200;

pub type Cell = (usize, usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPreset {
    pub name: &'static str,
    pub cols: usize,
    pub rows: usize,
    pub kinds: u8,
}

impl LinkPreset {
    pub fn best_key(&self) -> String {
        format!("linklink.{}", self.name.to_ascii_lowercase())
    }
}

pub const PRESETS: [LinkPreset; 3] = [
    LinkPreset {
        name: "EASY",
        cols: 8,
        rows: 6,
        kinds: 8,
    },
    LinkPreset {
        name: "NORMAL",
        cols: 10,
        rows: 8,
        kinds: 12,
    },
    LinkPreset {
        name: "HARD",
        cols: 14,
        rows: 8,
        kinds: 18,
    },
];

const DIRS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBoard {
    cols: usize,
    rows: usize,
    tiles: Vec<u8>,
}

impl LinkBoard {
    /// `rows[y][x]`, `0` for an empty cell.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut tiles = vec![EMPTY; cols * rows.len()];
        for (y, row) in rows.iter().enumerate() {
            tiles[y * cols..y * cols + row.len()].copy_from_slice(row);
        }
        Self {
            cols,
            rows: rows.len(),
            tiles,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn tile(&self, (x, y): Cell) -> u8 {
        if x < self.cols && y < self.rows {
            self.tiles[y * self.cols + x]
        } else {
            EMPTY
        }
    }

    pub fn remaining(&self) -> usize {
        self.tiles.iter().filter(|&&t| t != EMPTY).count()
    }

    pub fn is_clear(&self) -> bool {
        self.remaining() == 0
    }

    /// Empty in padded coordinates, where the margin ring is always empty.
    fn is_open(&self, px: i32, py: i32) -> bool {
        if px < 0 || py < 0 || px > self.cols as i32 + 1 || py > self.rows as i32 + 1 {
            return false;
        }
        if px == 0 || py == 0 || px == self.cols as i32 + 1 || py == self.rows as i32 + 1 {
            return true;
        }
        self.tiles[(py as usize - 1) * self.cols + px as usize - 1] == EMPTY
    }

    /// Corner points (in padded coordinates, margin at 0) of a path with the fewest turns from
    /// `a` to `b`, if one with at most two turns exists.
    pub fn find_path(&self, a: Cell, b: Cell) -> Option<Vec<(i32, i32)>> {
        if a == b {
            return None;
        }
        let (w, h) = (self.cols + 2, self.rows + 2);
        let start = (a.0 as i32 + 1, a.1 as i32 + 1);
        let goal = (b.0 as i32 + 1, b.1 as i32 + 1);
        let index = |x: i32, y: i32, d: usize| (y as usize * w + x as usize) * 4 + d;
        let mut turns = vec![u32::MAX; w * h * 4];
        let mut parent: Vec<Option<(i32, i32, usize)>> = vec![None; w * h * 4];
        let mut queue = VecDeque::new();
        for (d, (dx, dy)) in DIRS.iter().enumerate() {
            let (nx, ny) = (start.0 + dx, start.1 + dy);
            if (nx, ny) == goal || self.is_open(nx, ny) {
                turns[index(nx, ny, d)] = 0;
                queue.push_back((nx, ny, d));
            }
        }
        // 0-1 BFS: going straight is free, turning costs one.
        while let Some((x, y, d)) = queue.pop_front() {
            let t = turns[index(x, y, d)];
            if (x, y) == goal {
                return Some(self.trace(start, (x, y, d), &parent, index));
            }
            for (nd, (dx, dy)) in DIRS.iter().enumerate() {
                let cost = u32::from(nd != d);
                let nt = t + cost;
                if nt > MAX_TURNS {
                    continue;
                }
                let (nx, ny) = (x + dx, y + dy);
                if (nx, ny) != goal && !self.is_open(nx, ny) {
                    continue;
                }
                let slot = index(nx, ny, nd);
                if nt < turns[slot] {
                    turns[slot] = nt;
                    parent[slot] = Some((x, y, d));
                    if cost == 0 {
                        queue.push_front((nx, ny, nd));
                    } else {
                        queue.push_back((nx, ny, nd));
                    }
                }
            }
        }
        None
    }

    fn trace(
        &self,
        start: (i32, i32),
        end: (i32, i32, usize),
        parent: &[Option<(i32, i32, usize)>],
        index: impl Fn(i32, i32, usize) -> usize,
    ) -> Vec<(i32, i32)> {
        let mut points = vec![(end.0, end.1)];
        let mut cur = end;
        while let Some(prev) = parent[index(cur.0, cur.1, cur.2)] {
            if prev.2 != cur.2 {
                points.push((prev.0, prev.1));
            }
            cur = prev;
        }
        points.push(start);
        points.reverse();
        points
    }

    pub fn can_link(&self, a: Cell, b: Cell) -> bool {
        let t = self.tile(a);
        t != EMPTY && t == self.tile(b) && self.find_path(a, b).is_some()
    }

    fn occupied(&self) -> Vec<Cell> {
        (0..self.rows)
            .flat_map(|y| (0..self.cols).map(move |x| (x, y)))
            .filter(|&c| self.tile(c) != EMPTY)
            .collect()
    }

    /// Any connectable pair left on the board.
    pub fn find_move(&self) -> Option<(Cell, Cell)> {
        let cells = self.occupied();
        for (i, &a) in cells.iter().enumerate() {
            for &b in &cells[i + 1..] {
                if self.tile(a) == self.tile(b) && self.find_path(a, b).is_some() {
                    return Some((a, b));
                }
            }
        }
        None
    }

    fn remove(&mut self, a: Cell, b: Cell) {
        for (x, y) in [a, b] {
            self.tiles[y * self.cols + x] = EMPTY;
        }
    }

    /// Permutes the remaining tiles over their current cells until some pair connects.
    pub fn reshuffle(&mut self, rng: &mut StdRng) -> bool {
        if self.is_clear() {
            return true;
        }
        let cells = self.occupied();
        let mut kinds: Vec<u8> = cells.iter().map(|&c| self.tile(c)).collect();
        for attempt in 1..=MAX_SHUFFLES {
            kinds.shuffle(rng);
            for (&(x, y), &k) in cells.iter().zip(&kinds) {
                self.tiles[y * self.cols + x] = k;
            }
            if self.find_move().is_some() {
                debug!("link board reshuffled after {attempt} attempt(s)");
                return true;
            }
        }
        false
    }
}

/// Fills `cols × rows` with pairs of `kinds` tile types and makes sure a first move exists.
pub fn generate(preset: &LinkPreset, rng: &mut StdRng) -> LinkBoard {
    let count = preset.cols * preset.rows;
    let kinds = preset.kinds.max(1);
    let mut tiles: Vec<u8> = (0..count / 2)
        .flat_map(|i| {
            let k = (i % usize::from(kinds)) as u8 + 1;
            [k, k]
        })
        .collect();
    tiles.resize(count, EMPTY);
    tiles.shuffle(rng);
    let mut board = LinkBoard {
        cols: preset.cols,
        rows: preset.rows,
        tiles,
    };
    if board.find_move().is_none() {
        board.reshuffle(rng);
    }
    board
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    Ignored,
    Selected,
    Deselected,
    /// A different tile type, or no path: the new tile becomes the selection.
    Mismatch,
    Linked {
        path: Vec<(i32, i32)>,
        reshuffled: bool,
    },
    Cleared,
}

#[derive(Debug, Clone)]
pub struct LinkGame {
    preset: LinkPreset,
    board: LinkBoard,
    selected: Option<Cell>,
    rng: StdRng,
    timer: RoundTimer,
    pairs: u32,
    shuffles: u32,
}

impl LinkGame {
    pub fn new(preset: LinkPreset, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let board = generate(&preset, &mut rng);
        Self::with_board(preset, board, rng)
    }

    pub fn with_board(preset: LinkPreset, board: LinkBoard, rng: StdRng) -> Self {
        Self {
            preset,
            board,
            selected: None,
            rng,
            timer: RoundTimer::stopwatch(),
            pairs: 0,
            shuffles: 0,
        }
    }

    pub fn preset(&self) -> &LinkPreset {
        &self.preset
    }

    pub fn board(&self) -> &LinkBoard {
        &self.board
    }

    pub fn selected(&self) -> Option<Cell> {
        self.selected
    }

    pub fn pairs(&self) -> u32 {
        self.pairs
    }

    pub fn shuffles(&self) -> u32 {
        self.shuffles
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    pub fn is_clear(&self) -> bool {
        self.board.is_clear()
    }

    pub fn update(&mut self, dt: Duration) {
        let running = !self.board.is_clear();
        self.timer.tick_if_running(dt, running);
    }

    pub fn pick(&mut self, cell: Cell) -> PickOutcome {
        if self.board.is_clear() || self.board.tile(cell) == EMPTY {
            return PickOutcome::Ignored;
        }
        let Some(first) = self.selected else {
            self.selected = Some(cell);
            return PickOutcome::Selected;
        };
        if first == cell {
            self.selected = None;
            return PickOutcome::Deselected;
        }
        if self.board.tile(first) != self.board.tile(cell) {
            self.selected = Some(cell);
            return PickOutcome::Mismatch;
        }
        let Some(path) = self.board.find_path(first, cell) else {
            self.selected = Some(cell);
            return PickOutcome::Mismatch;
        };
        self.board.remove(first, cell);
        self.selected = None;
        self.pairs += 1;
        if self.board.is_clear() {
            return PickOutcome::Cleared;
        }
        let reshuffled = self.board.find_move().is_none();
        if reshuffled {
            self.reshuffle();
        }
        PickOutcome::Linked { path, reshuffled }
    }

    /// Manual or automatic reshuffle of the remaining tiles.
    pub fn reshuffle(&mut self) {
        self.selected = None;
        self.shuffles += 1;
        self.board.reshuffle(&mut self.rng);
    }

    pub fn hint(&self) -> Option<(Cell, Cell)> {
        self.board.find_move()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_and_blocked_line() {
        let board = LinkBoard::from_rows(&[&[1, 0, 0, 1], &[2, 2, 3, 3]]);
        assert_eq!(board.find_path((0, 0), (3, 0)), Some(vec![(1, 1), (4, 1)]));
        let board = LinkBoard::from_rows(&[&[1, 2, 1], &[3, 3, 3]]);
        // Around the top margin: up, across, down.
        let path = board.find_path((0, 0), (2, 0)).unwrap();
        assert_eq!(path, vec![(1, 1), (1, 0), (3, 0), (3, 1)]);
    }

    #[test]
    fn three_turns_are_refused() {
        // The only route from (1,1) to (3,3) winds through the middle with three turns.
        let board = LinkBoard::from_rows(&[
            &[9, 9, 9, 9, 9],
            &[9, 1, 0, 9, 9],
            &[9, 9, 0, 0, 9],
            &[9, 9, 9, 1, 9],
            &[9, 9, 9, 9, 9],
        ]);
        assert!(board.find_path((1, 1), (3, 3)).is_none());
        let board = LinkBoard::from_rows(&[
            &[9, 9, 9, 9, 9],
            &[9, 1, 0, 0, 9],
            &[9, 9, 9, 0, 9],
            &[9, 9, 9, 1, 9],
            &[9, 9, 9, 9, 9],
        ]);
        assert_eq!(
            board.find_path((1, 1), (3, 3)),
            Some(vec![(2, 2), (4, 2), (4, 4)])
        );
    }

    #[test]
    fn generated_boards_hold_pairs_and_a_move() {
        let mut rng = StdRng::seed_from_u64(4);
        for preset in PRESETS {
            let board = generate(&preset, &mut rng);
            assert_eq!(board.remaining(), preset.cols * preset.rows);
            let mut counts = [0usize; 256];
            for y in 0..board.rows() {
                for x in 0..board.cols() {
                    counts[usize::from(board.tile((x, y)))] += 1;
                }
            }
            assert!(counts.iter().all(|c| c % 2 == 0));
            assert!(board.find_move().is_some());
        }
    }
}

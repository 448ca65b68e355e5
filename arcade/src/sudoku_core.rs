//! Sudoku generation, validation and the play state (pen and notes input, hints, error count).

use std::time::Duration;

use engine::input::Direction;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::round_timer::RoundTimer;

pub const SIZE: usize = 9;
pub const BOX: usize = 3;
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 5;

/// `0` marks an empty cell.
pub type Grid = [[u8; SIZE]; SIZE];

/// Whether `v` may sit at (`r`, `c`) given every other cell of its row, column and box.
/// The cell itself is not consulted, so a filled board can be validated in place.
pub fn is_safe(board: &Grid, r: usize, c: usize, v: u8) -> bool {
    for i in 0..SIZE {
        if i != c && board[r][i] == v {
            return false;
        }
        if i != r && board[i][c] == v {
            return false;
        }
    }
    let (br, bc) = (r / BOX * BOX, c / BOX * BOX);
    for y in br..br + BOX {
        for x in bc..bc + BOX {
            if (y, x) != (r, c) && board[y][x] == v {
                return false;
            }
        }
    }
    true
}

pub fn is_complete_and_valid(board: &Grid) -> bool {
    (0..SIZE).all(|r| {
        (0..SIZE).all(|c| {
            let v = board[r][c];
            (1..=9).contains(&v) && is_safe(board, r, c, v)
        })
    })
}

/// Cells removed for a difficulty: 30, 37, 45, 52, 60.
pub fn cells_to_remove(difficulty: u8) -> usize {
    let d = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    (30.0 + 7.5 * f64::from(d - 1)) as usize
}

/// Empty cell with the fewest candidates (as a digit bitmask), or `None` when the board is full.
fn most_constrained(board: &Grid) -> Option<(usize, usize, u16)> {
    let mut rows = [0u16; SIZE];
    let mut cols = [0u16; SIZE];
    let mut boxes = [0u16; SIZE];
    for r in 0..SIZE {
        for c in 0..SIZE {
            let v = board[r][c];
            if v != 0 {
                let bit = 1 << v;
                rows[r] |= bit;
                cols[c] |= bit;
                boxes[r / BOX * BOX + c / BOX] |= bit;
            }
        }
    }
    let mut best: Option<(usize, usize, u16)> = None;
    for r in 0..SIZE {
        for c in 0..SIZE {
            if board[r][c] != 0 {
                continue;
            }
            let mask = !(rows[r] | cols[c] | boxes[r / BOX * BOX + c / BOX]) & 0b11_1111_1110;
            if best.is_none_or(|(_, _, m)| mask.count_ones() < m.count_ones()) {
                best = Some((r, c, mask));
                if mask.count_ones() <= 1 {
                    return best;
                }
            }
        }
    }
    best
}

/// Fills `board` in place by backtracking. Returns false if it has no solution.
pub fn solve(board: &mut Grid) -> bool {
    let Some((r, c, mask)) = most_constrained(board) else {
        return true;
    };
    for v in 1..=9u8 {
        if mask & (1 << v) == 0 {
            continue;
        }
        board[r][c] = v;
        if solve(board) {
            return true;
        }
    }
    board[r][c] = 0;
    false
}

/// Number of solutions, counting no further than `limit`.
pub fn count_solutions(board: &mut Grid, limit: u32) -> u32 {
    let Some((r, c, mask)) = most_constrained(board) else {
        return 1;
    };
    let mut found = 0;
    for v in 1..=9u8 {
        if mask & (1 << v) == 0 {
            continue;
        }
        board[r][c] = v;
        found += count_solutions(board, limit - found);
        if found >= limit {
            break;
        }
    }
    board[r][c] = 0;
    found
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub difficulty: u8,
    pub givens: Grid,
    pub solution: Grid,
}

impl Puzzle {
    pub fn empty_cells(&self) -> usize {
        self.givens.iter().flatten().filter(|&&v| v == 0).count()
    }
}

fn full_solution(rng: &mut StdRng) -> Grid {
    let mut board = [[0u8; SIZE]; SIZE];
    // The three diagonal boxes share no row, column or box, so any digits fit.
    for b in 0..BOX {
        let mut digits: Vec<u8> = (1..=9).collect();
        digits.shuffle(rng);
        for (i, v) in digits.into_iter().enumerate() {
            board[b * BOX + i / BOX][b * BOX + i % BOX] = v;
        }
    }
    solve(&mut board);
    board
}

/// Builds a puzzle with a unique solution. Cells whose removal would allow a second solution
/// stay filled, so the hardest levels may end with fewer blanks than asked for.
pub fn generate(difficulty: u8, seed: u64) -> Puzzle {
    let difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    let mut rng = StdRng::seed_from_u64(seed);
    let solution = full_solution(&mut rng);
    let mut givens = solution;
    let target = cells_to_remove(difficulty);
    let mut order: Vec<(usize, usize)> = (0..SIZE)
        .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
        .collect();
    order.shuffle(&mut rng);
    let mut removed = 0;
    for (r, c) in order {
        if removed == target {
            break;
        }
        let keep = givens[r][c];
        givens[r][c] = 0;
        let mut probe = givens;
        if count_solutions(&mut probe, 2) == 1 {
            removed += 1;
        } else {
            givens[r][c] = keep;
        }
    }
    debug!("sudoku difficulty {difficulty}: removed {removed} of {target} cells");
    Puzzle {
        difficulty,
        givens,
        solution,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Ignored,
    Placed,
    Wrong,
    Noted,
    Erased,
    Solved,
}

#[derive(Debug, Clone)]
pub struct SudokuGame {
    puzzle: Puzzle,
    cells: Grid,
    notes: [[u16; SIZE]; SIZE],
    selected: (usize, usize),
    notes_mode: bool,
    errors: u32,
    hints_used: u32,
    timer: RoundTimer,
    solved: bool,
}

impl SudokuGame {
    pub fn new(puzzle: Puzzle) -> Self {
        Self {
            cells: puzzle.givens,
            puzzle,
            notes: [[0; SIZE]; SIZE],
            selected: (0, 0),
            notes_mode: false,
            errors: 0,
            hints_used: 0,
            timer: RoundTimer::stopwatch(),
            solved: false,
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn cells(&self) -> &Grid {
        &self.cells
    }

    pub fn value(&self, r: usize, c: usize) -> u8 {
        self.cells[r][c]
    }

    pub fn is_given(&self, r: usize, c: usize) -> bool {
        self.puzzle.givens[r][c] != 0
    }

    /// Pencil marks at a cell as a sorted digit list.
    pub fn notes(&self, r: usize, c: usize) -> Vec<u8> {
        (1..=9u8)
            .filter(|v| self.notes[r][c] & (1 << v) != 0)
            .collect()
    }

    /// A player digit that clashes with its row, column or box.
    pub fn has_conflict(&self, r: usize, c: usize) -> bool {
        let v = self.cells[r][c];
        v != 0 && !self.is_given(r, c) && !is_safe(&self.cells, r, c, v)
    }

    pub fn selected(&self) -> (usize, usize) {
        self.selected
    }

    pub fn select(&mut self, r: usize, c: usize) {
        if r < SIZE && c < SIZE {
            self.selected = (r, c);
        }
    }

    pub fn move_selection(&mut self, dir: Direction) {
        let (dx, dy) = dir.delta();
        let (r, c) = self.selected;
        self.selected = (
            (r as i32 + dy).rem_euclid(SIZE as i32) as usize,
            (c as i32 + dx).rem_euclid(SIZE as i32) as usize,
        );
    }

    pub fn notes_mode(&self) -> bool {
        self.notes_mode
    }

    pub fn toggle_notes_mode(&mut self) {
        self.notes_mode = !self.notes_mode;
    }

    pub fn errors(&self) -> u32 {
        self.errors
    }

    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.elapsed()
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn update(&mut self, dt: Duration) {
        self.timer.tick_if_running(dt, !self.solved);
    }

    /// Enters `v` at the selected cell, as a pencil mark in notes mode.
    pub fn input(&mut self, v: u8) -> InputOutcome {
        let (r, c) = self.selected;
        if self.solved || !(1..=9).contains(&v) || self.is_given(r, c) {
            return InputOutcome::Ignored;
        }
        if self.notes_mode {
            if self.cells[r][c] != 0 {
                return InputOutcome::Ignored;
            }
            self.notes[r][c] ^= 1 << v;
            return InputOutcome::Noted;
        }
        self.cells[r][c] = v;
        self.notes[r][c] = 0;
        if v != self.puzzle.solution[r][c] {
            self.errors += 1;
            return InputOutcome::Wrong;
        }
        self.check_solved()
    }

    pub fn erase(&mut self) -> InputOutcome {
        let (r, c) = self.selected;
        if self.solved || self.is_given(r, c) {
            return InputOutcome::Ignored;
        }
        if self.cells[r][c] == 0 && self.notes[r][c] == 0 {
            return InputOutcome::Ignored;
        }
        self.cells[r][c] = 0;
        self.notes[r][c] = 0;
        InputOutcome::Erased
    }

    /// Fills the selected cell from the solution.
    pub fn hint(&mut self) -> InputOutcome {
        let (r, c) = self.selected;
        if self.solved || self.is_given(r, c) || self.cells[r][c] == self.puzzle.solution[r][c] {
            return InputOutcome::Ignored;
        }
        self.cells[r][c] = self.puzzle.solution[r][c];
        self.notes[r][c] = 0;
        self.hints_used += 1;
        self.check_solved()
    }

    fn check_solved(&mut self) -> InputOutcome {
        if self.cells == self.puzzle.solution {
            self.solved = true;
            return InputOutcome::Solved;
        }
        InputOutcome::Placed
    }
}

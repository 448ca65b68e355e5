//! Tile-swap jigsaw: an N×N picture cut into squares and shuffled; swap two tiles per move.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const MIN_SIZE: usize = 3;
pub const MAX_SIZE: usize = 5;

pub fn best_key(n: usize) -> String {
    format!("jigsaw.{n}x{n}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Ignored,
    Selected,
    Deselected,
    Swapped,
    Solved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jigsaw {
    n: usize,
    /// `slots[i]` is the piece sitting at slot `i`; piece `p` belongs at slot `p`.
    slots: Vec<usize>,
    selected: Option<usize>,
    cursor: usize,
    moves: u32,
}

impl Jigsaw {
    /// A shuffled puzzle that never starts solved.
    pub fn new(n: usize, seed: u64) -> Self {
        let n = n.clamp(MIN_SIZE, MAX_SIZE);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut slots: Vec<usize> = (0..n * n).collect();
        while slots.iter().enumerate().all(|(i, &p)| i == p) {
            slots.shuffle(&mut rng);
        }
        Self::with_slots(n, slots)
    }

    pub fn with_slots(n: usize, slots: Vec<usize>) -> Self {
        Self {
            n,
            slots,
            selected: None,
            cursor: 0,
            moves: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn piece_at(&self, slot: usize) -> usize {
        self.slots[slot]
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn is_solved(&self) -> bool {
        self.slots.iter().enumerate().all(|(i, &p)| i == p)
    }

    pub fn placed(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .filter(|&(i, &p)| i == p)
            .count()
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let n = self.n as i32;
        let (x, y) = ((self.cursor % self.n) as i32, (self.cursor / self.n) as i32);
        let nx = (x + dx).rem_euclid(n);
        let ny = (y + dy).rem_euclid(n);
        self.cursor = (ny * n + nx) as usize;
    }

    /// First pick selects, second pick on another slot swaps the two pieces.
    pub fn pick(&mut self, slot: usize) -> SwapOutcome {
        if slot >= self.slots.len() || self.is_solved() {
            return SwapOutcome::Ignored;
        }
        self.cursor = slot;
        match self.selected.take() {
            None => {
                self.selected = Some(slot);
                SwapOutcome::Selected
            }
            Some(first) if first == slot => SwapOutcome::Deselected,
            Some(first) => {
                self.slots.swap(first, slot);
                self.moves += 1;
                if self.is_solved() {
                    SwapOutcome::Solved
                } else {
                    SwapOutcome::Swapped
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_puzzles_are_shuffled_permutations() {
        for n in MIN_SIZE..=MAX_SIZE {
            let puzzle = Jigsaw::new(n, n as u64);
            assert!(!puzzle.is_solved());
            let mut pieces: Vec<usize> = (0..n * n).map(|i| puzzle.piece_at(i)).collect();
            pieces.sort_unstable();
            assert_eq!(pieces, (0..n * n).collect::<Vec<_>>());
        }
        assert_eq!(Jigsaw::new(9, 1).size(), MAX_SIZE);
    }

    #[test]
    fn two_picks_swap_and_count_a_move() {
        let mut puzzle = Jigsaw::with_slots(3, vec![1, 0, 2, 3, 4, 5, 6, 8, 7]);
        assert_eq!(puzzle.pick(0), SwapOutcome::Selected);
        assert_eq!(puzzle.pick(0), SwapOutcome::Deselected);
        assert_eq!(puzzle.pick(0), SwapOutcome::Selected);
        assert_eq!(puzzle.pick(1), SwapOutcome::Swapped);
        assert_eq!(puzzle.placed(), 7);
        puzzle.pick(7);
        assert_eq!(puzzle.pick(8), SwapOutcome::Solved);
        assert_eq!(puzzle.moves(), 2);
        assert_eq!(puzzle.pick(0), SwapOutcome::Ignored);
    }

    #[test]
    fn cursor_wraps() {
        let mut puzzle = Jigsaw::with_slots(4, (0..16).rev().collect());
        puzzle.move_cursor(-1, 0);
        assert_eq!(puzzle.cursor(), 3);
        puzzle.move_cursor(0, -1);
        assert_eq!(puzzle.cursor(), 15);
    }
}

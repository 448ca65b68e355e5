//! Minesweeper rules: deferred mine placement, flood and chord reveal, and safe-click
//! protection that moves a mine away from a forced guess when no deduction is available.

use std::collections::{BTreeSet, VecDeque};

use engine::surface::SurfaceSize;
use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};

pub type Pos = (u32, u32);

pub const FULLSCREEN_CELL_PX: u32 = 24;
pub const FULLSCREEN_MINE_RATIO: f32 = 0.18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
    /// Board sized to fill the drawing surface.
    Fullscreen,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Expert,
        Difficulty::Fullscreen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Beginner => "BEGINNER",
            Difficulty::Intermediate => "INTERMEDIATE",
            Difficulty::Expert => "EXPERT",
            Difficulty::Fullscreen => "FULLSCREEN",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Expert => "expert",
            Difficulty::Fullscreen => "fullscreen",
        }
    }

    pub fn win_reward(self) -> u64 {
        match self {
            Difficulty::Beginner => 20,
            Difficulty::Intermediate => 50,
            Difficulty::Expert => 100,
            Difficulty::Fullscreen => 150,
        }
    }

    /// Board size for this difficulty. `board_area` is only consulted for `Fullscreen`.
    pub fn config(self, board_area: SurfaceSize) -> BoardConfig {
        match self {
            Difficulty::Beginner => BoardConfig::new(9, 9, 10),
            Difficulty::Intermediate => BoardConfig::new(16, 16, 40),
            Difficulty::Expert => BoardConfig::new(30, 16, 99),
            Difficulty::Fullscreen => {
                let cols = (board_area.width / FULLSCREEN_CELL_PX).max(9);
                let rows = (board_area.height / FULLSCREEN_CELL_PX).max(9);
                let mines = ((cols * rows) as f32 * FULLSCREEN_MINE_RATIO).round() as u32;
                BoardConfig::new(cols, rows, mines.max(1))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub cols: u32,
    pub rows: u32,
    pub mines: u32,
}

impl BoardConfig {
    pub fn new(cols: u32, rows: u32, mines: u32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
            mines,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    pub is_mine: bool,
    pub is_open: bool,
    pub is_flag: bool,
    pub adjacent_mines: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineState {
    /// No mines placed yet; the first reveal places them.
    Ready,
    Playing,
    Won,
    Lost,
}

impl MineState {
    pub fn is_final(self) -> bool {
        matches!(self, MineState::Won | MineState::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Safe { opened: u32 },
    Exploded,
    Won { opened: u32 },
}

impl RevealOutcome {
    pub fn opened(self) -> u32 {
        match self {
            RevealOutcome::Safe { opened } | RevealOutcome::Won { opened } => opened,
            _ => 0,
        }
    }
}

/// Cells a player could deduce from the revealed numbers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicSets {
    pub must_be_safe: BTreeSet<Pos>,
    pub must_be_mine: BTreeSet<Pos>,
}

impl LogicSets {
    pub fn has_deduction(&self) -> bool {
        !self.must_be_safe.is_empty() || !self.must_be_mine.is_empty()
    }

    pub fn contains(&self, p: Pos) -> bool {
        self.must_be_safe.contains(&p) || self.must_be_mine.contains(&p)
    }
}

#[derive(Debug, Clone)]
pub struct Minesweeper {
    config: BoardConfig,
    cells: Vec<Cell>,
    state: MineState,
    safe_click: bool,
    placed_mines: u32,
    opened: u32,
    flags: u32,
    exploded_at: Option<Pos>,
    last_relocation: Option<(Pos, Pos)>,
    rng: StdRng,
}

impl Minesweeper {
    pub fn new(config: BoardConfig, seed: u64, safe_click: bool) -> Self {
        Self {
            config,
            cells: vec![Cell::default(); (config.cols * config.rows) as usize],
            state: MineState::Ready,
            safe_click,
            placed_mines: 0,
            opened: 0,
            flags: 0,
            exploded_at: None,
            last_relocation: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A board already in play with mines at exactly `mines`. Out-of-range positions are skipped.
    pub fn with_mines(config: BoardConfig, mines: &[Pos], seed: u64, safe_click: bool) -> Self {
        let mut game = Self::new(config, seed, safe_click);
        for &p in mines {
            if let Some(i) = game.index(p) {
                if !game.cells[i].is_mine {
                    game.cells[i].is_mine = true;
                    game.placed_mines += 1;
                }
            }
        }
        game.recompute_adjacency();
        game.state = MineState::Playing;
        game
    }

    /// Fresh board with the same configuration; the RNG keeps running.
    pub fn reset(&mut self) {
        self.cells = vec![Cell::default(); (self.config.cols * self.config.rows) as usize];
        self.state = MineState::Ready;
        self.placed_mines = 0;
        self.opened = 0;
        self.flags = 0;
        self.exploded_at = None;
        self.last_relocation = None;
    }

    pub fn set_config(&mut self, config: BoardConfig) {
        self.config = config;
        self.reset();
    }

    pub fn config(&self) -> BoardConfig {
        self.config
    }

    pub fn cols(&self) -> u32 {
        self.config.cols
    }

    pub fn rows(&self) -> u32 {
        self.config.rows
    }

    pub fn state(&self) -> MineState {
        self.state
    }

    pub fn safe_click(&self) -> bool {
        self.safe_click
    }

    pub fn set_safe_click(&mut self, enabled: bool) {
        self.safe_click = enabled;
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Counter display; flags beyond the mine count do not go negative.
    pub fn mines_left(&self) -> u32 {
        self.config.mines.saturating_sub(self.flags)
    }

    pub fn opened(&self) -> u32 {
        self.opened
    }

    pub fn exploded_at(&self) -> Option<Pos> {
        self.exploded_at
    }

    pub fn last_relocation(&self) -> Option<(Pos, Pos)> {
        self.last_relocation
    }

    pub fn cell(&self, p: Pos) -> Option<&Cell> {
        self.index(p).map(|i| &self.cells[i])
    }

    fn index(&self, (x, y): Pos) -> Option<usize> {
        (x < self.config.cols && y < self.config.rows)
            .then(|| (y * self.config.cols + x) as usize)
    }

    pub fn neighbors(&self, (x, y): Pos) -> impl Iterator<Item = Pos> + use<> {
        let (cols, rows) = (self.config.cols as i64, self.config.rows as i64);
        let (x, y) = (x as i64, y as i64);
        (-1i64..=1)
            .flat_map(move |dy| (-1i64..=1).map(move |dx| (dx, dy)))
            .filter(|&(dx, dy)| dx != 0 || dy != 0)
            .map(move |(dx, dy)| (x + dx, y + dy))
            .filter(move |&(nx, ny)| nx >= 0 && ny >= 0 && nx < cols && ny < rows)
            .map(|(nx, ny)| (nx as u32, ny as u32))
    }

    fn count_mines_around(&self, p: Pos) -> u8 {
        self.neighbors(p)
            .filter(|&n| self.cell(n).is_some_and(|c| c.is_mine))
            .count() as u8
    }

    fn recompute_adjacency(&mut self) {
        for y in 0..self.config.rows {
            for x in 0..self.config.cols {
                let count = self.count_mines_around((x, y));
                if let Some(i) = self.index((x, y)) {
                    self.cells[i].adjacent_mines = count;
                }
            }
        }
    }

    /// Places mines uniformly at random outside the 3x3 block around `first`.
    fn place_mines(&mut self, first: Pos) {
        let (fx, fy) = (first.0 as i64, first.1 as i64);
        let mut candidates: Vec<Pos> = (0..self.config.rows)
            .flat_map(|y| (0..self.config.cols).map(move |x| (x, y)))
            .filter(|&(x, y)| (x as i64 - fx).abs() > 1 || (y as i64 - fy).abs() > 1)
            .collect();
        let count = (self.config.mines as usize).min(candidates.len());
        let (chosen, _) = candidates.partial_shuffle(&mut self.rng, count);
        for &p in chosen.iter() {
            if let Some(i) = self.index(p) {
                self.cells[i].is_mine = true;
            }
        }
        self.placed_mines = count as u32;
        self.recompute_adjacency();
        self.state = MineState::Playing;
    }

    pub fn toggle_flag(&mut self, p: Pos) -> bool {
        if self.state.is_final() {
            return false;
        }
        let Some(i) = self.index(p) else {
            return false;
        };
        let cell = &mut self.cells[i];
        if cell.is_open {
            return false;
        }
        cell.is_flag = !cell.is_flag;
        if cell.is_flag {
            self.flags += 1;
        } else {
            self.flags -= 1;
        }
        true
    }

    /// Left click: reveal a closed cell, or chord on an opened number.
    pub fn reveal(&mut self, p: Pos) -> RevealOutcome {
        if self.state.is_final() {
            return RevealOutcome::NoChange;
        }
        let Some(cell) = self.cell(p).copied() else {
            return RevealOutcome::NoChange;
        };
        if cell.is_open {
            return if cell.adjacent_mines > 0 {
                self.chord(p)
            } else {
                RevealOutcome::NoChange
            };
        }
        if cell.is_flag {
            return RevealOutcome::NoChange;
        }

        if self.state == MineState::Ready {
            self.place_mines(p);
        } else if self.safe_click && cell.is_mine {
            self.try_relocate(p);
        }
        self.open_cells(&[p])
    }

    /// Opens every closed unflagged neighbor when the flags around `p` match its number.
    pub fn chord(&mut self, p: Pos) -> RevealOutcome {
        if self.state != MineState::Playing {
            return RevealOutcome::NoChange;
        }
        let Some(cell) = self.cell(p).copied() else {
            return RevealOutcome::NoChange;
        };
        if !cell.is_open || cell.adjacent_mines == 0 {
            return RevealOutcome::NoChange;
        }
        let flags = self
            .neighbors(p)
            .filter(|&n| self.cell(n).is_some_and(|c| c.is_flag))
            .count();
        if flags != cell.adjacent_mines as usize {
            return RevealOutcome::NoChange;
        }
        let targets: Vec<Pos> = self
            .neighbors(p)
            .filter(|&n| self.cell(n).is_some_and(|c| !c.is_open && !c.is_flag))
            .collect();
        if targets.is_empty() {
            return RevealOutcome::NoChange;
        }
        self.open_cells(&targets)
    }

    /// Opens `starts` and floods from every zero. Either all of it happens or the game ends.
    fn open_cells(&mut self, starts: &[Pos]) -> RevealOutcome {
        if let Some(&mine) = starts
            .iter()
            .find(|&&p| self.cell(p).is_some_and(|c| c.is_mine && !c.is_flag))
        {
            if let Some(i) = self.index(mine) {
                self.cells[i].is_open = true;
            }
            self.exploded_at = Some(mine);
            self.state = MineState::Lost;
            return RevealOutcome::Exploded;
        }

        let mut opened = 0;
        let mut queue: VecDeque<Pos> = starts.iter().copied().collect();
        while let Some(p) = queue.pop_front() {
            let Some(i) = self.index(p) else {
                continue;
            };
            let cell = &mut self.cells[i];
            if cell.is_open || cell.is_flag || cell.is_mine {
                continue;
            }
            cell.is_open = true;
            opened += 1;
            if cell.adjacent_mines == 0 {
                queue.extend(self.neighbors(p));
            }
        }
        self.opened += opened;

        let total = self.config.cols * self.config.rows;
        if self.opened >= total - self.placed_mines {
            self.state = MineState::Won;
            RevealOutcome::Won { opened }
        } else if opened > 0 {
            RevealOutcome::Safe { opened }
        } else {
            RevealOutcome::NoChange
        }
    }

    /// Deductions available from each opened number and the flags around it.
    pub fn logic_sets(&self) -> LogicSets {
        let mut sets = LogicSets::default();
        for y in 0..self.config.rows {
            for x in 0..self.config.cols {
                let p = (x, y);
                let Some(cell) = self.cell(p) else {
                    continue;
                };
                if !cell.is_open || cell.is_mine {
                    continue;
                }
                let mut unknown = Vec::new();
                let mut flags = 0u32;
                for n in self.neighbors(p) {
                    let Some(nc) = self.cell(n) else {
                        continue;
                    };
                    if nc.is_flag {
                        flags += 1;
                    } else if !nc.is_open {
                        unknown.push(n);
                    }
                }
                if unknown.is_empty() {
                    continue;
                }
                let remaining = cell.adjacent_mines as i64 - flags as i64;
                if remaining == 0 {
                    sets.must_be_safe.extend(unknown);
                } else if remaining > 0 && remaining == unknown.len() as i64 {
                    sets.must_be_mine.extend(unknown);
                }
            }
        }
        sets
    }

    fn has_open_neighbor(&self, p: Pos) -> bool {
        self.neighbors(p)
            .any(|n| self.cell(n).is_some_and(|c| c.is_open))
    }

    /// Moves the mine under `src` when nothing on the board could have told the player
    /// where it was and moving it cannot change any displayed number.
    fn try_relocate(&mut self, src: Pos) -> bool {
        if self.has_open_neighbor(src) {
            return false;
        }
        let sets = self.logic_sets();
        if sets.has_deduction() {
            return false;
        }
        let candidates: Vec<Pos> = (0..self.config.rows)
            .flat_map(|y| (0..self.config.cols).map(move |x| (x, y)))
            .filter(|&p| {
                self.cell(p)
                    .is_some_and(|c| !c.is_open && !c.is_flag && !c.is_mine)
                    && !sets.contains(p)
                    && !self.has_open_neighbor(p)
            })
            .collect();
        let Some(&target) = candidates.choose(&mut self.rng) else {
            debug!("no relocation target for mine at {src:?}");
            return false;
        };
        if let (Some(si), Some(ti)) = (self.index(src), self.index(target)) {
            self.cells[si].is_mine = false;
            self.cells[ti].is_mine = true;
        }
        self.recompute_adjacency();
        self.last_relocation = Some((src, target));
        debug!("relocated mine {src:?} -> {target:?}");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn beginner() -> BoardConfig {
        Difficulty::Beginner.config(SurfaceSize::new(0, 0))
    }

    fn assert_numbers_consistent(g: &Minesweeper) {
        for y in 0..g.rows() {
            for x in 0..g.cols() {
                let c = g.cell((x, y)).unwrap();
                if c.is_open && !c.is_mine {
                    let actual = g
                        .neighbors((x, y))
                        .filter(|&n| g.cell(n).unwrap().is_mine)
                        .count() as u8;
                    assert_eq!(c.adjacent_mines, actual, "cell {x},{y}");
                }
            }
        }
    }

    #[test]
    fn first_click_is_always_a_zero() {
        for seed in 0..200 {
            let mut g = Minesweeper::new(beginner(), seed, false);
            let first = ((seed % 9) as u32, (seed / 9 % 9) as u32);
            let outcome = g.reveal(first);
            let cell = g.cell(first).unwrap();
            assert!(!cell.is_mine);
            assert_eq!(cell.adjacent_mines, 0);
            assert!(outcome.opened() >= 4, "seed {seed}: {outcome:?}");
            for n in g.neighbors(first) {
                assert!(g.cell(n).unwrap().is_open);
            }
        }
    }

    #[test]
    fn mine_count_is_clamped_to_available_cells() {
        let mut g = Minesweeper::new(BoardConfig::new(4, 4, 50), 3, false);
        let outcome = g.reveal((0, 0));
        let mines = (0..4)
            .flat_map(|y| (0..4).map(move |x| (x, y)))
            .filter(|&p| g.cell(p).unwrap().is_mine)
            .count();
        assert_eq!(mines, 12);
        assert_eq!(outcome, RevealOutcome::Won { opened: 4 });
    }

    #[test]
    fn numbers_stay_consistent_through_random_play() {
        for seed in 0..30 {
            let config = Difficulty::Intermediate.config(SurfaceSize::default());
            let mut g = Minesweeper::new(config, seed, true);
            let mut rng = StdRng::seed_from_u64(seed + 1000);
            g.reveal((8, 8));
            for _ in 0..60 {
                if g.state().is_final() {
                    break;
                }
                let p = (rng.random_range(0..16), rng.random_range(0..16));
                g.reveal(p);
                assert_numbers_consistent(&g);
            }
        }
    }

    #[test]
    fn chord_opens_neighbors_when_flags_match() {
        // Mine at (0,0); (1,1) shows 1.
        let mut g = Minesweeper::with_mines(BoardConfig::new(3, 3, 1), &[(0, 0)], 1, false);
        assert_eq!(g.reveal((1, 1)), RevealOutcome::Safe { opened: 1 });
        assert_eq!(g.reveal((1, 1)), RevealOutcome::NoChange);
        g.toggle_flag((0, 0));
        assert_eq!(g.reveal((1, 1)), RevealOutcome::Won { opened: 7 });
    }

    #[test]
    fn chord_with_wrong_flag_explodes() {
        let mut g = Minesweeper::with_mines(BoardConfig::new(3, 3, 1), &[(0, 0)], 1, false);
        g.reveal((1, 1));
        g.toggle_flag((2, 2));
        assert_eq!(g.chord((1, 1)), RevealOutcome::Exploded);
        assert_eq!(g.state(), MineState::Lost);
        assert_eq!(g.exploded_at(), Some((0, 0)));
    }

    #[test]
    fn flagged_cells_cannot_be_revealed_and_counter_saturates() {
        let mut g = Minesweeper::with_mines(BoardConfig::new(3, 3, 1), &[(0, 0)], 1, false);
        assert!(g.toggle_flag((0, 0)));
        assert!(g.toggle_flag((1, 0)));
        assert_eq!(g.mines_left(), 0);
        assert_eq!(g.reveal((0, 0)), RevealOutcome::NoChange);
        assert!(g.toggle_flag((1, 0)));
        assert_eq!(g.flags(), 1);
    }

    #[test]
    fn logic_sets_find_mine_then_safe_cells() {
        // Mines fill column 2; the flood from (0,0) stops at the 2s in column 1.
        let mut g =
            Minesweeper::with_mines(BoardConfig::new(4, 2, 2), &[(2, 0), (2, 1)], 1, false);
        assert_eq!(g.reveal((0, 0)), RevealOutcome::Safe { opened: 4 });
        let sets = g.logic_sets();
        assert_eq!(sets.must_be_mine, BTreeSet::from([(2, 0), (2, 1)]));
        assert!(sets.must_be_safe.is_empty());

        g.toggle_flag((2, 0));
        g.toggle_flag((2, 1));
        assert!(!g.logic_sets().has_deduction());
    }
}

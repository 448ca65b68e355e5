//! Sokoban rules: walk, push one box, undo, and win detection.

use std::collections::BTreeSet;

use engine::UndoStack;
use engine::input::Direction;
use log::warn;

use crate::sokoban_levels::{self, CellTag, LevelData, LevelError, Pos};

pub const LEVELS_PER_PAGE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    player: Pos,
    boxes: BTreeSet<Pos>,
    moves: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Blocked,
    Walked,
    Pushed,
    /// The push put the last box on a target.
    Solved,
}

impl MoveOutcome {
    pub fn moved(self) -> bool {
        !matches!(self, MoveOutcome::Blocked)
    }
}

#[derive(Debug, Clone)]
pub struct Sokoban {
    level_id: usize,
    level: LevelData,
    player: Pos,
    boxes: BTreeSet<Pos>,
    moves: u32,
    undo: UndoStack<Snapshot>,
}

impl Sokoban {
    pub fn new(level_id: usize, level: LevelData) -> Self {
        Self {
            level_id,
            player: level.player,
            boxes: level.boxes.clone(),
            level,
            moves: 0,
            undo: UndoStack::new(),
        }
    }

    pub fn load(level_id: usize) -> Result<Self, LevelError> {
        Ok(Self::new(level_id, sokoban_levels::load_level(level_id)?))
    }

    /// Loads `level_id`, falling back to level 1 when its data is missing or invalid.
    pub fn load_or_first(level_id: usize) -> (Self, Option<LevelError>) {
        match Self::load(level_id) {
            Ok(game) => (game, None),
            Err(err) => {
                warn!("sokoban level {level_id}: {err}; loading level 1");
                let first = sokoban_levels::load_level(1)
                    .map(|level| Self::new(1, level))
                    .unwrap_or_else(|_| Self::new(1, fallback_level()));
                (first, Some(err))
            }
        }
    }

    pub fn level_id(&self) -> usize {
        self.level_id
    }

    pub fn level(&self) -> &LevelData {
        &self.level
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn boxes(&self) -> &BTreeSet<Pos> {
        &self.boxes
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn has_box(&self, p: Pos) -> bool {
        self.boxes.contains(&p)
    }

    pub fn is_won(&self) -> bool {
        self.boxes
            .iter()
            .all(|&b| self.level.tag(b) == CellTag::Target)
    }

    fn step(&self, (x, y): Pos, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= self.level.width as i64 || ny >= self.level.height as i64 {
            return None;
        }
        Some((nx as u32, ny as u32))
    }

    fn is_open(&self, p: Pos) -> bool {
        self.level.tag(p) != CellTag::Wall
    }

    pub fn try_move(&mut self, dir: Direction) -> MoveOutcome {
        if self.is_won() {
            return MoveOutcome::Blocked;
        }
        let Some(dest) = self.step(self.player, dir).filter(|&p| self.is_open(p)) else {
            return MoveOutcome::Blocked;
        };
        let pushed = if self.has_box(dest) {
            let Some(beyond) = self
                .step(dest, dir)
                .filter(|&p| self.is_open(p) && !self.has_box(p))
            else {
                return MoveOutcome::Blocked;
            };
            Some(beyond)
        } else {
            None
        };

        self.undo.push(Snapshot {
            player: self.player,
            boxes: self.boxes.clone(),
            moves: self.moves,
        });
        if let Some(beyond) = pushed {
            self.boxes.remove(&dest);
            self.boxes.insert(beyond);
        }
        self.player = dest;
        self.moves += 1;

        match pushed {
            Some(_) if self.is_won() => MoveOutcome::Solved,
            Some(_) => MoveOutcome::Pushed,
            None => MoveOutcome::Walked,
        }
    }

    /// Restores the state before the last move. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.undo.pop() else {
            return false;
        };
        self.player = prev.player;
        self.boxes = prev.boxes;
        self.moves = prev.moves;
        true
    }

    pub fn restart(&mut self) {
        self.player = self.level.player;
        self.boxes = self.level.boxes.clone();
        self.moves = 0;
        self.undo.clear();
    }
}

/// Last-resort board if even level 1 cannot be parsed.
fn fallback_level() -> LevelData {
    LevelData {
        width: 4,
        height: 3,
        tags: vec![
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Floor,
            CellTag::Floor,
            CellTag::Target,
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Wall,
            CellTag::Wall,
        ],
        player: (0, 1),
        boxes: BTreeSet::from([(1, 1)]),
    }
}

/// Level ids on `page` (0-based) of the level select grid.
pub fn page_levels(page: usize, total: usize) -> std::ops::RangeInclusive<usize> {
    let first = page * LEVELS_PER_PAGE + 1;
    let last = ((page + 1) * LEVELS_PER_PAGE).min(total);
    first..=last
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(LEVELS_PER_PAGE).max(1)
}

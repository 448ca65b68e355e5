use std::ops::Add;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;
pub const CELL_EMPTY: u8 = 0;

/// Gravity interval per difficulty level 1..=5.
pub const DROP_INTERVALS_MS: [u64; 5] = [800, 600, 400, 250, 120];
pub const MAX_LEVEL: u8 = DROP_INTERVALS_MS.len() as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl Piece {
    pub const ALL: [Piece; 7] = [
        Piece::I,
        Piece::O,
        Piece::T,
        Piece::S,
        Piece::Z,
        Piece::J,
        Piece::L,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const ZERO: Vec2i = Vec2i { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2i {
    type Output = Vec2i;

    fn add(self, rhs: Vec2i) -> Self::Output {
        Vec2i::new(self.x + rhs.x, self.y + rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationDir {
    Cw,
    Ccw,
}

impl RotationDir {
    fn apply(self, rotation: u8, states: u8) -> u8 {
        let states = states.max(1);
        match self {
            RotationDir::Cw => (rotation + 1) % states,
            RotationDir::Ccw => (rotation + states - 1) % states,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityAdvanceResult {
    Waiting,
    Moved,
    /// The piece could not fall and was locked; `lines` rows were cleared.
    Locked { lines: u32 },
    NoActivePiece,
}

/// Multi-line bonus ×1, ×1.5, ×2, ×3 on 100 points per line, before the level factor.
fn line_clear_points(lines: u32) -> u32 {
    match lines {
        0 => 0,
        1 => 100,
        2 => 300,
        3 => 600,
        n => 300 * n,
    }
}

/// Rows are stored bottom-up: `board[0]` is the floor row.
#[derive(Debug, Clone)]
pub struct TetrisCore {
    board: Vec<Vec<u8>>,
    current_piece: Option<Piece>,
    current_piece_pos: Vec2i,
    current_piece_rotation: u8,
    next_piece: Piece,
    piece_bag: Vec<Piece>,
    rng: StdRng,
    level: u8,
    gravity_elapsed: Duration,
    lines_cleared: u32,
    score: u32,
    game_over: bool,
}

impl TetrisCore {
    pub fn new(seed: u64, level: u8) -> Self {
        let mut core = Self {
            board: vec![vec![CELL_EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
            current_piece: None,
            current_piece_pos: Vec2i::ZERO,
            current_piece_rotation: 0,
            next_piece: Piece::I,
            piece_bag: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            level: level.clamp(1, MAX_LEVEL),
            gravity_elapsed: Duration::ZERO,
            lines_cleared: 0,
            score: 0,
            game_over: false,
        };
        core.next_piece = core.draw_piece();
        core.spawn_new_piece();
        core
    }

    pub fn board(&self) -> &[Vec<u8>] {
        &self.board
    }

    pub fn cell(&self, x: usize, y: usize) -> u8 {
        self.board
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(CELL_EMPTY)
    }

    pub fn set_cell(&mut self, x: usize, y: usize, value: u8) {
        if let Some(cell) = self.board.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = value;
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn drop_interval(&self) -> Duration {
        Duration::from_millis(DROP_INTERVALS_MS[usize::from(self.level - 1)])
    }

    pub fn current_piece(&self) -> Option<Piece> {
        self.current_piece
    }

    pub fn next_piece(&self) -> Piece {
        self.next_piece
    }

    pub fn current_piece_pos(&self) -> Vec2i {
        self.current_piece_pos
    }

    pub fn current_piece_rotation(&self) -> u8 {
        self.current_piece_rotation
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn set_current_piece_for_test(&mut self, piece: Piece, pos: Vec2i, rotation: u8) {
        self.current_piece = Some(piece);
        self.current_piece_pos = pos;
        self.current_piece_rotation = rotation;
    }

    /// 7-bag: every piece once per shuffled bag.
    pub fn draw_piece(&mut self) -> Piece {
        if self.piece_bag.is_empty() {
            self.piece_bag = Piece::ALL.to_vec();
            self.piece_bag.shuffle(&mut self.rng);
        }
        self.piece_bag.pop().unwrap_or(Piece::T)
    }

    fn spawn_position(piece: Piece) -> Vec2i {
        let grid = piece_grid(piece, 0);
        let top_row = (0..grid.size())
            .find(|&gy| (0..grid.size()).any(|gx| grid.cell(gx, gy) == 1))
            .unwrap_or(0) as i32;
        let offset = piece_board_offset(piece);
        let x = (BOARD_WIDTH as i32 - grid.size() as i32) / 2 + offset;
        Vec2i::new(x, BOARD_HEIGHT as i32 - 1 + top_row - offset)
    }

    pub fn spawn_new_piece(&mut self) -> bool {
        let piece = self.next_piece;
        self.next_piece = self.draw_piece();
        self.current_piece = Some(piece);
        self.current_piece_pos = Self::spawn_position(piece);
        self.current_piece_rotation = 0;
        self.gravity_elapsed = Duration::ZERO;
        if !self.is_valid_position(self.current_piece_pos, self.current_piece_rotation) {
            self.game_over = true;
            self.current_piece = None;
            return false;
        }
        true
    }

    pub fn is_valid_position(&self, pos: Vec2i, rotation: u8) -> bool {
        let Some(piece) = self.current_piece else {
            return false;
        };
        occupied_cells(piece, pos, rotation).into_iter().all(|(x, y)| {
            x >= 0
                && x < BOARD_WIDTH as i32
                && y >= 0
                && (y >= BOARD_HEIGHT as i32 || self.board[y as usize][x as usize] == CELL_EMPTY)
        })
    }

    pub fn move_piece(&mut self, dir: Vec2i) -> bool {
        if self.game_over || self.current_piece.is_none() {
            return false;
        }
        let new_pos = self.current_piece_pos + dir;
        if self.is_valid_position(new_pos, self.current_piece_rotation) {
            self.current_piece_pos = new_pos;
            return true;
        }
        false
    }

    /// One row down; when the piece cannot fall it locks.
    pub fn soft_drop(&mut self) -> GravityAdvanceResult {
        if self.game_over || self.current_piece.is_none() {
            return GravityAdvanceResult::NoActivePiece;
        }
        self.gravity_elapsed = Duration::ZERO;
        if self.move_piece(Vec2i::new(0, -1)) {
            return GravityAdvanceResult::Moved;
        }
        let lines = self.lock_active_piece();
        GravityAdvanceResult::Locked { lines }
    }

    pub fn advance_with_gravity(&mut self, dt: Duration) -> GravityAdvanceResult {
        if self.game_over || self.current_piece.is_none() {
            return GravityAdvanceResult::NoActivePiece;
        }
        self.gravity_elapsed += dt;
        if self.gravity_elapsed < self.drop_interval() {
            return GravityAdvanceResult::Waiting;
        }
        self.soft_drop()
    }

    /// Plain matrix rotation; a blocked rotation is simply refused.
    pub fn rotate_piece(&mut self, dir: RotationDir) -> bool {
        let Some(piece) = self.current_piece else {
            return false;
        };
        if self.game_over {
            return false;
        }
        let new_rotation = dir.apply(self.current_piece_rotation, piece_rotation_states(piece));
        if self.is_valid_position(self.current_piece_pos, new_rotation) {
            self.current_piece_rotation = new_rotation;
            return true;
        }
        false
    }

    /// Drops to the floor and locks. Returns the lines cleared.
    pub fn hard_drop(&mut self) -> u32 {
        if self.game_over || self.current_piece.is_none() {
            return 0;
        }
        while self.move_piece(Vec2i::new(0, -1)) {}
        self.lock_active_piece()
    }

    pub fn ghost_piece_pos(&self) -> Option<Vec2i> {
        self.current_piece?;
        let mut pos = self.current_piece_pos;
        while self.is_valid_position(pos + Vec2i::new(0, -1), self.current_piece_rotation) {
            pos = pos + Vec2i::new(0, -1);
        }
        Some(pos)
    }

    /// Board cells with the falling piece drawn in.
    pub fn board_with_active_piece(&self) -> Vec<Vec<u8>> {
        let mut board = self.board.clone();
        if let Some(piece) = self.current_piece {
            for (x, y) in occupied_cells(piece, self.current_piece_pos, self.current_piece_rotation) {
                if x >= 0 && y >= 0 && (x as usize) < BOARD_WIDTH && (y as usize) < BOARD_HEIGHT {
                    board[y as usize][x as usize] = piece_type(piece);
                }
            }
        }
        board
    }

    fn place_piece(&mut self) {
        let Some(piece) = self.current_piece else {
            return;
        };
        for (x, y) in occupied_cells(piece, self.current_piece_pos, self.current_piece_rotation) {
            if x >= 0 && y >= 0 && (x as usize) < BOARD_WIDTH && (y as usize) < BOARD_HEIGHT {
                self.board[y as usize][x as usize] = piece_type(piece);
            }
        }
    }

    fn lock_active_piece(&mut self) -> u32 {
        self.place_piece();
        let lines = self.clear_lines();
        if lines > 0 {
            self.score = self
                .score
                .saturating_add(line_clear_points(lines) * u32::from(self.level));
        }
        self.spawn_new_piece();
        lines
    }

    fn clear_lines(&mut self) -> u32 {
        let before = self.board.len();
        self.board.retain(|row| row.iter().any(|&cell| cell == CELL_EMPTY));
        let cleared = before - self.board.len();
        for _ in 0..cleared {
            self.board.push(vec![CELL_EMPTY; BOARD_WIDTH]);
        }
        self.lines_cleared += cleared as u32;
        cleared as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceGrid {
    size: usize,
    cells: [u8; 16],
}

impl PieceGrid {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.size && y < self.size);
        self.cells[y * self.size + x]
    }
}

const fn piece_board_offset(piece: Piece) -> i32 {
    match piece {
        Piece::O => 0,
        _ => 1,
    }
}

const fn piece_rotation_states(piece: Piece) -> u8 {
    match piece {
        Piece::O => 1,
        _ => 4,
    }
}

/// Board cells covered by `piece`; grid row 0 is the piece's top row.
pub fn occupied_cells(piece: Piece, pos: Vec2i, rotation: u8) -> Vec<(i32, i32)> {
    let grid = piece_grid(piece, rotation);
    let offset = piece_board_offset(piece);
    let mut cells = Vec::with_capacity(4);
    for gy in 0..grid.size() {
        for gx in 0..grid.size() {
            if grid.cell(gx, gy) == 1 {
                cells.push((pos.x + gx as i32 - offset, pos.y - gy as i32 + offset));
            }
        }
    }
    cells
}

pub fn piece_grid(piece: Piece, rotation: u8) -> PieceGrid {
    let mut grid = base_piece_grid(piece);
    for _ in 0..rotation % piece_rotation_states(piece) {
        grid = rotate_grid_90(&grid);
    }
    grid
}

fn rotate_grid_90(grid: &PieceGrid) -> PieceGrid {
    let size = grid.size;
    let mut rotated = PieceGrid {
        size,
        cells: [0u8; 16],
    };
    for y in 0..size {
        for x in 0..size {
            // Clockwise: rotated[x][size-1-y] = grid[y][x]
            rotated.cells[x * size + (size - 1 - y)] = grid.cells[y * size + x];
        }
    }
    rotated
}

fn base_piece_grid(piece: Piece) -> PieceGrid {
    let (size, rows): (usize, &[u8]) = match piece {
        Piece::I => (4, &[0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0]),
        Piece::O => (2, &[1, 1, 1, 1]),
        Piece::T => (3, &[0, 1, 0, 1, 1, 1, 0, 0, 0]),
        Piece::S => (3, &[0, 1, 1, 1, 1, 0, 0, 0, 0]),
        Piece::Z => (3, &[1, 1, 0, 0, 1, 1, 0, 0, 0]),
        Piece::J => (3, &[1, 0, 0, 1, 1, 1, 0, 0, 0]),
        Piece::L => (3, &[0, 0, 1, 1, 1, 1, 0, 0, 0]),
    };
    let mut cells = [0u8; 16];
    cells[..rows.len()].copy_from_slice(rows);
    PieceGrid { size, cells }
}

/// Colour index stored on the board for a locked piece (1..=7).
pub const fn piece_type(piece: Piece) -> u8 {
    match piece {
        Piece::I => 1,
        Piece::O => 2,
        Piece::T => 3,
        Piece::S => 4,
        Piece::Z => 5,
        Piece::J => 6,
        Piece::L => 7,
    }
}

#[cfg(test)]
mod piece_grid_tests {
    use super::*;

    #[test]
    fn o_piece_grid_is_invariant_under_rotation() {
        for r in 0..4 {
            assert_eq!(piece_grid(Piece::O, r), piece_grid(Piece::O, 0));
        }
    }

    #[test]
    fn i_piece_rotation_1_is_vertical_in_column_2() {
        let grid = piece_grid(Piece::I, 1);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.cell(x, y), u8::from(x == 2), "({x},{y})");
            }
        }
    }

    #[test]
    fn four_rotations_return_to_start() {
        for piece in Piece::ALL {
            let mut grid = piece_grid(piece, 0);
            for _ in 0..4 {
                grid = rotate_grid_90(&grid);
            }
            assert_eq!(grid, piece_grid(piece, 0), "{piece:?}");
        }
    }

    #[test]
    fn every_piece_has_four_cells() {
        for piece in Piece::ALL {
            for r in 0..4 {
                assert_eq!(occupied_cells(piece, Vec2i::new(4, 10), r).len(), 4);
            }
        }
    }

    #[test]
    fn scoring_multipliers() {
        assert_eq!(line_clear_points(1), 100);
        assert_eq!(line_clear_points(2), 300);
        assert_eq!(line_clear_points(3), 600);
        assert_eq!(line_clear_points(4), 1200);
    }
}

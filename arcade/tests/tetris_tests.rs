use std::collections::HashMap;
use std::time::Duration;

use arcade::tetris_core::{
    BOARD_HEIGHT, BOARD_WIDTH, CELL_EMPTY, GravityAdvanceResult, Piece, RotationDir, TetrisCore,
    Vec2i,
};

fn fill_row_except(core: &mut TetrisCore, y: usize, hole: usize) {
    for x in 0..BOARD_WIDTH {
        if x != hole {
            core.set_cell(x, y, 8);
        }
    }
}

#[test]
fn vertical_i_into_the_gap_clears_one_line() {
    for level in 1..=5u8 {
        let mut core = TetrisCore::new(7, level);
        fill_row_except(&mut core, 0, 5);
        // Rotation 1 puts the I in grid column 2, which lands on board x = pos.x + 1.
        core.set_current_piece_for_test(Piece::I, Vec2i::new(4, 15), 1);
        let lines = core.hard_drop();
        assert_eq!(lines, 1);
        assert_eq!(core.lines_cleared(), 1);
        assert_eq!(core.score(), 100 * u32::from(level));
        // The three I cells above the cleared row fell by one.
        for y in 0..3 {
            assert_ne!(core.cell(5, y), CELL_EMPTY, "y={y}");
        }
        assert_eq!(core.cell(5, 3), CELL_EMPTY);
        assert_eq!(core.cell(0, 0), CELL_EMPTY);
    }
}

#[test]
fn four_lines_score_twelve_hundred_per_level() {
    let mut core = TetrisCore::new(1, 2);
    for y in 0..4 {
        fill_row_except(&mut core, y, 0);
    }
    core.set_current_piece_for_test(Piece::I, Vec2i::new(-1, 15), 1);
    assert_eq!(core.hard_drop(), 4);
    assert_eq!(core.score(), 2400);
    assert!(core.board().iter().all(|row| row.iter().all(|&c| c == CELL_EMPTY)));
}

#[test]
fn cleared_count_matches_rows_that_became_full() {
    let mut core = TetrisCore::new(3, 1);
    fill_row_except(&mut core, 0, 5);
    fill_row_except(&mut core, 1, 4);
    core.set_cell(5, 1, CELL_EMPTY);
    core.set_current_piece_for_test(Piece::I, Vec2i::new(4, 15), 1);
    assert_eq!(core.hard_drop(), 1);
    // Row 1 dropped to row 0 and kept its gap at x=4.
    assert_eq!(core.cell(4, 0), CELL_EMPTY);
    assert_ne!(core.cell(3, 0), CELL_EMPTY);
}

#[test]
fn gravity_waits_for_the_level_interval() {
    let mut core = TetrisCore::new(9, 1);
    let y0 = core.current_piece_pos().y;
    assert_eq!(
        core.advance_with_gravity(Duration::from_millis(799)),
        GravityAdvanceResult::Waiting
    );
    assert_eq!(
        core.advance_with_gravity(Duration::from_millis(1)),
        GravityAdvanceResult::Moved
    );
    assert_eq!(core.current_piece_pos().y, y0 - 1);

    let mut fast = TetrisCore::new(9, 5);
    assert_eq!(fast.drop_interval(), Duration::from_millis(120));
    assert_eq!(
        fast.advance_with_gravity(Duration::from_millis(120)),
        GravityAdvanceResult::Moved
    );
}

#[test]
fn landing_locks_when_the_piece_cannot_fall() {
    let mut core = TetrisCore::new(4, 1);
    core.set_current_piece_for_test(Piece::O, Vec2i::new(4, 2), 0);
    assert_eq!(core.soft_drop(), GravityAdvanceResult::Moved);
    assert_eq!(core.soft_drop(), GravityAdvanceResult::Locked { lines: 0 });
    assert_ne!(core.cell(4, 0), CELL_EMPTY);
    assert_ne!(core.cell(5, 1), CELL_EMPTY);
    assert!(!core.is_game_over());
}

#[test]
fn rotation_against_a_wall_is_refused_without_kicks() {
    let mut core = TetrisCore::new(2, 1);
    // Vertical I hugging the left wall: rotating back to horizontal would poke out at x=-1.
    core.set_current_piece_for_test(Piece::I, Vec2i::new(-1, 10), 1);
    assert!(!core.rotate_piece(RotationDir::Ccw));
    assert_eq!(core.current_piece_rotation(), 1);
    assert_eq!(core.current_piece_pos(), Vec2i::new(-1, 10));
    assert!(!core.move_piece(Vec2i::new(-1, 0)));
}

#[test]
fn seven_bag_deals_each_piece_once_per_bag() {
    let mut core = TetrisCore::new(42, 1);
    // Two pieces were already drawn for the current and next slots; start on a fresh bag boundary.
    for _ in 0..5 {
        core.draw_piece();
    }
    for _ in 0..3 {
        let mut counts: HashMap<Piece, u32> = HashMap::new();
        for _ in 0..7 {
            *counts.entry(core.draw_piece()).or_default() += 1;
        }
        assert_eq!(counts.len(), 7);
        assert!(counts.values().all(|&n| n == 1));
    }
}

#[test]
fn blocked_spawn_ends_the_game() {
    let mut core = TetrisCore::new(5, 1);
    for y in 0..BOARD_HEIGHT {
        fill_row_except(&mut core, y, 0);
    }
    assert!(!core.spawn_new_piece());
    assert!(core.is_game_over());
    assert!(core.current_piece().is_none());
    assert_eq!(core.hard_drop(), 0);
}

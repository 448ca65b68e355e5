use arcade::game2048_core::{Game2048, SIZE};
use engine::input::Direction;

fn filled(game: &Game2048) -> usize {
    game.board().iter().flatten().filter(|v| **v > 0).count()
}

#[test]
fn left_merges_the_pair_and_spawns_one_tile() {
    let mut board = [[0; SIZE]; SIZE];
    board[0] = [2, 2, 4, 0];
    let mut game = Game2048::with_board(board, 21);
    let outcome = game.slide(Direction::Left).clone();

    assert!(outcome.moved);
    assert_eq!(outcome.gained, 4);
    assert_eq!(game.score(), 4);
    assert_eq!(&game.board()[0][..2], &[4, 4]);
    assert_eq!(filled(&game), 3);

    let (cell, value) = outcome.spawned.expect("a tile spawns after a move");
    assert!(cell != (0, 0) && cell != (1, 0));
    assert!(value == 2 || value == 4);
    assert_eq!(game.tile(cell), value);
}

#[test]
fn blocked_move_spawns_nothing() {
    let mut board = [[0; SIZE]; SIZE];
    board[0] = [2, 4, 0, 0];
    let mut game = Game2048::with_board(board, 4);
    let outcome = game.slide(Direction::Left).clone();
    assert!(!outcome.moved);
    assert_eq!(outcome.spawned, None);
    assert_eq!(filled(&game), 2);
    assert_eq!(game.score(), 0);
}

#[test]
fn spawns_are_mostly_twos() {
    let mut twos = 0;
    let mut fours = 0;
    for seed in 0..400 {
        let mut board = [[0; SIZE]; SIZE];
        board[3] = [2, 0, 0, 0];
        let mut game = Game2048::with_board(board, seed);
        match game.slide(Direction::Up).spawned {
            Some((_, 2)) => twos += 1,
            Some((_, 4)) => fours += 1,
            other => panic!("unexpected spawn {other:?}"),
        }
    }
    assert!(twos > 300, "twos {twos}");
    assert!(fours > 10, "fours {fours}");
}

#[test]
fn checkerboard_has_no_moves_left() {
    let board = [
        [2, 4, 2, 4],
        [4, 2, 4, 2],
        [2, 4, 2, 4],
        [4, 2, 4, 8],
    ];
    assert!(!Game2048::with_board(board, 0).can_move());
    let mut open = board;
    open[3][3] = 0;
    assert!(Game2048::with_board(open, 0).can_move());
}

use std::collections::BTreeMap;

use arcade::minesweeper_core::{
    BoardConfig, Difficulty, MineState, Minesweeper, Pos, RevealOutcome,
};
use engine::surface::SurfaceSize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn forced_guess_board(safe_click: bool) -> Minesweeper {
    let mut mines: Vec<Pos> = (0..9).map(|y| (3, y)).collect();
    mines.push((7, 4));
    let mut game = Minesweeper::with_mines(BoardConfig::new(9, 9, 10), &mines, 5, safe_click);
    assert_eq!(game.reveal((0, 0)), RevealOutcome::Safe { opened: 27 });
    for y in 0..9 {
        assert!(game.toggle_flag((3, y)));
    }
    game
}

fn open_numbers(game: &Minesweeper) -> BTreeMap<Pos, u8> {
    let mut out = BTreeMap::new();
    for y in 0..game.rows() {
        for x in 0..game.cols() {
            if let Some(c) = game.cell((x, y)) {
                if c.is_open && !c.is_mine {
                    out.insert((x, y), c.adjacent_mines);
                }
            }
        }
    }
    out
}

fn assert_numbers_consistent(game: &Minesweeper) {
    for y in 0..game.rows() {
        for x in 0..game.cols() {
            let Some(c) = game.cell((x, y)) else {
                continue;
            };
            if c.is_mine {
                continue;
            }
            let actual = game
                .neighbors((x, y))
                .filter(|&n| game.cell(n).is_some_and(|nc| nc.is_mine))
                .count();
            assert_eq!(c.adjacent_mines as usize, actual, "cell ({x},{y})");
        }
    }
}

#[test]
fn safe_click_relocates_a_mine_on_a_forced_guess() {
    let mut game = forced_guess_board(true);
    assert!(!game.logic_sets().has_deduction());
    let before = open_numbers(&game);

    let outcome = game.reveal((7, 4));
    assert_ne!(outcome, RevealOutcome::Exploded);
    assert_ne!(game.state(), MineState::Lost);

    let (from, to) = game.last_relocation().expect("mine should have moved");
    assert_eq!(from, (7, 4));
    assert!(to.0 >= 4, "target {to:?} must not touch the opened region");
    assert!(game.cell(to).is_some_and(|c| c.is_mine));
    assert!(game.cell((7, 4)).is_some_and(|c| c.is_open && !c.is_mine));

    let after = open_numbers(&game);
    for (p, n) in &before {
        assert_eq!(after.get(p), Some(n));
    }
    assert_numbers_consistent(&game);
}

#[test]
fn without_protection_the_same_guess_loses() {
    let mut game = forced_guess_board(false);
    assert_eq!(game.reveal((7, 4)), RevealOutcome::Exploded);
    assert_eq!(game.state(), MineState::Lost);
    assert_eq!(game.exploded_at(), Some((7, 4)));
    assert_eq!(game.last_relocation(), None);
}

#[test]
fn no_relocation_when_the_clicked_mine_touches_an_open_cell() {
    let mines = [(1, 0), (1, 1), (1, 2)];
    let mut game = Minesweeper::with_mines(BoardConfig::new(5, 3, 3), &mines, 1, true);
    assert!(matches!(game.reveal((4, 1)), RevealOutcome::Safe { .. }));
    // Column 2 now shows 2s and 3s next to the mines; (1,1) has open neighbors.
    assert_eq!(game.reveal((1, 1)), RevealOutcome::Exploded);
    assert_eq!(game.last_relocation(), None);
}

#[test]
fn relocation_never_changes_a_displayed_number() {
    for seed in 0..60u64 {
        let mut game = Minesweeper::new(BoardConfig::new(16, 16, 40), seed, true);
        let mut rng = StdRng::seed_from_u64(seed ^ 0xABCD);
        game.reveal((8, 8));
        for _ in 0..200 {
            if game.state().is_final() {
                break;
            }
            let before = open_numbers(&game);
            let p = (rng.random_range(0..16), rng.random_range(0..16));
            game.reveal(p);
            let after = open_numbers(&game);
            for (q, n) in &before {
                assert_eq!(after.get(q), Some(n), "seed {seed} changed {q:?}");
            }
            assert_numbers_consistent(&game);
        }
    }
}

#[test]
fn first_click_opens_at_least_the_surrounding_block_on_every_preset() {
    let area = SurfaceSize::new(936, 560);
    for difficulty in Difficulty::ALL {
        let config = difficulty.config(area);
        let mut game = Minesweeper::new(config, 42, false);
        let center = (config.cols / 2, config.rows / 2);
        let outcome = game.reveal(center);
        assert!(outcome.opened() >= 9, "{difficulty:?}");
        assert_eq!(game.cell(center).map(|c| c.adjacent_mines), Some(0));
    }
}

#[test]
fn fullscreen_preset_follows_surface_size() {
    let config = Difficulty::Fullscreen.config(SurfaceSize::new(960, 480));
    assert_eq!((config.cols, config.rows), (40, 20));
    assert_eq!(config.mines, 144);
    let tiny = Difficulty::Fullscreen.config(SurfaceSize::new(10, 10));
    assert_eq!((tiny.cols, tiny.rows), (9, 9));
}

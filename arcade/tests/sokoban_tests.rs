use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use arcade::profile::{PROFILE_FILE_NAME, PlayerProfile};
use arcade::sokoban_core::{MoveOutcome, Sokoban};
use arcade::sokoban_levels::{self, CellTag, Pos};
use engine::input::Direction;

fn unique_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("arcade_sokoban_{name}_{nanos}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn state(game: &Sokoban) -> (Pos, BTreeSet<Pos>, u32) {
    (game.player(), game.boxes().clone(), game.moves())
}

/// Breadth-first search over (player, boxes); returns a shortest solution.
fn solve(level_id: usize) -> Option<Vec<Direction>> {
    let start = Sokoban::load(level_id).ok()?;
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    seen.insert((start.player(), start.boxes().clone()));
    queue.push_back((start, Vec::new()));
    while let Some((game, path)) = queue.pop_front() {
        if game.is_won() {
            return Some(path);
        }
        for dir in Direction::ALL {
            let mut next = game.clone();
            if !next.try_move(dir).moved() {
                continue;
            }
            if seen.insert((next.player(), next.boxes().clone())) {
                let mut p = path.clone();
                p.push(dir);
                queue.push_back((next, p));
            }
        }
    }
    None
}

#[test]
fn level_one_solve_updates_best_moves_on_disk() {
    let dir = unique_dir("level1");
    let mut profile = PlayerProfile::open_in(&dir);
    let mut game = Sokoban::load(1).unwrap();
    assert_eq!(game.try_move(Direction::Down), MoveOutcome::Walked);
    assert_eq!(game.try_move(Direction::Left), MoveOutcome::Solved);
    assert_eq!(game.moves(), 2);
    assert!(profile.record_best_moves("1", game.moves()));

    let reopened = PlayerProfile::open(dir.join(PROFILE_FILE_NAME), None);
    assert!(reopened.best_moves("1").is_some_and(|m| m <= 2));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn worse_result_does_not_replace_best_moves() {
    let mut profile = PlayerProfile::detached(Default::default());
    assert!(profile.record_best_moves("4", 40));
    assert!(!profile.record_best_moves("4", 41));
    assert!(profile.record_best_moves("4", 34));
    assert_eq!(profile.best_moves("4"), Some(34));
}

#[test]
fn undoing_every_move_restores_the_initial_state() {
    let mut game = Sokoban::load(4).unwrap();
    let initial = state(&game);
    let script = [
        Direction::Right,
        Direction::Up,
        Direction::Left,
        Direction::Down,
        Direction::Down,
        Direction::Right,
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Right,
    ];
    let mut history = vec![initial.clone()];
    for dir in script {
        if game.try_move(dir).moved() {
            history.push(state(&game));
        }
    }
    assert!(game.moves() > 0);
    while game.undo() {
        history.pop();
        assert_eq!(Some(&state(&game)), history.last());
    }
    assert_eq!(state(&game), initial);
}

#[test]
fn restart_clears_history() {
    let mut game = Sokoban::load(2).unwrap();
    game.try_move(Direction::Right);
    game.try_move(Direction::Up);
    game.restart();
    assert_eq!(game.moves(), 0);
    assert!(!game.can_undo());
    assert_eq!(game.player(), sokoban_levels::load_level(2).unwrap().player);
}

#[test]
fn small_levels_are_solvable_and_win_means_all_boxes_on_targets() {
    for id in [1, 2, 5, 7, 9, 15, 16] {
        let path = solve(id).unwrap_or_else(|| panic!("level {id} unsolvable"));
        let mut game = Sokoban::load(id).unwrap();
        for dir in &path {
            game.try_move(*dir);
        }
        assert!(game.is_won(), "level {id}");
        assert!(
            game.boxes()
                .iter()
                .all(|&b| game.level().tag(b) == CellTag::Target)
        );
        assert_eq!(game.moves() as usize, path.len());
    }
}

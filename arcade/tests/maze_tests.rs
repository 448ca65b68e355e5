use std::collections::HashSet;
use std::time::Duration;

use arcade::maze_core::{
    self, MAX_ATTEMPTS, Maze, MazeParams, MazeRun, MazeStyle, Pos, RunState, TIERS,
};
use engine::input::Direction;

fn disk(center: Pos, radius: f32, maze: &Maze) -> HashSet<Pos> {
    let mut out = HashSet::new();
    for y in 0..maze.height() {
        for x in 0..maze.width() {
            let dx = x as f32 - center.0 as f32;
            let dy = y as f32 - center.1 as f32;
            if dx * dx + dy * dy <= radius * radius {
                out.insert((x, y));
            }
        }
    }
    out
}

#[test]
fn every_style_and_tier_is_solvable() {
    for style in MazeStyle::ALL {
        for (i, tier) in TIERS.iter().enumerate() {
            let params = MazeParams::for_tier(tier, style);
            let maze = maze_core::generate(&params, 100 + i as u64);
            let len = maze.shortest_path_len(maze.start(), maze.end());
            assert!(len.is_some(), "{style:?} tier {}", tier.level);
            assert!(maze.attempts() >= 1 && maze.attempts() <= MAX_ATTEMPTS);
            let len = len.unwrap_or(0);
            assert!(
                len >= params.min_path_len() || maze.attempts() == MAX_ATTEMPTS,
                "{style:?} tier {} path {len}",
                tier.level
            );
        }
    }
}

#[test]
fn generation_is_deterministic_for_a_seed() {
    let params = MazeParams::new(33, 33, MazeStyle::WithRooms);
    assert_eq!(maze_core::generate(&params, 8), maze_core::generate(&params, 8));
}

#[test]
fn loops_add_extra_openings() {
    let count = |style| {
        maze_core::generate(&MazeParams::new(33, 33, style), 4)
            .passages()
            .count()
    };
    // Same lattice, so the loop variant can only have more open tiles than a perfect maze.
    let perfect_edges = (16 * 16) * 2 - 1;
    assert_eq!(count(MazeStyle::Standard), perfect_edges);
    assert!(count(MazeStyle::WithLoops) > perfect_edges);
}

#[test]
fn random_spawn_ends_at_the_farthest_cell() {
    let mut params = MazeParams::new(27, 27, MazeStyle::Standard);
    params.random_spawn = true;
    let maze = maze_core::generate(&params, 21);
    let dist = maze.distances(maze.start());
    let farthest = dist.iter().flatten().copied().max().unwrap_or(0);
    assert_eq!(maze.shortest_path_len(maze.start(), maze.end()), Some(farthest));
}

#[test]
fn vision_disk_follows_the_player_on_the_largest_even_tier() {
    let params = MazeParams::new(42, 42, MazeStyle::Standard);
    let maze = maze_core::generate(&params, 77);
    assert_eq!(maze.start(), (1, 1));
    assert_eq!(maze.end(), (40, 40));

    let mut run = MazeRun::new(maze.clone(), true, Duration::from_secs(150));
    let mut expected = disk((1, 1), 2.5, &maze);
    expected.insert((40, 40));
    assert_eq!(run.explored(), &expected);

    let (dir, target) = if maze.is_passage((2, 1)) {
        (Direction::Right, (2, 1))
    } else {
        (Direction::Down, (1, 2))
    };
    assert!(run.try_move(dir));
    let mut expected = disk(target, 2.5, &maze);
    expected.insert((40, 40));
    assert_eq!(run.explored(), &expected);
    assert!(run.explored().contains(&run.player()));
}

#[test]
fn walls_block_movement_and_reaching_the_end_wins() {
    let maze = Maze::from_rows(&["#####", "#..##", "##..#", "#####"], (1, 1), (3, 2));
    let mut run = MazeRun::new(maze, false, Duration::from_secs(30));
    assert!(!run.try_move(Direction::Up));
    assert!(!run.try_move(Direction::Down));
    assert!(run.try_move(Direction::Right));
    assert!(run.try_move(Direction::Down));
    assert_eq!(run.state(), RunState::Playing);
    assert!(run.try_move(Direction::Right));
    assert_eq!(run.state(), RunState::Won);
    assert_eq!(run.steps(), 3);
}

//! Maze generation (backtracker, growing tree, rooms, loops), path-length validation and the
//! fog-of-war run state.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use engine::input::Direction;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use crate::round_timer::RoundTimer;

pub type Pos = (u32, u32);

pub const MAX_ATTEMPTS: u32 = 6;
pub const DEFAULT_MIN_PATH_RATIO: f32 = 0.7;
pub const DEFAULT_VISION_RADIUS: f32 = 2.5;
/// Probability that the growing tree continues from the newest cell.
pub const NEWEST_CELL_BIAS: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub time_limit_secs: u64,
}

impl Tier {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    pub fn best_key(&self) -> String {
        format!("maze.tier{}", self.level)
    }

    pub fn coin_reward(&self) -> u64 {
        u64::from(self.level) * 10
    }
}

pub const TIERS: [Tier; 6] = [
    Tier { level: 1, width: 21, height: 21, time_limit_secs: 60 },
    Tier { level: 2, width: 27, height: 27, time_limit_secs: 90 },
    Tier { level: 3, width: 33, height: 33, time_limit_secs: 120 },
    Tier { level: 4, width: 42, height: 42, time_limit_secs: 150 },
    Tier { level: 5, width: 51, height: 51, time_limit_secs: 200 },
    Tier { level: 6, width: 61, height: 61, time_limit_secs: 260 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Passage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MazeStyle {
    /// Perfect maze from the recursive backtracker.
    Standard,
    /// Growing tree biased towards straight runs.
    LongCorridor,
    WithLoops,
    WithRooms,
}

impl MazeStyle {
    pub const ALL: [MazeStyle; 4] = [
        MazeStyle::Standard,
        MazeStyle::LongCorridor,
        MazeStyle::WithLoops,
        MazeStyle::WithRooms,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MazeStyle::Standard => "STANDARD",
            MazeStyle::LongCorridor => "LONG CORRIDORS",
            MazeStyle::WithLoops => "LOOPS",
            MazeStyle::WithRooms => "ROOMS",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MazeParams {
    pub width: u32,
    pub height: u32,
    pub style: MazeStyle,
    /// 0 keeps corridors straight, 1 turns at every chance.
    pub twistiness: f32,
    pub loop_rate: f32,
    pub room_rate: f32,
    pub min_path_ratio: f32,
    pub random_spawn: bool,
}

impl MazeParams {
    pub fn new(width: u32, height: u32, style: MazeStyle) -> Self {
        let (twistiness, loop_rate, room_rate) = match style {
            MazeStyle::Standard => (1.0, 0.0, 0.0),
            MazeStyle::LongCorridor => (0.2, 0.0, 0.0),
            MazeStyle::WithLoops => (1.0, 0.1, 0.0),
            MazeStyle::WithRooms => (0.5, 0.0, 0.25),
        };
        Self {
            width: width.max(5),
            height: height.max(5),
            style,
            twistiness,
            loop_rate,
            room_rate,
            min_path_ratio: DEFAULT_MIN_PATH_RATIO,
            random_spawn: false,
        }
    }

    pub fn for_tier(tier: &Tier, style: MazeStyle) -> Self {
        Self::new(tier.width, tier.height, style)
    }

    pub fn min_path_len(&self) -> u32 {
        ((self.width + self.height) as f32 * self.min_path_ratio).floor() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maze {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    start: Pos,
    end: Pos,
    attempts: u32,
}

impl Maze {
    /// Every tile a wall; start and end at the default corners.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            tiles: vec![Tile::Wall; (width * height) as usize],
            start: (1, 1),
            end: (width.saturating_sub(2), height.saturating_sub(2)),
            attempts: 0,
        }
    }

    /// Builds a maze from rows of `#` (wall) and anything else (passage).
    pub fn from_rows(rows: &[&str], start: Pos, end: Pos) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut maze = Self::solid(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch != '#' {
                    maze.set((x as u32, y as u32), Tile::Passage);
                }
            }
        }
        maze.start = start;
        maze.end = end;
        maze
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn end(&self) -> Pos {
        self.end
    }

    /// Generation attempts spent to produce this maze.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn index(&self, (x, y): Pos) -> Option<usize> {
        (x < self.width && y < self.height).then(|| (y * self.width + x) as usize)
    }

    pub fn tile(&self, p: Pos) -> Tile {
        self.index(p).map_or(Tile::Wall, |i| self.tiles[i])
    }

    pub fn is_passage(&self, p: Pos) -> bool {
        self.tile(p) == Tile::Passage
    }

    fn set(&mut self, p: Pos, tile: Tile) {
        if let Some(i) = self.index(p) {
            self.tiles[i] = tile;
        }
    }

    fn is_interior(&self, (x, y): Pos) -> bool {
        x >= 1 && y >= 1 && x + 1 < self.width && y + 1 < self.height
    }

    pub fn step(&self, (x, y): Pos, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        (nx >= 0 && ny >= 0 && nx < self.width as i64 && ny < self.height as i64)
            .then_some((nx as u32, ny as u32))
    }

    pub fn passages(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.height)
            .flat_map(move |y| (0..self.width).map(move |x| (x, y)))
            .filter(move |&p| self.is_passage(p))
    }

    /// BFS distances over passages from `from`; `None` marks unreachable cells.
    pub fn distances(&self, from: Pos) -> Vec<Option<u32>> {
        let mut dist = vec![None; self.tiles.len()];
        let Some(i) = self.index(from).filter(|_| self.is_passage(from)) else {
            return dist;
        };
        dist[i] = Some(0);
        let mut queue = VecDeque::from([from]);
        while let Some(p) = queue.pop_front() {
            let d = self.index(p).and_then(|i| dist[i]).unwrap_or(0);
            for dir in Direction::ALL {
                let Some(n) = self.step(p, dir) else {
                    continue;
                };
                let Some(ni) = self.index(n) else {
                    continue;
                };
                if self.tiles[ni] == Tile::Passage && dist[ni].is_none() {
                    dist[ni] = Some(d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    pub fn shortest_path_len(&self, from: Pos, to: Pos) -> Option<u32> {
        let dist = self.distances(from);
        self.index(to).and_then(|i| dist[i])
    }

    /// Opens the cheapest set of interior walls joining `start` to `end` (0/1 BFS, walls cost 1).
    /// Returns how many walls were opened.
    pub fn ensure_path(&mut self) -> u32 {
        let (start, end) = (self.start, self.end);
        self.set(start, Tile::Passage);
        self.set(end, Tile::Passage);
        if self.shortest_path_len(start, end).is_some() {
            return 0;
        }
        let n = self.tiles.len();
        let mut cost = vec![u32::MAX; n];
        let mut prev: Vec<Option<Pos>> = vec![None; n];
        let Some(si) = self.index(start) else {
            return 0;
        };
        cost[si] = 0;
        let mut deque = VecDeque::from([start]);
        while let Some(p) = deque.pop_front() {
            let Some(pi) = self.index(p) else {
                continue;
            };
            for dir in Direction::ALL {
                let Some(q) = self.step(p, dir).filter(|&q| self.is_interior(q)) else {
                    continue;
                };
                let Some(qi) = self.index(q) else {
                    continue;
                };
                let w = u32::from(self.tiles[qi] == Tile::Wall);
                if cost[pi] + w < cost[qi] {
                    cost[qi] = cost[pi] + w;
                    prev[qi] = Some(p);
                    if w == 0 {
                        deque.push_front(q);
                    } else {
                        deque.push_back(q);
                    }
                }
            }
        }
        let mut opened = 0;
        let mut cursor = Some(end);
        while let Some(p) = cursor {
            if !self.is_passage(p) {
                self.set(p, Tile::Passage);
                opened += 1;
            }
            cursor = self.index(p).and_then(|i| prev[i]);
        }
        opened
    }

    /// Straight-line carve used by the builders: opens `a`, the wall between, and `b`.
    fn open_between(&mut self, a: Pos, b: Pos) {
        let mid = ((a.0 + b.0) / 2, (a.1 + b.1) / 2);
        self.set(a, Tile::Passage);
        self.set(mid, Tile::Passage);
        self.set(b, Tile::Passage);
    }
}

/// Cells of the carving lattice live on odd coordinates; steps move two tiles.
struct Lattice {
    cols: u32,
    rows: u32,
}

impl Lattice {
    fn for_maze(maze: &Maze) -> Self {
        Self {
            cols: (maze.width - 1) / 2,
            rows: (maze.height - 1) / 2,
        }
    }

    fn contains(&self, (x, y): Pos) -> bool {
        x % 2 == 1 && y % 2 == 1 && (x - 1) / 2 < self.cols && (y - 1) / 2 < self.rows
    }

    fn cells(&self) -> impl Iterator<Item = Pos> + use<> {
        let (cols, rows) = (self.cols, self.rows);
        (0..rows).flat_map(move |j| (0..cols).map(move |i| (2 * i + 1, 2 * j + 1)))
    }

    fn neighbor(&self, (x, y): Pos, dir: Direction) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = x as i64 + 2 * dx as i64;
        let ny = y as i64 + 2 * dy as i64;
        if nx < 0 || ny < 0 {
            return None;
        }
        let n = (nx as u32, ny as u32);
        self.contains(n).then_some(n)
    }
}

fn carve_backtracker(maze: &mut Maze, rng: &mut StdRng, visited: &mut HashSet<Pos>, root: Pos) {
    visited.insert(root);
    maze.set(root, Tile::Passage);
    let lattice = Lattice::for_maze(maze);
    let mut stack = vec![root];
    while let Some(&cur) = stack.last() {
        let options: Vec<Pos> = Direction::ALL
            .iter()
            .filter_map(|&d| lattice.neighbor(cur, d))
            .filter(|n| !visited.contains(n))
            .collect();
        match options.choose(rng) {
            Some(&next) => {
                visited.insert(next);
                maze.open_between(cur, next);
                stack.push(next);
            }
            None => {
                stack.pop();
            }
        }
    }
}

fn carve_growing_tree(
    maze: &mut Maze,
    rng: &mut StdRng,
    visited: &mut HashSet<Pos>,
    root: Pos,
    twistiness: f32,
) {
    let bias_straight = f64::from((1.0 - twistiness).clamp(0.0, 1.0));
    let lattice = Lattice::for_maze(maze);
    visited.insert(root);
    maze.set(root, Tile::Passage);
    let mut active: Vec<(Pos, Option<Direction>)> = vec![(root, None)];
    while !active.is_empty() {
        let idx = if rng.random_bool(NEWEST_CELL_BIAS) {
            active.len() - 1
        } else {
            rng.random_range(0..active.len())
        };
        let (cur, last_dir) = active[idx];
        let options: Vec<(Direction, Pos)> = Direction::ALL
            .iter()
            .filter_map(|&d| lattice.neighbor(cur, d).map(|n| (d, n)))
            .filter(|(_, n)| !visited.contains(n))
            .collect();
        if options.is_empty() {
            active.remove(idx);
            continue;
        }
        let straight = last_dir.and_then(|d| options.iter().find(|(od, _)| *od == d).copied());
        let pick = match straight {
            Some(choice) if rng.random_bool(bias_straight) => Some(choice),
            _ => options.choose(rng).copied(),
        };
        if let Some((dir, next)) = pick {
            visited.insert(next);
            maze.open_between(cur, next);
            active.push((next, Some(dir)));
        }
    }
}

/// Places odd-aligned rooms until about `room_rate` of the area is covered.
fn place_rooms(
    maze: &mut Maze,
    rng: &mut StdRng,
    visited: &mut HashSet<Pos>,
    room_rate: f32,
) -> Vec<(Pos, Pos)> {
    let area = (maze.width * maze.height) as f32;
    let budget = (area * room_rate.clamp(0.0, 0.6)) as u32;
    let lattice = Lattice::for_maze(maze);
    let mut rooms = Vec::new();
    let mut covered = 0;
    for _ in 0..60 {
        if covered >= budget {
            break;
        }
        let w = *[5u32, 7, 9].choose(rng).unwrap_or(&5);
        let h = *[5u32, 7, 9].choose(rng).unwrap_or(&5);
        if w + 2 > maze.width || h + 2 > maze.height {
            continue;
        }
        let max_i = (maze.width - w - 1) / 2;
        let max_j = (maze.height - h - 1) / 2;
        if max_i == 0 || max_j == 0 {
            continue;
        }
        let x0 = 2 * rng.random_range(0..max_i) + 1;
        let y0 = 2 * rng.random_range(0..max_j) + 1;
        let (x1, y1) = (x0 + w - 1, y0 + h - 1);
        let clear = (y0.saturating_sub(1)..=y1 + 1)
            .all(|y| (x0.saturating_sub(1)..=x1 + 1).all(|x| !maze.is_passage((x, y))));
        if !clear || x1 + 1 >= maze.width || y1 + 1 >= maze.height {
            continue;
        }
        for y in y0..=y1 {
            for x in x0..=x1 {
                maze.set((x, y), Tile::Passage);
                if lattice.contains((x, y)) {
                    visited.insert((x, y));
                }
            }
        }
        covered += w * h;
        rooms.push(((x0, y0), (x1, y1)));
    }
    rooms
}

/// Opens one door from each room onto a neighbouring corridor cell.
fn connect_rooms(maze: &mut Maze, rng: &mut StdRng, rooms: &[(Pos, Pos)]) {
    for &((x0, y0), (x1, y1)) in rooms {
        let mut doors = Vec::new();
        for x in (x0..=x1).filter(|x| x % 2 == 1) {
            if y0 >= 2 {
                doors.push(((x, y0 - 1), (x, y0 - 2)));
            }
            doors.push(((x, y1 + 1), (x, y1 + 2)));
        }
        for y in (y0..=y1).filter(|y| y % 2 == 1) {
            if x0 >= 2 {
                doors.push(((x0 - 1, y), (x0 - 2, y)));
            }
            doors.push(((x1 + 1, y), (x1 + 2, y)));
        }
        doors.retain(|&(wall, beyond)| maze.is_interior(wall) && maze.is_passage(beyond));
        if let Some(&(wall, _)) = doors.choose(rng) {
            maze.set(wall, Tile::Passage);
        }
    }
}

fn add_loops(maze: &mut Maze, rng: &mut StdRng, loop_rate: f32) {
    if loop_rate <= 0.0 {
        return;
    }
    let mut candidates = Vec::new();
    for y in 1..maze.height - 1 {
        for x in 1..maze.width - 1 {
            if maze.is_passage((x, y)) {
                continue;
            }
            let horizontal = maze.is_passage((x - 1, y)) && maze.is_passage((x + 1, y));
            let vertical = maze.is_passage((x, y - 1)) && maze.is_passage((x, y + 1));
            if horizontal != vertical {
                candidates.push((x, y));
            }
        }
    }
    candidates.shuffle(rng);
    let take = (candidates.len() as f32 * loop_rate.clamp(0.0, 1.0)).ceil() as usize;
    for &p in candidates.iter().take(take) {
        maze.set(p, Tile::Passage);
    }
}

fn carve_once(params: &MazeParams, rng: &mut StdRng) -> Maze {
    let mut maze = Maze::solid(params.width, params.height);
    let mut visited = HashSet::new();
    let rooms = if params.style == MazeStyle::WithRooms {
        place_rooms(&mut maze, rng, &mut visited, params.room_rate)
    } else {
        Vec::new()
    };

    let lattice = Lattice::for_maze(&maze);
    for root in lattice.cells() {
        if visited.contains(&root) {
            continue;
        }
        // Later trees join the forest through any already carved neighbour.
        let joined: Vec<Pos> = Direction::ALL
            .iter()
            .filter_map(|&d| lattice.neighbor(root, d))
            .filter(|n| visited.contains(n))
            .collect();
        match params.style {
            MazeStyle::Standard | MazeStyle::WithLoops => {
                carve_backtracker(&mut maze, rng, &mut visited, root)
            }
            MazeStyle::LongCorridor | MazeStyle::WithRooms => {
                carve_growing_tree(&mut maze, rng, &mut visited, root, params.twistiness)
            }
        }
        if let Some(&n) = joined.choose(rng) {
            maze.open_between(root, n);
        }
    }

    connect_rooms(&mut maze, rng, &rooms);
    add_loops(&mut maze, rng, params.loop_rate);
    maze
}

fn choose_spawn(maze: &mut Maze, rng: &mut StdRng) {
    let cells: Vec<Pos> = maze.passages().collect();
    let Some(&start) = cells.choose(rng) else {
        return;
    };
    let dist = maze.distances(start);
    let end = cells
        .iter()
        .copied()
        .max_by_key(|&p| maze.index(p).and_then(|i| dist[i]).unwrap_or(0))
        .unwrap_or(start);
    maze.start = start;
    maze.end = end;
}

/// Generates a maze, retrying up to `MAX_ATTEMPTS` times until the start-to-end path is at
/// least `params.min_path_len()` long. The longest attempt is kept if none qualifies.
pub fn generate(params: &MazeParams, seed: u64) -> Maze {
    let mut rng = StdRng::seed_from_u64(seed);
    let min_len = params.min_path_len();
    let mut best: Option<(u32, Maze)> = None;
    for attempt in 1..=MAX_ATTEMPTS {
        let mut maze = carve_once(params, &mut rng);
        if params.random_spawn {
            choose_spawn(&mut maze, &mut rng);
        }
        let opened = maze.ensure_path();
        let len = maze.shortest_path_len(maze.start, maze.end).unwrap_or(0);
        maze.attempts = attempt;
        debug!(
            "maze attempt {attempt}: {}x{} {:?} path {len} (min {min_len}, forced {opened})",
            params.width, params.height, params.style
        );
        if len >= min_len {
            return maze;
        }
        if best.as_ref().is_none_or(|(l, _)| len > *l) {
            best = Some((len, maze));
        }
    }
    match best {
        Some((_, mut maze)) => {
            maze.attempts = MAX_ATTEMPTS;
            maze
        }
        None => Maze::solid(params.width, params.height),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Playing,
    Won,
    Lost,
}

/// One attempt at a maze: player position, fog and the level clock.
#[derive(Debug, Clone)]
pub struct MazeRun {
    maze: Maze,
    player: Pos,
    vision_radius: Option<f32>,
    explored: HashSet<Pos>,
    timer: RoundTimer,
    state: RunState,
    steps: u32,
}

impl MazeRun {
    pub fn new(maze: Maze, vision: bool, time_limit: Duration) -> Self {
        let mut run = Self {
            player: maze.start,
            maze,
            vision_radius: vision.then_some(DEFAULT_VISION_RADIUS),
            explored: HashSet::new(),
            timer: RoundTimer::new(time_limit),
            state: RunState::Playing,
            steps: 0,
        };
        run.refresh_fog();
        run
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> Pos {
        self.player
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    pub fn vision_enabled(&self) -> bool {
        self.vision_radius.is_some()
    }

    pub fn explored(&self) -> &HashSet<Pos> {
        &self.explored
    }

    /// Whether a tile is drawn; everything is visible without fog.
    pub fn is_visible(&self, p: Pos) -> bool {
        self.vision_radius.is_none() || self.explored.contains(&p)
    }

    /// The lit disk around the player plus the exit. Cells that fall out of the disk go dark again.
    fn refresh_fog(&mut self) {
        let Some(radius) = self.vision_radius else {
            return;
        };
        self.explored.clear();
        let r2 = radius * radius;
        let reach = radius.ceil() as i64;
        let (px, py) = (self.player.0 as i64, self.player.1 as i64);
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let (x, y) = (px + dx, py + dy);
                if x < 0 || y < 0 || x >= self.maze.width as i64 || y >= self.maze.height as i64 {
                    continue;
                }
                if (dx * dx + dy * dy) as f32 <= r2 {
                    self.explored.insert((x as u32, y as u32));
                }
            }
        }
        self.explored.insert(self.maze.end);
    }

    pub fn try_move(&mut self, dir: Direction) -> bool {
        if self.state != RunState::Playing {
            return false;
        }
        let Some(next) = self.maze.step(self.player, dir) else {
            return false;
        };
        if !self.maze.is_passage(next) {
            return false;
        }
        self.player = next;
        self.steps += 1;
        self.refresh_fog();
        if next == self.maze.end {
            self.state = RunState::Won;
        }
        true
    }

    pub fn update(&mut self, dt: Duration) {
        if self.state != RunState::Playing {
            return;
        }
        self.timer.tick_if_running(dt, true);
        if self.timer.is_up() {
            self.state = RunState::Lost;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_maze_is_perfect() {
        let maze = generate(&MazeParams::new(21, 21, MazeStyle::Standard), 3);
        let passages = maze.passages().count() as u32;
        let mut edges = 0;
        for p in maze.passages() {
            for dir in [Direction::Right, Direction::Down] {
                if maze.step(p, dir).is_some_and(|n| maze.is_passage(n)) {
                    edges += 1;
                }
            }
        }
        // A spanning tree over passage tiles has exactly one fewer edge than nodes.
        assert_eq!(edges + 1, passages);
    }

    #[test]
    fn border_stays_wall() {
        for style in MazeStyle::ALL {
            let maze = generate(&MazeParams::new(27, 27, style), 9);
            for x in 0..maze.width() {
                assert_eq!(maze.tile((x, 0)), Tile::Wall);
                assert_eq!(maze.tile((x, maze.height() - 1)), Tile::Wall);
            }
            for y in 0..maze.height() {
                assert_eq!(maze.tile((0, y)), Tile::Wall);
                assert_eq!(maze.tile((maze.width() - 1, y)), Tile::Wall);
            }
        }
    }

    #[test]
    fn ensure_path_opens_the_cheapest_walls() {
        let mut maze = Maze::from_rows(
            &["#######", "#..#..#", "#######", "#######"],
            (1, 1),
            (5, 1),
        );
        assert_eq!(maze.shortest_path_len((1, 1), (5, 1)), None);
        assert_eq!(maze.ensure_path(), 1);
        assert_eq!(maze.shortest_path_len((1, 1), (5, 1)), Some(4));
    }

    #[test]
    fn fog_forgets_cells_left_behind() {
        let maze = Maze::from_rows(
            &["#########", "#.......#", "#########"],
            (1, 1),
            (7, 1),
        );
        let mut run = MazeRun::new(maze, true, Duration::from_secs(10));
        assert!(run.explored().contains(&(3, 1)));
        assert!(!run.explored().contains(&(4, 1)));
        assert!(run.try_move(Direction::Right));
        assert!(run.try_move(Direction::Right));
        assert!(run.try_move(Direction::Right));
        assert!(!run.explored().contains(&(1, 1)));
        assert!(run.explored().contains(&(7, 1)));
    }

    #[test]
    fn time_limit_ends_the_run() {
        let maze = Maze::from_rows(&["#####", "#...#", "#####"], (1, 1), (3, 1));
        let mut run = MazeRun::new(maze, false, Duration::from_secs(2));
        run.update(Duration::from_millis(1500));
        assert_eq!(run.state(), RunState::Playing);
        run.update(Duration::from_millis(600));
        assert_eq!(run.state(), RunState::Lost);
        assert!(!run.try_move(Direction::Right));
    }
}

use std::time::Duration;

use engine::graphics::{Color, Renderer2d, TextStyle};
use engine::input::{Direction, InputEvent, Key, KeyRepeat};
use engine::scene::{Scene, SceneResult};
use engine::ui::{Insets, Rect};
use log::info;

use crate::env::ArcadeEnv;
use crate::maze_core::{self, MazeParams, MazeRun, MazeStyle, RunState, TIERS, Tier, Tile};
use crate::profile::Rank;
use crate::round_timer::format_mm_ss;
use crate::sfx::Sound;
use crate::ui_kit::{self, GridLayout, MenuInput, MenuList};

const FIRST_MOVE_DELAY: Duration = Duration::from_millis(300);
const MOVE_DELAY: Duration = Duration::from_millis(150);
const MAX_CELL_PX: u32 = 28;

const COLOR_WALL: Color = [60, 64, 90, 255];
const COLOR_FLOOR: Color = [210, 205, 190, 255];
const COLOR_FOG: Color = [0, 0, 0, 255];
const COLOR_PLAYER: Color = [230, 90, 60, 255];
const COLOR_EXIT: Color = [70, 190, 110, 255];

const MENU_STYLE: usize = TIERS.len();
const MENU_VISION: usize = TIERS.len() + 1;
const MENU_SPAWN: usize = TIERS.len() + 2;
const MENU_BACK: usize = TIERS.len() + 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Menu,
    Playing,
}

pub struct MazeScene {
    active: bool,
    phase: Phase,
    menu: MenuList,
    style: MazeStyle,
    vision: bool,
    random_spawn: bool,
    tier: Tier,
    run: Option<MazeRun>,
    repeat: KeyRepeat<Direction>,
    new_best: bool,
    result: Option<SceneResult>,
}

impl MazeScene {
    pub fn new(env: &mut ArcadeEnv) -> Self {
        let gameplay = env.gameplay();
        let mut items: Vec<String> = TIERS
            .iter()
            .map(|t| {
                format!(
                    "LEVEL {}  {}X{}  {}S",
                    t.level, t.width, t.height, t.time_limit_secs
                )
            })
            .collect();
        items.extend(["".into(), "".into(), "".into(), "BACK".into()]);
        let mut scene = Self {
            active: true,
            phase: Phase::Menu,
            menu: MenuList::new(items),
            style: MazeStyle::Standard,
            vision: gameplay.maze_vision,
            random_spawn: gameplay.maze_random_spawn,
            tier: TIERS[0],
            run: None,
            repeat: KeyRepeat::new(FIRST_MOVE_DELAY, MOVE_DELAY),
            new_best: false,
            result: None,
        };
        scene.refresh_labels();
        scene
    }

    pub fn run(&self) -> Option<&MazeRun> {
        self.run.as_ref()
    }

    pub fn is_in_menu(&self) -> bool {
        self.phase == Phase::Menu
    }

    fn refresh_labels(&mut self) {
        let on_off = |b: bool| if b { "ON" } else { "OFF" };
        self.menu
            .set_label(MENU_STYLE, format!("STYLE: {}", self.style.label()));
        self.menu
            .set_label(MENU_VISION, format!("VISION: {}", on_off(self.vision)));
        self.menu.set_label(
            MENU_SPAWN,
            format!("RANDOM SPAWN: {}", on_off(self.random_spawn)),
        );
    }

    /// Generates a fresh maze for `tier` and starts its clock.
    pub fn start(&mut self, tier: Tier, env: &mut ArcadeEnv) {
        let mut params = MazeParams::for_tier(&tier, self.style);
        params.random_spawn = self.random_spawn;
        let maze = maze_core::generate(&params, env.next_seed());
        info!(
            "maze level {} ready after {} attempt(s)",
            tier.level,
            maze.attempts()
        );
        self.tier = tier;
        self.run = Some(MazeRun::new(maze, self.vision, tier.time_limit()));
        self.repeat.clear();
        self.new_best = false;
        self.phase = Phase::Playing;
    }

    fn step(&mut self, dir: Direction, env: &mut ArcadeEnv) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if !run.try_move(dir) {
            return;
        }
        env.play_sound(Sound::Move);
        if run.state() == RunState::Won {
            self.finish_won(env);
        }
    }

    fn finish_won(&mut self, env: &mut ArcadeEnv) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        let elapsed = run.timer().elapsed();
        let profile = env.profile_mut();
        profile.add_coins(self.tier.coin_reward());
        self.new_best = profile.record_best(
            &self.tier.best_key(),
            elapsed.as_millis() as i64,
            Rank::LowerIsBetter,
        );
        env.play_sound(Sound::Win);
        self.repeat.clear();
        self.result = Some(SceneResult::new(
            format!("MAZE LEVEL {} IN {}", self.tier.level, format_mm_ss(elapsed)),
            Some(elapsed.as_secs() as i64),
        ));
    }

    fn handle_menu(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        if event.is_escape() {
            self.active = false;
            return;
        }
        let area = ui_kit::body_rect(env.surface_size());
        let MenuInput::Activated(i) = self.menu.handle(event, area) else {
            return;
        };
        env.play_sound(Sound::Click);
        match i {
            i if i < TIERS.len() => self.start(TIERS[i], env),
            MENU_STYLE => self.style = self.style.next(),
            MENU_VISION => {
                self.vision = !self.vision;
                let vision = self.vision;
                env.set_gameplay(|g| g.maze_vision = vision);
            }
            MENU_SPAWN => {
                self.random_spawn = !self.random_spawn;
                let random_spawn = self.random_spawn;
                env.set_gameplay(|g| g.maze_random_spawn = random_spawn);
            }
            MENU_BACK => self.active = false,
            _ => {}
        }
        self.refresh_labels();
    }

    fn handle_playing(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        let finished = self
            .run
            .as_ref()
            .is_none_or(|r| r.state() != RunState::Playing);
        match event {
            InputEvent::KeyDown { key: Key::Escape } => {
                self.repeat.clear();
                self.phase = Phase::Menu;
            }
            InputEvent::KeyDown { key: Key::Enter } if finished => self.start(self.tier, env),
            InputEvent::KeyDown { key } => {
                if let Some(dir) = Direction::from_key(*key) {
                    if self.repeat.on_press(dir) {
                        self.step(dir, env);
                    }
                }
            }
            InputEvent::KeyUp { key } => {
                if let Some(dir) = Direction::from_key(*key) {
                    self.repeat.on_release(dir);
                }
            }
            _ => {}
        }
    }

    fn layout(&self, run: &MazeRun, area: Rect) -> GridLayout {
        let area = area.inset(Insets {
            left: 12,
            right: 12,
            top: 36,
            bottom: 36,
        });
        GridLayout::fit(area, run.maze().width(), run.maze().height(), MAX_CELL_PX)
    }

    fn draw_run(&self, gfx: &mut dyn Renderer2d, run: &MazeRun) {
        let body = ui_kit::body_rect(gfx.size());
        let layout = self.layout(run, body);
        let maze = run.maze();
        for y in 0..maze.height() {
            for x in 0..maze.width() {
                let color = if !run.is_visible((x, y)) {
                    COLOR_FOG
                } else if maze.tile((x, y)) == Tile::Wall {
                    COLOR_WALL
                } else {
                    COLOR_FLOOR
                };
                gfx.fill_rect(layout.cell_rect(x, y), color);
            }
        }
        let (ex, ey) = maze.end();
        gfx.fill_rect(
            layout.cell_rect(ex, ey).inset(Insets::all(layout.cell / 6)),
            COLOR_EXIT,
        );
        let (px, py) = run.player();
        let cell = layout.cell_rect(px, py);
        gfx.fill_circle(cell.center(), (layout.cell * 2 / 5).max(1), COLOR_PLAYER);

        let status = format!(
            "LEVEL {}   {}   LEFT {}S",
            self.tier.level,
            self.style.label(),
            run.timer().remaining_secs_ceil()
        );
        ui_kit::text_centered(
            gfx,
            Rect::new(body.x, body.y + 6, body.w, 24),
            &status,
            TextStyle::body(ui_kit::TEXT_BODY, ui_kit::COLOR_TEXT),
        );
    }
}

impl Scene<ArcadeEnv> for MazeScene {
    fn name(&self) -> &str {
        "maze"
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut ArcadeEnv) {
        match self.phase {
            Phase::Menu => self.handle_menu(event, env),
            Phase::Playing => self.handle_playing(event, env),
        }
    }

    fn update(&mut self, dt: Duration, env: &mut ArcadeEnv) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some((dir, count)) = self.repeat.tick(dt) {
            for _ in 0..count {
                self.step(dir, env);
            }
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let was_playing = run.state() == RunState::Playing;
        run.update(dt);
        if was_playing && run.state() == RunState::Lost {
            self.repeat.clear();
            env.play_sound(Sound::Lose);
            self.result = Some(SceneResult::new(
                format!("MAZE LEVEL {} TIMED OUT", self.tier.level),
                None,
            ));
        }
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, env: &ArcadeEnv) {
        gfx.clear(ui_kit::COLOR_BG);
        ui_kit::header(gfx, "MAZE", env.profile().get_coins());
        match (self.phase, self.run.as_ref()) {
            (Phase::Playing, Some(run)) => {
                self.draw_run(gfx, run);
                ui_kit::footer_hint(gfx, "ARROWS/WASD: MOVE   ESC: MENU");
                match run.state() {
                    RunState::Won => {
                        let mut lines = vec![format!("TIME {}", format_mm_ss(run.timer().elapsed()))];
                        lines.push(format!("COINS +{}", self.tier.coin_reward()));
                        if self.new_best {
                            lines.push("NEW BEST TIME".into());
                        }
                        ui_kit::result_card(gfx, "ESCAPED", ui_kit::COLOR_GOOD, &lines);
                    }
                    RunState::Lost => {
                        let lines = vec![format!("STEPS {}", run.steps())];
                        ui_kit::result_card(gfx, "TIME UP", ui_kit::COLOR_BAD, &lines);
                    }
                    RunState::Playing => {}
                }
            }
            _ => {
                let body = ui_kit::body_rect(gfx.size());
                self.menu.draw(gfx, body);
                ui_kit::footer_hint(gfx, "ENTER: SELECT   ESC: BACK TO HUB");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn result(&self) -> Option<SceneResult> {
        self.result.clone()
    }
}

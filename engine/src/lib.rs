pub mod app;
pub mod clock;
pub mod graphics;
pub mod input;
pub mod pixels_renderer;
pub mod recording;
pub mod scene;
pub mod surface;
pub mod ui;

use std::time::Duration;

use graphics::{CpuRenderer, Renderer2d};
use input::InputEvent;
use surface::{RgbaBufferSurface, Surface, SurfaceSize};

/// LIFO history of prior states, used for one-step-at-a-time undo.
#[derive(Debug, Clone)]
pub struct UndoStack<State> {
    states: Vec<State>,
}

impl<State> Default for UndoStack<State> {
    fn default() -> Self {
        Self { states: Vec::new() }
    }
}

impl<State> UndoStack<State> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<State> {
        self.states.pop()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

/// A frame-driven application: the windowed loop and the headless runner both drive it.
pub trait FrameApp {
    fn handle_input(&mut self, event: InputEvent);
    fn update(&mut self, dt: Duration);
    fn render(&mut self, gfx: &mut dyn Renderer2d);

    fn resize(&mut self, _size: SurfaceSize) {}

    fn should_exit(&self) -> bool {
        false
    }
}

/// Drives a `FrameApp` without a window: events, then `update(dt)`, then a CPU render into an
/// in-memory surface. Every frame's digest is kept so tests can compare runs.
pub struct HeadlessRunner<A: FrameApp> {
    app: A,
    surface: RgbaBufferSurface,
    frame: usize,
    digests: Vec<String>,
}

impl<A: FrameApp> HeadlessRunner<A> {
    pub fn new(mut app: A, size: SurfaceSize) -> Self {
        app.resize(size);
        Self {
            app,
            surface: RgbaBufferSurface::new(size),
            frame: 0,
            digests: Vec::new(),
        }
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut A {
        &mut self.app
    }

    pub fn surface(&self) -> &RgbaBufferSurface {
        &self.surface
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn digests(&self) -> &[String] {
        &self.digests
    }

    pub fn resize(&mut self, size: SurfaceSize) {
        let Ok(()) = self.surface.resize(size);
        self.app.resize(size);
    }

    /// Runs one frame and returns its digest.
    pub fn step<I>(&mut self, events: I, dt: Duration) -> &str
    where
        I: IntoIterator<Item = InputEvent>,
    {
        for event in events {
            self.app.handle_input(event);
        }
        self.app.update(dt);

        let size = self.surface.size();
        {
            let mut gfx = CpuRenderer::new(self.surface.frame_mut(), size);
            gfx.begin_frame(size);
            self.app.render(&mut gfx);
        }
        let Ok(()) = self.surface.present();

        self.frame += 1;
        self.digests.push(self.surface.digest());
        self.digests.last().map(String::as_str).unwrap_or_default()
    }

    /// Runs `frames` frames with no input, stopping early if the app asks to exit.
    pub fn run_idle(&mut self, frames: usize, dt: Duration) -> usize {
        for _ in 0..frames {
            if self.app.should_exit() {
                break;
            }
            self.step(std::iter::empty(), dt);
        }
        self.frame
    }
}

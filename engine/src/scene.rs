//! Scene lifecycle and the single-child host.
//!
//! A root scene owns at most one child. The child never touches its parent: it flips
//! `is_active()` to false (or asks the environment to quit it) and the parent reaps it at the
//! next event or frame boundary, reading `result()` before the child is dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use log::{error, info};

use crate::graphics::Renderer2d;
use crate::input::InputEvent;

/// What a finished scene leaves behind for its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneResult {
    pub label: String,
    pub score: Option<i64>,
}

impl SceneResult {
    pub fn new(label: impl Into<String>, score: Option<i64>) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Services a scene may ask of whoever hosts it.
pub trait SceneEnv {
    /// Returns and clears a pending "close the current scene" request.
    fn take_quit_request(&mut self) -> bool;
}

pub trait Scene<E> {
    fn name(&self) -> &str;

    fn enter(&mut self, _env: &mut E) {}

    fn handle_event(&mut self, event: &InputEvent, env: &mut E);

    /// Called exactly once per frame with the frame's elapsed time.
    fn update(&mut self, dt: Duration, env: &mut E);

    /// Must be idempotent for a fixed state.
    fn draw(&self, gfx: &mut dyn Renderer2d, env: &E);

    fn exit(&mut self, _env: &mut E) {}

    fn is_active(&self) -> bool;

    fn result(&self) -> Option<SceneResult> {
        None
    }
}

/// How a child left the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildExit {
    Returned {
        scene: String,
        result: Option<SceneResult>,
    },
    Crashed {
        scene: String,
        message: String,
    },
}

impl ChildExit {
    pub fn result(&self) -> Option<&SceneResult> {
        match self {
            ChildExit::Returned { result, .. } => result.as_ref(),
            ChildExit::Crashed { .. } => None,
        }
    }

    pub fn crashed(&self) -> bool {
        matches!(self, ChildExit::Crashed { .. })
    }
}

/// Holds the optional child scene and enforces the fatal-error policy: a panic in any child
/// hook closes that child instead of unwinding into the root.
pub struct ChildSlot<E> {
    child: Option<Box<dyn Scene<E>>>,
    pending: Option<ChildExit>,
}

impl<E> Default for ChildSlot<E> {
    fn default() -> Self {
        Self {
            child: None,
            pending: None,
        }
    }
}

impl<E: SceneEnv> ChildSlot<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self) -> bool {
        self.child.is_some()
    }

    pub fn name(&self) -> Option<&str> {
        self.child.as_deref().map(|c| c.name())
    }

    /// Installs `scene` as the child, replacing (and exiting) any current one.
    pub fn install(&mut self, mut scene: Box<dyn Scene<E>>, env: &mut E) {
        if let Some(mut old) = self.child.take() {
            let name = old.name().to_string();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| old.exit(env))) {
                error!("scene '{name}' panicked in exit: {}", panic_message(&payload));
            }
        }
        self.pending = None;
        // Stale requests must not close the scene that is just starting.
        env.take_quit_request();

        let name = scene.name().to_string();
        match panic::catch_unwind(AssertUnwindSafe(|| scene.enter(env))) {
            Ok(()) => {
                info!("scene '{name}' entered");
                self.child = Some(scene);
            }
            Err(payload) => {
                let message = panic_message(&payload);
                error!("scene '{name}' panicked in enter: {message}; closing it");
                self.pending = Some(ChildExit::Crashed {
                    scene: name,
                    message,
                });
            }
        }
    }

    /// Forwards `event` to the child. Returns `false` when there is no child to take it.
    pub fn dispatch(&mut self, event: &InputEvent, env: &mut E) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        let res = panic::catch_unwind(AssertUnwindSafe(|| child.handle_event(event, env)));
        if let Err(payload) = res {
            self.crash("handle_event", payload, env);
        }
        true
    }

    pub fn update(&mut self, dt: Duration, env: &mut E) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        let res = panic::catch_unwind(AssertUnwindSafe(|| child.update(dt, env)));
        if let Err(payload) = res {
            self.crash("update", payload, env);
        }
        true
    }

    pub fn draw(&mut self, gfx: &mut dyn Renderer2d, env: &mut E) -> bool {
        let Some(child) = self.child.as_ref() else {
            return false;
        };
        let res = panic::catch_unwind(AssertUnwindSafe(|| child.draw(gfx, env)));
        if let Err(payload) = res {
            self.crash("draw", payload, env);
            return false;
        }
        true
    }

    /// Removes the child if it finished, asked to quit, or crashed, returning how it left.
    pub fn reap(&mut self, env: &mut E) -> Option<ChildExit> {
        if let Some(exit) = self.pending.take() {
            return Some(exit);
        }
        let quit_requested = env.take_quit_request();
        let finished = match self.child.as_ref() {
            Some(child) => quit_requested || !child.is_active(),
            None => false,
        };
        if !finished {
            return None;
        }
        self.close(env)
    }

    /// Exits the child unconditionally, e.g. when the parent itself is shutting down.
    /// A crash that has not been reaped yet is reported instead.
    pub fn close(&mut self, env: &mut E) -> Option<ChildExit> {
        if let Some(exit) = self.pending.take() {
            return Some(exit);
        }
        let mut child = self.child.take()?;
        let scene = child.name().to_string();
        let result = child.result();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| child.exit(env))) {
            let message = panic_message(&payload);
            error!("scene '{scene}' panicked in exit: {message}");
            return Some(ChildExit::Crashed { scene, message });
        }
        info!("scene '{scene}' closed");
        Some(ChildExit::Returned { scene, result })
    }

    fn crash(&mut self, hook: &str, payload: Box<dyn Any + Send>, env: &mut E) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let scene = child.name().to_string();
        let message = panic_message(&payload);
        error!("scene '{scene}' panicked in {hook}: {message}; closing it");
        // Best effort: the scene may be in a broken state, so a second panic is swallowed.
        let _ = panic::catch_unwind(AssertUnwindSafe(|| child.exit(env)));
        self.pending = Some(ChildExit::Crashed { scene, message });
    }
}

pub fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

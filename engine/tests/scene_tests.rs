use std::time::Duration;

use engine::graphics::{Renderer2d, TextStyle};
use engine::input::{InputEvent, Key};
use engine::recording::RecordingRenderer;
use engine::scene::{ChildExit, ChildSlot, Scene, SceneEnv, SceneResult};
use engine::surface::SurfaceSize;

#[derive(Default)]
struct TestEnv {
    quit: bool,
    log: Vec<String>,
}

impl SceneEnv for TestEnv {
    fn take_quit_request(&mut self) -> bool {
        std::mem::take(&mut self.quit)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Fault {
    None,
    OnEvent,
    OnUpdate,
    OnDraw,
}

struct Ticker {
    active: bool,
    fault: Fault,
    updates: u32,
}

impl Ticker {
    fn boxed(fault: Fault) -> Box<dyn Scene<TestEnv>> {
        Box::new(Ticker {
            active: true,
            fault,
            updates: 0,
        })
    }
}

impl Scene<TestEnv> for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    fn enter(&mut self, env: &mut TestEnv) {
        env.log.push("enter".into());
    }

    fn handle_event(&mut self, event: &InputEvent, env: &mut TestEnv) {
        if self.fault == Fault::OnEvent {
            panic!("event fault");
        }
        match event.key_down() {
            Some(Key::Escape) => self.active = false,
            Some(Key::Char('q')) => env.quit = true,
            _ => env.log.push("event".into()),
        }
    }

    fn update(&mut self, _dt: Duration, _env: &mut TestEnv) {
        if self.fault == Fault::OnUpdate {
            panic!("update fault");
        }
        self.updates += 1;
    }

    fn draw(&self, gfx: &mut dyn Renderer2d, _env: &TestEnv) {
        if self.fault == Fault::OnDraw {
            panic!("draw fault");
        }
        gfx.draw_text(0, 0, "TICKER", TextStyle::body(12, [255; 4]));
    }

    fn exit(&mut self, env: &mut TestEnv) {
        env.log.push("exit".into());
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn result(&self) -> Option<SceneResult> {
        Some(SceneResult::new("ticker", Some(self.updates as i64)))
    }
}

fn key(k: Key) -> InputEvent {
    InputEvent::KeyDown { key: k }
}

#[test]
fn inactive_child_is_reaped_with_its_result() {
    let mut env = TestEnv::default();
    let mut slot = ChildSlot::new();
    slot.install(Ticker::boxed(Fault::None), &mut env);
    assert!(slot.is_occupied());

    slot.update(Duration::from_millis(16), &mut env);
    slot.update(Duration::from_millis(16), &mut env);
    assert!(slot.reap(&mut env).is_none());

    assert!(slot.dispatch(&key(Key::Escape), &mut env));
    let exit = slot.reap(&mut env).unwrap();
    assert_eq!(
        exit,
        ChildExit::Returned {
            scene: "ticker".into(),
            result: Some(SceneResult::new("ticker", Some(2))),
        }
    );
    assert!(!slot.is_occupied());
    assert_eq!(env.log, vec!["enter", "exit"]);
}

#[test]
fn quit_request_from_env_closes_child() {
    let mut env = TestEnv::default();
    let mut slot = ChildSlot::new();
    slot.install(Ticker::boxed(Fault::None), &mut env);
    slot.dispatch(&key(Key::Char('q')), &mut env);
    assert!(matches!(slot.reap(&mut env), Some(ChildExit::Returned { .. })));
    assert!(!env.quit);
}

#[test]
fn stale_quit_request_does_not_close_new_child() {
    let mut env = TestEnv {
        quit: true,
        ..TestEnv::default()
    };
    let mut slot = ChildSlot::new();
    slot.install(Ticker::boxed(Fault::None), &mut env);
    assert!(slot.reap(&mut env).is_none());
    assert!(slot.is_occupied());
}

#[test]
fn panics_in_any_hook_close_the_child_without_unwinding() {
    for (fault, drive) in [
        (Fault::OnEvent, 0),
        (Fault::OnUpdate, 1),
        (Fault::OnDraw, 2),
    ] {
        let mut env = TestEnv::default();
        let mut slot = ChildSlot::new();
        slot.install(Ticker::boxed(fault), &mut env);
        match drive {
            0 => {
                slot.dispatch(&key(Key::Space), &mut env);
            }
            1 => {
                slot.update(Duration::from_millis(16), &mut env);
            }
            _ => {
                let mut gfx = RecordingRenderer::new(SurfaceSize::new(10, 10));
                assert!(!slot.draw(&mut gfx, &mut env));
            }
        }
        assert!(!slot.is_occupied());
        let exit = slot.reap(&mut env).unwrap();
        assert!(exit.crashed());
        assert!(exit.result().is_none());
        assert_eq!(env.log.last().map(String::as_str), Some("exit"));
    }
}

#[test]
fn empty_slot_does_not_consume_events() {
    let mut env = TestEnv::default();
    let mut slot: ChildSlot<TestEnv> = ChildSlot::new();
    assert!(!slot.dispatch(&key(Key::Space), &mut env));
    assert!(!slot.update(Duration::ZERO, &mut env));
    assert!(slot.reap(&mut env).is_none());
}

#[test]
fn close_exits_a_running_child_with_its_result() {
    let mut env = TestEnv::default();
    let mut slot = ChildSlot::new();
    slot.install(Ticker::boxed(Fault::None), &mut env);
    slot.update(Duration::from_millis(16), &mut env);
    assert!(slot.reap(&mut env).is_none());

    let exit = slot.close(&mut env).unwrap();
    assert_eq!(exit.result(), Some(&SceneResult::new("ticker", Some(1))));
    assert!(!slot.is_occupied());
    assert_eq!(env.log, vec!["enter", "exit"]);
    assert!(slot.close(&mut env).is_none());
}

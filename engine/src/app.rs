use std::time::{Duration, Instant};

use log::{info, warn};
use pixels::{Pixels, PixelsBuilder, SurfaceTexture};
use thiserror::Error;
pub use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton as WinitMouseButton, MouseScrollDelta,
    VirtualKeyCode, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::FrameApp;
use crate::clock::{FrameTimer, SystemClock};
use crate::input::{InputEvent, Key, MouseButton};
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create pixel surface: {0}")]
    Pixels(#[from] pixels::Error),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub vsync: Option<bool>,
    pub target_fps: u32,
}

impl AppConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.clamp(1, 1000) as f64)
    }
}

/// Opens a window and drives `app` at `config.target_fps` until it asks to exit or the window
/// is closed. Input events are forwarded in arrival order before each frame's update.
pub fn run_app<A: FrameApp + 'static>(config: AppConfig, mut app: A) -> Result<(), AppError> {
    let event_loop = EventLoop::new();
    let monitor_size = if config.clamp_to_monitor {
        event_loop.primary_monitor().map(|m| m.size())
    } else {
        None
    };
    let initial_size = if let Some(monitor) = monitor_size {
        PhysicalSize::new(
            config.desired_size.width.min(monitor.width),
            config.desired_size.height.min(monitor.height),
        )
    } else {
        config.desired_size
    };
    let window = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width.max(1), window_size.height.max(1));

    let build_pixels = |vsync: Option<bool>| -> Result<Pixels, pixels::Error> {
        let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
        let mut builder =
            PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture);
        if let Some(vsync) = vsync {
            builder = builder.enable_vsync(vsync);
        }
        builder.build()
    };

    let pixels = if config.vsync.is_some() {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| build_pixels(config.vsync))) {
            Ok(res) => res?,
            Err(_) => {
                warn!("requested vsync mode was not supported; falling back to the default");
                build_pixels(None)?
            }
        }
    } else {
        build_pixels(None)?
    };

    let mut renderer = PixelsRenderer2d::new(pixels, surface_size)?;
    app.resize(surface_size);
    info!(
        "window opened at {}x{} ({} fps target)",
        surface_size.width, surface_size.height, config.target_fps
    );

    let clock = SystemClock::new();
    let mut frame_timer = FrameTimer::new(Duration::from_millis(250));
    let frame_interval = config.frame_interval();
    let mut next_frame = Instant::now();
    let mut cursor = (0i32, 0i32);

    event_loop.run(move |event, _, control_flow| {
        if app.should_exit() {
            *control_flow = ControlFlow::Exit;
            return;
        }

        match &event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    app.handle_input(InputEvent::Quit);
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    let size = SurfaceSize::new(size.width, size.height);
                    if let Err(err) = renderer.resize(size) {
                        warn!("resize failed: {err}");
                    }
                    app.resize(renderer.size());
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    cursor = (position.x as i32, position.y as i32);
                    app.handle_input(InputEvent::MouseMove { pos: cursor });
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(button) = map_mouse_button(*button) {
                        app.handle_input(match state {
                            ElementState::Pressed => InputEvent::MouseDown { button, pos: cursor },
                            ElementState::Released => InputEvent::MouseUp { button, pos: cursor },
                        });
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let dy = match delta {
                        MouseScrollDelta::LineDelta(_, y) => *y,
                        MouseScrollDelta::PixelDelta(pos) => (pos.y / 40.0) as f32,
                    };
                    if dy != 0.0 {
                        app.handle_input(InputEvent::Wheel { dy });
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            virtual_keycode: Some(code),
                            state,
                            ..
                        },
                    ..
                } => {
                    let key = map_key(*code);
                    app.handle_input(match state {
                        ElementState::Pressed => InputEvent::KeyDown { key },
                        ElementState::Released => InputEvent::KeyUp { key },
                    });
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                let dt = frame_timer.tick(&clock);
                app.update(dt);
                renderer.draw_frame(|gfx| app.render(gfx));
                if let Err(err) = renderer.present() {
                    warn!("present failed: {err}");
                }
                if app.should_exit() {
                    *control_flow = ControlFlow::Exit;
                }
            }
            Event::MainEventsCleared => {
                let now = Instant::now();
                if now >= next_frame {
                    next_frame = now + frame_interval;
                    window.request_redraw();
                }
                if !matches!(*control_flow, ControlFlow::Exit) {
                    *control_flow = ControlFlow::WaitUntil(next_frame);
                }
            }
            _ => {}
        }
    });
}

fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::Left),
        WinitMouseButton::Right => Some(MouseButton::Right),
        WinitMouseButton::Middle => Some(MouseButton::Middle),
        WinitMouseButton::Other(_) => None,
    }
}

fn map_key(code: VirtualKeyCode) -> Key {
    use VirtualKeyCode as K;
    match code {
        K::Up => Key::Up,
        K::Down => Key::Down,
        K::Left => Key::Left,
        K::Right => Key::Right,
        K::Home => Key::Home,
        K::End => Key::End,
        K::PageUp => Key::PageUp,
        K::PageDown => Key::PageDown,
        K::Return | K::NumpadEnter => Key::Enter,
        K::Escape => Key::Escape,
        K::Space => Key::Space,
        K::Back => Key::Backspace,
        K::Delete => Key::Delete,
        K::Tab => Key::Tab,
        K::Key0 | K::Numpad0 => Key::Digit(0),
        K::Key1 | K::Numpad1 => Key::Digit(1),
        K::Key2 | K::Numpad2 => Key::Digit(2),
        K::Key3 | K::Numpad3 => Key::Digit(3),
        K::Key4 | K::Numpad4 => Key::Digit(4),
        K::Key5 | K::Numpad5 => Key::Digit(5),
        K::Key6 | K::Numpad6 => Key::Digit(6),
        K::Key7 | K::Numpad7 => Key::Digit(7),
        K::Key8 | K::Numpad8 => Key::Digit(8),
        K::Key9 | K::Numpad9 => Key::Digit(9),
        K::A => Key::Char('a'),
        K::B => Key::Char('b'),
        K::C => Key::Char('c'),
        K::D => Key::Char('d'),
        K::E => Key::Char('e'),
        K::F => Key::Char('f'),
        K::G => Key::Char('g'),
        K::H => Key::Char('h'),
        K::I => Key::Char('i'),
        K::J => Key::Char('j'),
        K::K => Key::Char('k'),
        K::L => Key::Char('l'),
        K::M => Key::Char('m'),
        K::N => Key::Char('n'),
        K::O => Key::Char('o'),
        K::P => Key::Char('p'),
        K::Q => Key::Char('q'),
        K::R => Key::Char('r'),
        K::S => Key::Char('s'),
        K::T => Key::Char('t'),
        K::U => Key::Char('u'),
        K::V => Key::Char('v'),
        K::W => Key::Char('w'),
        K::X => Key::Char('x'),
        K::Y => Key::Char('y'),
        K::Z => Key::Char('z'),
        K::Plus | K::NumpadAdd => Key::Char('+'),
        K::Equals => Key::Char('='),
        K::Minus | K::NumpadSubtract => Key::Char('-'),
        K::Asterisk | K::NumpadMultiply => Key::Char('*'),
        K::Slash | K::NumpadDivide => Key::Char('/'),
        _ => Key::Other,
    }
}

//! Normalized input events and timer-driven key repeat.
//!
//! Hosts translate their native events into `InputEvent`; everything downstream of the host
//! (scene routing, gameplay, tests) only sees this enum.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Space,
    Backspace,
    Delete,
    Tab,
    Char(char),
    Digit(u8),
    Other,
}

impl Key {
    /// Letter keys normalized to lowercase so `Char('W')` and `Char('w')` compare equal.
    pub fn letter(c: char) -> Self {
        Key::Char(c.to_ascii_lowercase())
    }

    pub fn is_char(self, c: char) -> bool {
        matches!(self, Key::Char(k) if k == c.to_ascii_lowercase())
    }

    /// Digit keys 0..=9, from either the digit row or a `Char` carrying one.
    pub fn digit(self) -> Option<u8> {
        match self {
            Key::Digit(d) if d <= 9 => Some(d),
            Key::Char(c) => c.to_digit(10).map(|d| d as u8),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: Key },
    KeyUp { key: Key },
    MouseDown { button: MouseButton, pos: (i32, i32) },
    MouseMove { pos: (i32, i32) },
    MouseUp { button: MouseButton, pos: (i32, i32) },
    /// Positive is "scroll up" (content moves down).
    Wheel { dy: f32 },
    Quit,
}

impl InputEvent {
    pub fn key_down(&self) -> Option<Key> {
        match self {
            InputEvent::KeyDown { key } => Some(*key),
            _ => None,
        }
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, InputEvent::KeyDown { key: Key::Escape })
    }

    pub fn left_click(&self) -> Option<(i32, i32)> {
        match self {
            InputEvent::MouseDown {
                button: MouseButton::Left,
                pos,
            } => Some(*pos),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    /// Arrow keys and WASD are equivalent.
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Up | Key::Char('w') => Some(Direction::Up),
            Key::Down | Key::Char('s') => Some(Direction::Down),
            Key::Left | Key::Char('a') => Some(Direction::Left),
            Key::Right | Key::Char('d') => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Held-key auto repeat driven by frame `dt`, not by the OS key-repeat.
///
/// A first press fires immediately (the caller acts on `on_press` returning `true`); while the
/// key stays held, `tick` yields repeats after `first_delay` and then every `interval`. Pressing
/// a second key takes over; releasing it falls back to the one still held.
#[derive(Debug, Clone)]
pub struct KeyRepeat<T: Copy + PartialEq> {
    first_delay: Duration,
    interval: Duration,
    held: Vec<T>,
    until_next: Duration,
}

impl<T: Copy + PartialEq> KeyRepeat<T> {
    pub fn new(first_delay: Duration, interval: Duration) -> Self {
        Self {
            first_delay,
            interval,
            held: Vec::new(),
            until_next: Duration::ZERO,
        }
    }

    pub fn clear(&mut self) {
        self.held.clear();
        self.until_next = Duration::ZERO;
    }

    pub fn active(&self) -> Option<T> {
        self.held.last().copied()
    }

    /// Returns `false` for OS repeats of a key already held.
    pub fn on_press(&mut self, action: T) -> bool {
        if self.held.contains(&action) {
            return false;
        }
        self.held.push(action);
        self.until_next = self.first_delay;
        true
    }

    pub fn on_release(&mut self, action: T) {
        let was_active = self.active() == Some(action);
        self.held.retain(|held| *held != action);
        if was_active && !self.held.is_empty() {
            self.until_next = self.first_delay;
        }
    }

    /// Advances the repeat timer; returns how many repeats of the active action are due.
    pub fn tick(&mut self, dt: Duration) -> Option<(T, u32)> {
        let action = self.active()?;
        if dt < self.until_next {
            self.until_next -= dt;
            return None;
        }
        let mut remaining = dt - self.until_next;
        let mut count = 1;
        if !self.interval.is_zero() {
            while remaining >= self.interval {
                remaining -= self.interval;
                count += 1;
            }
            self.until_next = self.interval - remaining;
        } else {
            self.until_next = Duration::ZERO;
        }
        Some((action, count))
    }
}

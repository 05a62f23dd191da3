use anyhow::{bail, Result};
use glam::Vec3;
use std::collections::HashSet;
use std::fmt;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Per-frame input the console polls: a key-down query and the device acceleration.
pub trait ConsoleHostInput {
    /// True only on the frame the key went down.
    fn key_pressed(&self, key: &ToggleKey) -> bool;
    fn acceleration(&self) -> Vec3;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToggleKey {
    Character(String),
    Named(NamedKeyCode),
}

impl ToggleKey {
    pub fn character(ch: &str) -> Self {
        Self::Character(ch.to_lowercase())
    }

    pub fn named(named: NamedKeyCode) -> Self {
        Self::Named(named)
    }

    pub fn from_event_key(key: &Key) -> Option<Self> {
        match key {
            Key::Character(ch) => {
                let s = ch.to_string();
                if s.is_empty() {
                    None
                } else {
                    Some(Self::Character(s.to_lowercase()))
                }
            }
            Key::Named(named) => NamedKeyCode::from_named_key(named).map(Self::Named),
            _ => None,
        }
    }

    /// Logical key a window would report for this binding. Used to synthesize presses.
    pub fn to_event_key(&self) -> Key {
        match self {
            ToggleKey::Character(ch) => Key::Character(ch.as_str().into()),
            ToggleKey::Named(named) => Key::Named(named.to_named_key()),
        }
    }

    pub fn from_config_value(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            bail!("toggle key must not be empty");
        }
        let normalized = trimmed.to_lowercase();
        if let Some(named) = NamedKeyCode::from_str(&normalized) {
            return Ok(Self::Named(named));
        }
        match normalized.as_str() {
            "backquote" | "grave" | "backtick" => return Ok(Self::Character("`".to_string())),
            _ => {}
        }
        if normalized.chars().count() == 1 {
            return Ok(Self::Character(normalized));
        }
        bail!("unknown toggle key '{raw}'")
    }
}

impl fmt::Display for ToggleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToggleKey::Character(ch) => f.write_str(ch),
            ToggleKey::Named(named) => write!(f, "{named:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKeyCode {
    Escape,
    Tab,
    Space,
    Enter,
    Home,
    End,
    Insert,
    Pause,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl NamedKeyCode {
    pub fn to_named_key(self) -> NamedKey {
        match self {
            Self::Escape => NamedKey::Escape,
            Self::Tab => NamedKey::Tab,
            Self::Space => NamedKey::Space,
            Self::Enter => NamedKey::Enter,
            Self::Home => NamedKey::Home,
            Self::End => NamedKey::End,
            Self::Insert => NamedKey::Insert,
            Self::Pause => NamedKey::Pause,
            Self::F1 => NamedKey::F1,
            Self::F2 => NamedKey::F2,
            Self::F3 => NamedKey::F3,
            Self::F4 => NamedKey::F4,
            Self::F5 => NamedKey::F5,
            Self::F6 => NamedKey::F6,
            Self::F7 => NamedKey::F7,
            Self::F8 => NamedKey::F8,
            Self::F9 => NamedKey::F9,
            Self::F10 => NamedKey::F10,
            Self::F11 => NamedKey::F11,
            Self::F12 => NamedKey::F12,
        }
    }

    fn from_named_key(key: &NamedKey) -> Option<Self> {
        match key {
            NamedKey::Escape => Some(Self::Escape),
            NamedKey::Tab => Some(Self::Tab),
            NamedKey::Space => Some(Self::Space),
            NamedKey::Enter => Some(Self::Enter),
            NamedKey::Home => Some(Self::Home),
            NamedKey::End => Some(Self::End),
            NamedKey::Insert => Some(Self::Insert),
            NamedKey::Pause => Some(Self::Pause),
            NamedKey::F1 => Some(Self::F1),
            NamedKey::F2 => Some(Self::F2),
            NamedKey::F3 => Some(Self::F3),
            NamedKey::F4 => Some(Self::F4),
            NamedKey::F5 => Some(Self::F5),
            NamedKey::F6 => Some(Self::F6),
            NamedKey::F7 => Some(Self::F7),
            NamedKey::F8 => Some(Self::F8),
            NamedKey::F9 => Some(Self::F9),
            NamedKey::F10 => Some(Self::F10),
            NamedKey::F11 => Some(Self::F11),
            NamedKey::F12 => Some(Self::F12),
            _ => None,
        }
    }

    fn from_str(value: &str) -> Option<Self> {
        match value {
            "escape" | "esc" => Some(Self::Escape),
            "tab" => Some(Self::Tab),
            "space" => Some(Self::Space),
            "enter" | "return" => Some(Self::Enter),
            "home" => Some(Self::Home),
            "end" => Some(Self::End),
            "insert" => Some(Self::Insert),
            "pause" => Some(Self::Pause),
            "f1" => Some(Self::F1),
            "f2" => Some(Self::F2),
            "f3" => Some(Self::F3),
            "f4" => Some(Self::F4),
            "f5" => Some(Self::F5),
            "f6" => Some(Self::F6),
            "f7" => Some(Self::F7),
            "f8" => Some(Self::F8),
            "f9" => Some(Self::F9),
            "f10" => Some(Self::F10),
            "f11" => Some(Self::F11),
            "f12" => Some(Self::F12),
            _ => None,
        }
    }
}

pub enum InputEvent {
    Key { key: Key, pressed: bool },
    Acceleration(Vec3),
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::KeyboardInput { event, .. } => InputEvent::Key {
                key: event.logical_key.clone(),
                pressed: event.state == ElementState::Pressed,
            },
            _ => InputEvent::Other,
        }
    }
}

/// Collects window events between frames and answers the console's polling queries.
#[derive(Debug, Default)]
pub struct ConsoleInput {
    held: HashSet<ToggleKey>,
    pressed_this_frame: HashSet<ToggleKey>,
    acceleration: Vec3,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, pressed } => {
                let Some(binding) = ToggleKey::from_event_key(&key) else {
                    return;
                };
                if pressed {
                    // Key repeat delivers further presses while held; only the first counts.
                    if self.held.insert(binding.clone()) {
                        self.pressed_this_frame.insert(binding);
                    }
                } else {
                    self.held.remove(&binding);
                }
            }
            InputEvent::Acceleration(value) => self.acceleration = value,
            InputEvent::Other => {}
        }
    }

    pub fn clear_frame(&mut self) {
        self.pressed_this_frame.clear();
    }
}

impl ConsoleHostInput for ConsoleInput {
    fn key_pressed(&self, key: &ToggleKey) -> bool {
        self.pressed_this_frame.contains(key)
    }

    fn acceleration(&self) -> Vec3 {
        self.acceleration
    }
}

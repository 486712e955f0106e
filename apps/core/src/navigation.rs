use serde::{Deserialize, Serialize};

use crate::hotkey::{parse_shortcut, Shortcut};

pub const KEY_ESCAPE: &str = "Escape";
pub const KEY_ARROW_UP: &str = "ArrowUp";
pub const KEY_ARROW_DOWN: &str = "ArrowDown";
pub const KEY_ENTER: &str = "Enter";

/// A key-down as reported by the host surface. `key` uses DOM key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInput {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub meta: bool,
}

impl KeyInput {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Reset,
    MoveUp,
    MoveDown,
    Commit,
    OpenSettings,
}

impl KeyCommand {
    /// Whether the host should suppress its default handling of the key.
    pub fn prevents_default(self) -> bool {
        !matches!(self, Self::Reset)
    }
}

/// Maps raw key input to commands. Only routes while attached, which the
/// controller ties to its own start/stop.
#[derive(Debug, Clone)]
pub struct InputRouter {
    settings_shortcut: Shortcut,
    attached: bool,
}

impl InputRouter {
    pub fn new(settings_shortcut: &str) -> Result<Self, String> {
        Ok(Self {
            settings_shortcut: parse_shortcut(settings_shortcut)?,
            attached: false,
        })
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    pub fn detach(&mut self) {
        self.attached = false;
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn route(&self, input: &KeyInput) -> Option<KeyCommand> {
        if !self.attached {
            return None;
        }

        if self.settings_shortcut.matches(input) {
            return Some(KeyCommand::OpenSettings);
        }

        match input.key.as_str() {
            KEY_ESCAPE => Some(KeyCommand::Reset),
            KEY_ARROW_DOWN => Some(KeyCommand::MoveDown),
            KEY_ARROW_UP => Some(KeyCommand::MoveUp),
            KEY_ENTER => Some(KeyCommand::Commit),
            _ => None,
        }
    }
}

pub fn step_down(current: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (current + 1).min(len - 1)
}

pub fn step_up(current: usize, _len: usize) -> usize {
    current.saturating_sub(1)
}

pub fn clamp_selection(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

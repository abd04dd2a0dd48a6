//! The `minifb` window: shows the composited canvas and turns keyboard and
//! mouse state into [`UiCommand`]s and simulated-hand input.

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use ink_geom::Point;

use crate::app::UiCommand;
use crate::canvas::Canvas;
use crate::error::{Error, Result};

const TITLE:      &str  = "Finger Ink";
const TARGET_FPS: usize = 60;

/// Key → command bindings, checked once per frame on first press only.
pub const KEY_BINDINGS: [(Key, UiCommand); 9] = [
    (Key::G,            UiCommand::ToggleGravity),
    (Key::W,            UiCommand::ToggleWiggle),
    (Key::C,            UiCommand::Clear),
    (Key::LeftBracket,  UiCommand::Thinner),
    (Key::RightBracket, UiCommand::Thicker),
    (Key::Tab,          UiCommand::NextColor),
    (Key::P,            UiCommand::Export),
    (Key::Q,            UiCommand::Quit),
    (Key::Escape,       UiCommand::Quit),
];

pub fn command_for_key(key: Key) -> Option<UiCommand> {
    KEY_BINDINGS.iter().find(|(k, _)| *k == key).map(|&(_, cmd)| cmd)
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
}

impl Visualizer {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            TITLE,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| Error::Window(e.to_string()))?;

        window.set_target_fps(TARGET_FPS);

        Ok(Visualizer { window })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Commands for every bound key pressed since the last frame.
    pub fn poll_commands(&self) -> Vec<UiCommand> {
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .filter_map(command_for_key)
            .collect()
    }

    /// Mouse position in canvas pixels, or `None` outside the window.
    pub fn pointer(&self) -> Option<Point> {
        self.window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| Point::new(x, y))
    }

    /// Which simulated fingers are extended: left mouse button (or `1`)
    /// holds the index finger, `2`/`3`/`4` the middle, ring and pinky.
    pub fn held_fingers(&self) -> [bool; 4] {
        let down = |k: Key| self.window.is_key_down(k);
        [
            self.window.get_mouse_down(MouseButton::Left) || down(Key::Key1),
            down(Key::Key2),
            down(Key::Key3),
            down(Key::Key4),
        ]
    }

    /// Blit the canvas and pump window events.
    pub fn present(&mut self, canvas: &Canvas) -> Result<()> {
        self.window
            .update_with_buffer(canvas.pixels(), canvas.width(), canvas.height())
            .map_err(|e| Error::Window(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_has_a_key() {
        for cmd in [
            UiCommand::ToggleGravity, UiCommand::ToggleWiggle, UiCommand::Clear,
            UiCommand::Thinner, UiCommand::Thicker, UiCommand::NextColor,
            UiCommand::Export, UiCommand::Quit,
        ] {
            assert!(KEY_BINDINGS.iter().any(|(_, c)| *c == cmd), "{cmd:?} unbound");
        }
    }

    #[test]
    fn key_lookup() {
        assert_eq!(command_for_key(Key::G), Some(UiCommand::ToggleGravity));
        assert_eq!(command_for_key(Key::Escape), Some(UiCommand::Quit));
        assert_eq!(command_for_key(Key::Z), None);
    }
}

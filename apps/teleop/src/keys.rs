//! Terminal key events to logical controller keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};
use shared::domain::LogicalKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Press(LogicalKey),
    Release(LogicalKey),
    Quit,
}

pub const HELP: &[&str] = &[
    "Control the robot using WASD or the arrow keys:",
    "  W / Up Arrow    -> Forward  (F)",
    "  A / Left Arrow  -> Left     (L)",
    "  D / Right Arrow -> Right    (R)",
    "  S / Down Arrow  -> Backward (B)",
    "  Shift (hold)    -> faster, Left Ctrl (hold) -> slower",
    "Press Q or Esc to quit.",
];

/// Auto-repeat events are dropped so only real press/release transitions
/// reach the session.
pub fn translate(event: &KeyEvent) -> Option<KeyInput> {
    if event.kind == KeyEventKind::Repeat {
        return None;
    }
    let pressed = event.kind == KeyEventKind::Press;

    if pressed && is_quit(event) {
        return Some(KeyInput::Quit);
    }

    let key = logical_key(event.code)?;
    Some(if pressed {
        KeyInput::Press(key)
    } else {
        KeyInput::Release(key)
    })
}

fn is_quit(event: &KeyEvent) -> bool {
    match event.code {
        KeyCode::Esc => true,
        KeyCode::Char(c) if c.eq_ignore_ascii_case(&'q') => true,
        KeyCode::Char(c) => {
            c.eq_ignore_ascii_case(&'c') && event.modifiers.contains(KeyModifiers::CONTROL)
        }
        _ => false,
    }
}

/// Letters match regardless of Shift or Ctrl so a held modifier does not
/// turn `w` into a different key.
fn logical_key(code: KeyCode) -> Option<LogicalKey> {
    match code {
        KeyCode::Char(c) => match c.to_ascii_uppercase() {
            'W' => Some(LogicalKey::W),
            'A' => Some(LogicalKey::A),
            'S' => Some(LogicalKey::S),
            'D' => Some(LogicalKey::D),
            _ => None,
        },
        KeyCode::Up => Some(LogicalKey::Up),
        KeyCode::Down => Some(LogicalKey::Down),
        KeyCode::Left => Some(LogicalKey::Left),
        KeyCode::Right => Some(LogicalKey::Right),
        KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) => {
            Some(LogicalKey::Faster)
        }
        KeyCode::Modifier(ModifierKeyCode::LeftControl) => Some(LogicalKey::Slower),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn event(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    fn press(code: KeyCode) -> KeyEvent {
        event(code, KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn letters_and_arrows_map_to_logical_keys() {
        assert_eq!(
            translate(&press(KeyCode::Char('w'))),
            Some(KeyInput::Press(LogicalKey::W))
        );
        assert_eq!(
            translate(&press(KeyCode::Left)),
            Some(KeyInput::Press(LogicalKey::Left))
        );
        assert_eq!(
            translate(&event(KeyCode::Char('D'), KeyModifiers::SHIFT, KeyEventKind::Release)),
            Some(KeyInput::Release(LogicalKey::D))
        );
    }

    #[test]
    fn ctrl_held_letters_still_steer() {
        assert_eq!(
            translate(&event(KeyCode::Char('s'), KeyModifiers::CONTROL, KeyEventKind::Press)),
            Some(KeyInput::Press(LogicalKey::S))
        );
    }

    #[test]
    fn modifier_keys_select_speed() {
        assert_eq!(
            translate(&press(KeyCode::Modifier(ModifierKeyCode::RightShift))),
            Some(KeyInput::Press(LogicalKey::Faster))
        );
        assert_eq!(
            translate(&event(
                KeyCode::Modifier(ModifierKeyCode::LeftControl),
                KeyModifiers::NONE,
                KeyEventKind::Release
            )),
            Some(KeyInput::Release(LogicalKey::Slower))
        );
        assert_eq!(
            translate(&press(KeyCode::Modifier(ModifierKeyCode::RightControl))),
            None
        );
    }

    #[test]
    fn repeats_and_unknown_keys_are_ignored() {
        assert_eq!(
            translate(&event(KeyCode::Char('w'), KeyModifiers::NONE, KeyEventKind::Repeat)),
            None
        );
        assert_eq!(translate(&press(KeyCode::Char('x'))), None);
        assert_eq!(translate(&press(KeyCode::Enter)), None);
    }

    #[test]
    fn quit_keys_only_fire_on_press() {
        assert_eq!(translate(&press(KeyCode::Esc)), Some(KeyInput::Quit));
        assert_eq!(translate(&press(KeyCode::Char('Q'))), Some(KeyInput::Quit));
        assert_eq!(
            translate(&event(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press)),
            Some(KeyInput::Quit)
        );
        assert_eq!(
            translate(&event(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release)),
            None
        );
    }
}

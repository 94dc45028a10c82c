//! Keyboard bindings.
//!
//! Maps window keys onto the engine's [`Action`]s.

use nannou::prelude::*;
use track_viz_core::Action;

/// Parse a key press into an action.
///
/// `seek_step` is the arrow-key seek distance in seconds.
pub fn parse_key(key: Key, seek_step: f64) -> Option<Action> {
    match key {
        Key::Q | Key::Escape => Some(Action::Quit),
        Key::Space => Some(Action::TogglePlayPause),
        Key::S => Some(Action::Stop),
        Key::D => Some(Action::ToggleDream),
        Key::Left => Some(Action::SeekBy(-seek_step)),
        Key::Right => Some(Action::SeekBy(seek_step)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_keys() {
        assert_eq!(parse_key(Key::Space, 5.0), Some(Action::TogglePlayPause));
        assert_eq!(parse_key(Key::S, 5.0), Some(Action::Stop));
        assert_eq!(parse_key(Key::Left, 5.0), Some(Action::SeekBy(-5.0)));
        assert_eq!(parse_key(Key::Right, 2.5), Some(Action::SeekBy(2.5)));
    }

    #[test]
    fn test_quit_and_dream() {
        assert_eq!(parse_key(Key::Q, 5.0), Some(Action::Quit));
        assert_eq!(parse_key(Key::Escape, 5.0), Some(Action::Quit));
        assert_eq!(parse_key(Key::D, 5.0), Some(Action::ToggleDream));
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        assert_eq!(parse_key(Key::H, 5.0), None);
        assert_eq!(parse_key(Key::Up, 5.0), None);
    }
}

//! Windowing-independent input vocabulary.
//!
//! The binary translates keys and mouse events into these; the session
//! consumes them once per frame.

use crate::geometry::Point;

/// Commands triggered by key presses or window events
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TogglePlayPause,
    Play,
    Pause,
    Stop,
    ToggleDream,
    /// Relative seek in seconds, negative rewinds
    SeekBy(f64),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Action(Action),
    PointerDown(Point),
    PointerMoved(Point),
    PointerUp(Point),
}

impl From<Action> for InputEvent {
    fn from(action: Action) -> Self {
        InputEvent::Action(action)
    }
}

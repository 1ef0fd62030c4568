//! Logical commands consumed by the dispatcher loop.
//!
//! Every platform message that changes application state is translated into
//! exactly one [`Command`] and queued; the app drains the queue on the
//! message thread.

/// Direction of a movement hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit vector in screen coordinates (y grows downwards).
    pub const fn unit(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ToggleVisibility,
    Move(Direction),
    Capture,
    ClearSnapshots,
    SendRequest,
    /// Cycle which selection dimension the value hotkey acts on.
    AdvanceDimension,
    /// Advance the value of the active selection dimension.
    AdvanceValue,
    ViewText,
    Quit,
    /// A background request finished and its result is waiting in the
    /// orchestrator's channel.
    ResponseReady,
}

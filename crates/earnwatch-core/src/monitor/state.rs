//! Monitor lifecycle states and the legal transitions between them

use serde::{Deserialize, Serialize};

/// Lifecycle of one watch session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MonitorState {
    /// Mounted, never played
    Idle,
    /// Playing; periodic checks are live
    Playing,
    /// Paused by the user or the guard
    Paused,
    /// Cool-down after a tamper reset
    Resetting,
    /// Watched to the end
    Completed,
}

impl MonitorState {
    /// Terminal states accept no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: MonitorState) -> &'static [MonitorState] {
    use MonitorState::*;
    match from {
        Idle => &[Playing, Paused, Resetting],
        Playing => &[Paused, Resetting, Completed],
        Paused => &[Playing, Resetting],
        Resetting => &[Paused],
        Completed => &[],
    }
}

/// Check a transition against the table
#[inline]
#[must_use]
pub fn is_allowed(from: MonitorState, to: MonitorState) -> bool {
    allowed_transitions(from).contains(&to)
}

//! Enumeration types for the Game of Life engine.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a simulation run.
///
/// The legal transitions are:
///
/// ```text
/// Running <-> Paused
/// Running  -> Quitting -> Done
/// ```
///
/// `Running` is the initial state and `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Turns are being executed.
    Running,
    /// Suspended until a second pause signal arrives.
    Paused,
    /// The run is shutting down and flushing its final snapshot.
    Quitting,
    /// The event stream has been closed.
    Done,
}

impl LifecycleState {
    /// Whether the state machine permits moving from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Paused | Self::Quitting)
                | (Self::Paused, Self::Running)
                | (Self::Quitting, Self::Done)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Quitting => "Quitting",
            Self::Done => "Done",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Control signals
// ---------------------------------------------------------------------------

/// A discrete interactive control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    /// Persist a snapshot of the current turn and keep running.
    Save,
    /// Persist a snapshot and stop, skipping any remaining turns.
    Quit,
    /// Toggle between running and paused.
    Pause,
}

impl ControlSignal {
    /// Decode a key press. Keys other than `s`, `q` and `p` map to `None`.
    pub const fn from_key(key: char) -> Option<Self> {
        match key {
            's' => Some(Self::Save),
            'q' => Some(Self::Quit),
            'p' => Some(Self::Pause),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_decode_to_signals() {
        assert_eq!(ControlSignal::from_key('s'), Some(ControlSignal::Save));
        assert_eq!(ControlSignal::from_key('q'), Some(ControlSignal::Quit));
        assert_eq!(ControlSignal::from_key('p'), Some(ControlSignal::Pause));
    }

    #[test]
    fn other_keys_are_ignored() {
        for key in ['x', 'S', ' ', '\n', 'k', '0'] {
            assert_eq!(ControlSignal::from_key(key), None, "key {key:?}");
        }
    }

    #[test]
    fn lifecycle_transitions() {
        use LifecycleState::{Done, Paused, Quitting, Running};

        assert!(Running.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Running));
        assert!(Running.can_transition_to(Quitting));
        assert!(Quitting.can_transition_to(Done));

        assert!(!Paused.can_transition_to(Quitting));
        assert!(!Done.can_transition_to(Running));
        assert!(!Quitting.can_transition_to(Running));
        assert!(!Running.can_transition_to(Done));
    }
}

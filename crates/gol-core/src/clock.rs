//! Turn counter for a bounded run.
//!
//! The clock is the single source of truth for how many turns have
//! completed. It starts at 0, advances by exactly one per completed step
//! and refuses to move past the target, so `turn <= target` always holds.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Every requested turn has already been completed.
    #[error("turn target {target} already reached")]
    TargetReached {
        /// The configured number of turns.
        target: u64,
    },

    /// Turn counter would overflow.
    #[error("turn counter overflow: cannot advance beyond u64::MAX")]
    TurnOverflow,
}

/// Completed-turn counter bounded by a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnClock {
    /// Completed turns.
    turn: u64,
    /// Number of turns the run should complete.
    target: u64,
}

impl TurnClock {
    /// Create a clock at turn 0 that completes after `target` turns.
    pub const fn new(target: u64) -> Self {
        Self { turn: 0, target }
    }

    /// Record one completed turn. Returns the new turn number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TargetReached`] if the target has already
    /// been reached.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        if self.is_complete() {
            return Err(ClockError::TargetReached {
                target: self.target,
            });
        }
        self.turn = self.turn.checked_add(1).ok_or(ClockError::TurnOverflow)?;
        Ok(self.turn)
    }

    /// Number of completed turns.
    pub const fn turn(&self) -> u64 {
        self.turn
    }

    /// Number of turns the run should complete.
    pub const fn target(&self) -> u64 {
        self.target
    }

    /// Whether every requested turn has completed.
    pub const fn is_complete(&self) -> bool {
        self.turn >= self.target
    }

    /// Turns still to run.
    pub const fn remaining(&self) -> u64 {
        self.target.saturating_sub(self.turn)
    }
}

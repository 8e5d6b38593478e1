//! Event records streamed from a run to its observer.
//!
//! Events are immutable values delivered one at a time, in order, over a
//! one-way channel. Within a turn every [`Event::CellFlipped`] precedes that
//! turn's [`Event::TurnComplete`]. The stream ends with
//! [`Event::FinalState`] followed by a [`Event::LifecycleChanged`] into
//! [`LifecycleState::Quitting`], after which the channel is closed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::LifecycleState;

/// A grid coordinate. Ordering is row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Row index (vertical axis).
    pub row: usize,
    /// Column index (horizontal axis).
    pub col: usize,
}

impl Cell {
    /// Create a cell coordinate.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Progress and lifecycle events emitted by the turn controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A turn has been fully computed and its flips reported.
    TurnComplete {
        /// Number of completed turns.
        turn: u64,
    },

    /// Periodic report of the live population.
    AliveCount {
        /// Number of completed turns when the count was taken.
        turn: u64,
        /// Number of live cells.
        count: usize,
    },

    /// A cell changed state between the previous turn and `turn`.
    CellFlipped {
        /// The turn whose state contains the flip.
        turn: u64,
        /// The flipped cell.
        cell: Cell,
    },

    /// Every live cell at the end of the run.
    FinalState {
        /// Number of completed turns.
        turn: u64,
        /// Live cells in row-major order.
        alive: BTreeSet<Cell>,
    },

    /// The run moved to a new lifecycle state.
    LifecycleChanged {
        /// Number of completed turns at the transition.
        turn: u64,
        /// The state entered.
        state: LifecycleState,
    },
}

impl Event {
    /// The turn number carried by every event kind.
    pub const fn turn(&self) -> u64 {
        match self {
            Self::TurnComplete { turn }
            | Self::AliveCount { turn, .. }
            | Self::CellFlipped { turn, .. }
            | Self::FinalState { turn, .. }
            | Self::LifecycleChanged { turn, .. } => *turn,
        }
    }
}

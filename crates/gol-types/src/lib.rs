//! Shared type definitions for the Game of Life engine.
//!
//! Everything that crosses a crate boundary lives here: the cell coordinate
//! used in events, the event records streamed to observers, the lifecycle
//! states of a run and the control signals accepted from the keyboard.
//!
//! # Modules
//!
//! - [`enums`] -- [`LifecycleState`] and [`ControlSignal`]
//! - [`event`] -- [`Cell`] coordinates and the [`Event`] stream records

pub mod enums;
pub mod event;

// Re-export all public types at crate root for convenience.
pub use enums::{ControlSignal, LifecycleState};
pub use event::{Cell, Event};

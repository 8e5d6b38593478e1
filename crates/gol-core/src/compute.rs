//! Single-call compute delegate.
//!
//! [`calculate`] takes a grid and a turn count, runs that many steps and
//! hands back the resulting grid. It keeps no state between calls and
//! reports no progress.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::{EngineError, StepEngine};
use crate::grid::Grid;

/// Outcome code of a compute call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ComputeStatus {
    /// Every requested turn was computed.
    #[default]
    Ok,
}

impl From<ComputeStatus> for u8 {
    fn from(status: ComputeStatus) -> Self {
        match status {
            ComputeStatus::Ok => 0,
        }
    }
}

impl TryFrom<u8> for ComputeStatus {
    type Error = UnknownStatus;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            other => Err(UnknownStatus { code: other }),
        }
    }
}

/// A status code with no [`ComputeStatus`] counterpart.
#[derive(Debug, thiserror::Error)]
#[error("unknown compute status code {code}")]
pub struct UnknownStatus {
    /// The unrecognised wire value.
    pub code: u8,
}

/// Input to [`calculate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeRequest {
    /// Starting grid.
    pub grid: Grid,
    /// Number of turns to run.
    pub turns: u64,
}

/// Output of [`calculate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeResponse {
    /// Grid after `turns` steps.
    pub grid: Grid,
    /// Number of turns that were run.
    pub turns: u64,
    /// Outcome code.
    pub status: ComputeStatus,
}

/// Run `request.turns` steps on `request.grid` using `threads` workers.
///
/// # Errors
///
/// Returns [`EngineError::InvalidWorkers`] unless
/// `1 <= threads <= grid.width()`, or any error raised by a step.
pub fn calculate(request: ComputeRequest, threads: usize) -> Result<ComputeResponse, EngineError> {
    let ComputeRequest { grid, turns } = request;
    let mut engine = StepEngine::new(grid, threads)?;
    for _ in 0..turns {
        engine.step()?;
    }
    debug!(turns, threads, "Compute request finished");
    Ok(ComputeResponse {
        grid: engine.into_grid(),
        turns,
        status: ComputeStatus::Ok,
    })
}

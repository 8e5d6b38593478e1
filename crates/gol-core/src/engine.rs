//! Double-buffered parallel step engine.
//!
//! The [`StepEngine`] owns two grids: `current`, the authoritative state of
//! the last completed turn, and `scratch`, the buffer the next turn is
//! written into. A step splits the column range into one contiguous band
//! per worker, runs every band on its own scoped thread, joins them all and
//! then swaps the buffers.
//!
//! Workers only read `current` and each writes a disjoint slice of
//! `scratch`, so no locks are involved. Because every cell is computed from
//! `current` alone, no cell ever sees an already-updated neighbour.

use std::ops::Range;
use std::thread;

use tracing::trace;

use crate::grid::Grid;

/// Errors that can occur while building or stepping the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The worker count is zero or larger than the grid width.
    #[error("worker count {workers} is invalid for a grid {width} columns wide")]
    InvalidWorkers {
        /// Requested worker count.
        workers: usize,
        /// Grid width.
        width: usize,
    },

    /// A worker thread panicked while computing its band.
    #[error("worker {worker} panicked during step")]
    WorkerPanicked {
        /// Index of the worker that failed.
        worker: usize,
    },

    /// The column partitions do not tile the scratch buffer.
    #[error("column partitions do not cover the grid buffer")]
    BufferMismatch,
}

/// Split `[0, width)` into `workers` contiguous column ranges.
///
/// Every range is `width / workers` columns wide except the last, which
/// extends to `width` and absorbs the remainder. Together the ranges cover
/// every column exactly once.
///
/// # Errors
///
/// Returns [`EngineError::InvalidWorkers`] unless `1 <= workers <= width`.
pub fn partition_columns(width: usize, workers: usize) -> Result<Vec<Range<usize>>, EngineError> {
    let invalid = EngineError::InvalidWorkers { workers, width };
    if workers == 0 || workers > width {
        return Err(invalid);
    }
    let size = width.checked_div(workers).ok_or(invalid)?;
    let last = workers.saturating_sub(1);

    let mut partitions = Vec::with_capacity(workers);
    let mut start = 0_usize;
    for worker in 0..workers {
        let end = if worker == last {
            width
        } else {
            start.saturating_add(size)
        };
        partitions.push(start..end);
        start = end;
    }
    Ok(partitions)
}

/// Owns the two grid buffers and advances them one turn at a time.
#[derive(Debug, Clone)]
pub struct StepEngine {
    current: Grid,
    scratch: Grid,
    partitions: Vec<Range<usize>>,
}

impl StepEngine {
    /// Create an engine seeded with `initial` and a fixed worker count.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWorkers`] unless
    /// `1 <= workers <= initial.width()`.
    pub fn new(initial: Grid, workers: usize) -> Result<Self, EngineError> {
        let partitions = partition_columns(initial.width(), workers)?;
        Ok(Self {
            scratch: initial.cleared(),
            current: initial,
            partitions,
        })
    }

    /// State after the last completed turn.
    pub const fn current(&self) -> &Grid {
        &self.current
    }

    /// State before the last completed turn. All dead before the first step.
    pub const fn previous(&self) -> &Grid {
        &self.scratch
    }

    /// Column range assigned to each worker.
    pub fn partitions(&self) -> &[Range<usize>] {
        &self.partitions
    }

    /// Number of workers used per step.
    pub fn workers(&self) -> usize {
        self.partitions.len()
    }

    /// Consume the engine, returning the current grid.
    pub fn into_grid(self) -> Grid {
        self.current
    }

    /// Compute one full turn in parallel and swap the buffers.
    ///
    /// Blocks until every worker has finished. On error the buffers are
    /// left unswapped, so `current` still holds the last completed turn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPanicked`] if any worker panics.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let Self {
            current,
            scratch,
            partitions,
        } = self;
        let source: &Grid = current;
        let height = source.height();

        thread::scope(|scope| {
            let mut rest = scratch.columns_mut();
            let mut handles = Vec::with_capacity(partitions.len());

            for (worker, columns) in partitions.iter().enumerate() {
                let band_len = columns
                    .len()
                    .checked_mul(height)
                    .ok_or(EngineError::BufferMismatch)?;
                let (band, tail) = std::mem::take(&mut rest)
                    .split_at_mut_checked(band_len)
                    .ok_or(EngineError::BufferMismatch)?;
                rest = tail;

                let columns = columns.clone();
                handles.push((
                    worker,
                    scope.spawn(move || fill_band(source, columns, band)),
                ));
            }

            let mut outcome = if rest.is_empty() {
                Ok(())
            } else {
                Err(EngineError::BufferMismatch)
            };
            for (worker, handle) in handles {
                if handle.join().is_err() && outcome.is_ok() {
                    outcome = Err(EngineError::WorkerPanicked { worker });
                }
            }
            outcome
        })?;

        std::mem::swap(current, scratch);
        trace!(workers = partitions.len(), "Step complete");
        Ok(())
    }
}

/// Compute the next state of every cell in `columns`, writing into `band`
/// (column-major, `height` cells per column).
fn fill_band(source: &Grid, columns: Range<usize>, band: &mut [bool]) {
    let height = source.height();
    for (col, column) in columns.zip(band.chunks_exact_mut(height)) {
        for (row, cell) in column.iter_mut().enumerate() {
            *cell = source.next_state(row, col);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gol_types::Cell;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// Single-threaded reference step computed cell by cell.
    fn reference_step(grid: &Grid) -> Grid {
        let mut next = grid.cleared();
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                next.set(row, col, grid.next_state(row, col));
            }
        }
        next
    }

    fn random_grid(width: usize, height: usize, seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows: Vec<bool> = (0..width * height).map(|_| rng.random_bool(0.35)).collect();
        Grid::from_row_major(width, height, &rows).unwrap()
    }

    fn glider_cells(offset: usize) -> Vec<Cell> {
        [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]
            .into_iter()
            .map(|(r, c)| Cell::new(r + offset, c + offset))
            .collect()
    }

    #[test]
    fn partitions_cover_every_column_once() {
        for width in 1..=40 {
            for workers in 1..=width {
                let parts = partition_columns(width, workers).unwrap();
                assert_eq!(parts.len(), workers);
                let mut hits = vec![0_u32; width];
                for range in &parts {
                    for col in range.clone() {
                        hits[col] += 1;
                    }
                }
                assert!(
                    hits.iter().all(|&h| h == 1),
                    "width={width} workers={workers} parts={parts:?}"
                );
                assert_eq!(parts.first().unwrap().start, 0);
                assert_eq!(parts.last().unwrap().end, width);
            }
        }
    }

    #[test]
    fn remainder_goes_to_last_partition() {
        assert_eq!(partition_columns(10, 3).unwrap(), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition_columns(12, 4).unwrap(), vec![0..3, 3..6, 6..9, 9..12]);
        assert_eq!(partition_columns(5, 5).unwrap(), vec![0..1, 1..2, 2..3, 3..4, 4..5]);
    }

    #[test]
    fn invalid_worker_counts_rejected() {
        assert!(matches!(
            partition_columns(8, 0),
            Err(EngineError::InvalidWorkers { workers: 0, width: 8 })
        ));
        assert!(partition_columns(8, 9).is_err());
        assert!(StepEngine::new(Grid::new(4, 4).unwrap(), 5).is_err());
    }

    #[test]
    fn step_matches_reference_for_any_worker_count() {
        for (seed, (width, height)) in [(16, 16), (10, 7), (33, 5), (3, 3)].into_iter().enumerate() {
            let initial = random_grid(width, height, seed as u64);
            for workers in [1, 2, 3, width] {
                let mut engine = StepEngine::new(initial.clone(), workers).unwrap();
                let mut expected = initial.clone();
                for _ in 0..5 {
                    let before = engine.current().clone();
                    engine.step().unwrap();
                    expected = reference_step(&expected);
                    assert_eq!(engine.current(), &expected, "{width}x{height} workers={workers}");
                    assert_eq!(engine.previous(), &before);
                }
            }
        }
    }

    #[test]
    fn step_reads_only_the_pre_step_grid() {
        // A horizontal blinker: if any worker saw an updated neighbour the
        // vertical phase would come out wrong.
        let initial = Grid::with_alive(
            10,
            10,
            [Cell::new(4, 3), Cell::new(4, 4), Cell::new(4, 5)],
        )
        .unwrap();
        let mut engine = StepEngine::new(initial.clone(), 3).unwrap();
        engine.step().unwrap();
        let vertical: Vec<Cell> = engine.current().alive_cells().collect();
        assert_eq!(vertical, vec![Cell::new(3, 4), Cell::new(4, 4), Cell::new(5, 4)]);
        engine.step().unwrap();
        assert_eq!(engine.current(), &initial);
    }

    #[test]
    fn glider_shifts_diagonally_after_four_steps() {
        let initial = Grid::with_alive(16, 16, glider_cells(0)).unwrap();
        let mut engine = StepEngine::new(initial, 4).unwrap();
        for _ in 0..4 {
            engine.step().unwrap();
            assert_eq!(engine.current().alive_count(), 5);
        }
        let cells: Vec<Cell> = engine.current().alive_cells().collect();
        assert_eq!(cells, glider_cells(1));
    }

    #[test]
    fn glider_wraps_around_the_torus() {
        let initial = Grid::with_alive(8, 8, glider_cells(0)).unwrap();
        let mut engine = StepEngine::new(initial.clone(), 2).unwrap();
        // 8 diagonal shifts bring it back to where it started.
        for _ in 0..32 {
            engine.step().unwrap();
        }
        assert_eq!(engine.into_grid(), initial);
    }

    #[test]
    fn previous_is_blank_before_first_step() {
        let initial = Grid::with_alive(6, 6, glider_cells(0)).unwrap();
        let engine = StepEngine::new(initial, 2).unwrap();
        assert_eq!(engine.previous().alive_count(), 0);
        assert_eq!(engine.workers(), 2);
        assert_eq!(engine.partitions(), &[0..3, 3..6]);
    }
}

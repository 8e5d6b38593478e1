//! Turn loop with interactive control signals.
//!
//! [`TurnController::run`] loads the initial grid, then loops until every
//! turn has been computed or a quit signal arrives. Each iteration takes the
//! first ready source in strict priority order:
//!
//! 1. **Control signal**: save a snapshot, quit, or pause until the next
//!    pause signal.
//! 2. **Report tick**: emit the live-cell count without advancing.
//! 3. **Default**: compute one turn, emit a `CellFlipped` per changed cell
//!    in row-major order, then `TurnComplete`.
//!
//! Nothing blocks in the default branch, so the loop runs turns back to
//! back while no signal or tick is pending.
//!
//! On a normal end the controller emits `FinalState`, persists the final
//! snapshot, waits for the I/O collaborator to go idle, emits
//! `LifecycleChanged(Quitting)` and closes the event stream. Any failure to
//! deliver an event, read a control signal or reach the collaborator ends
//! the run with an error and skips that sequence.

use std::collections::BTreeSet;
use std::time::Duration;

use gol_types::{Cell, ControlSignal, Event, LifecycleState};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, TurnClock};
use crate::config::{ConfigError, Params};
use crate::engine::{EngineError, StepEngine};
use crate::grid::{Grid, GridError};
use crate::io::{ImageIo, IoError};

/// Period of the `AliveCount` report.
pub const ALIVE_REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest report period accepted by [`TurnController::with_report_interval`].
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Errors that end a run abruptly.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The run parameters are invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The initial grid could not be built.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },

    /// A step failed.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: EngineError,
    },

    /// The turn counter refused to advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The I/O collaborator failed.
    #[error("image I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },

    /// The loaded image does not hold `width * height` cells.
    #[error("image {name} has {actual} cells, expected {expected}")]
    ImageSize {
        /// Image name.
        name: String,
        /// `width * height`.
        expected: usize,
        /// Number of cells received.
        actual: usize,
    },

    /// The event receiver was dropped.
    #[error("event sink closed")]
    EventSinkClosed,

    /// Every control-signal sender was dropped.
    #[error("control signal stream closed")]
    ControlClosed,

    /// The blocking task running a step failed to complete.
    #[error("step task failed: {message}")]
    StepTask {
        /// Description of the join failure.
        message: String,
    },
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Every requested turn was computed.
    Completed,
    /// A quit signal stopped the run early.
    Quit,
}

/// Result of a run that ended gracefully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// The reason the run ended.
    pub end_reason: EndReason,
    /// Number of completed turns.
    pub turns_completed: u64,
    /// Live cells in the final grid.
    pub alive_cells: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Drives a [`StepEngine`] turn by turn and streams [`Event`]s.
pub struct TurnController<I> {
    params: Params,
    io: I,
    keys: mpsc::Receiver<char>,
    events: mpsc::Sender<Event>,
    report_interval: Duration,
    state: LifecycleState,
    last_snapshot: Option<u64>,
}

impl<I: ImageIo> TurnController<I> {
    /// Create a controller.
    ///
    /// `keys` carries character-coded control signals; `events` receives
    /// every event and is closed when the run ends.
    pub const fn new(
        params: Params,
        io: I,
        keys: mpsc::Receiver<char>,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            params,
            io,
            keys,
            events,
            report_interval: ALIVE_REPORT_INTERVAL,
            state: LifecycleState::Running,
            last_snapshot: None,
        }
    }

    /// Override the `AliveCount` period. Values below 1ms are raised to 1ms.
    #[must_use]
    pub fn with_report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval.max(MIN_REPORT_INTERVAL);
        self
    }

    /// Run until every turn is computed or a quit signal arrives.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError`] on any fatal failure. In that case
    /// neither `FinalState` nor `LifecycleChanged(Quitting)` is emitted.
    pub async fn run(mut self) -> Result<RunSummary, ControllerError> {
        self.params.validate()?;
        let started = Instant::now();

        info!(
            turns = self.params.turns,
            threads = self.params.threads,
            width = self.params.image_width,
            height = self.params.image_height,
            "Run starting"
        );

        let initial = self.load_initial().await?;
        let mut engine = StepEngine::new(initial, self.params.threads)?;
        let mut clock = TurnClock::new(self.params.turns);
        debug!(
            workers = engine.workers(),
            partitions = ?engine.partitions(),
            target = clock.target(),
            "Step engine ready"
        );

        for cell in engine.current().alive_cells() {
            self.emit(Event::CellFlipped { turn: 0, cell }).await?;
        }

        let mut ticker = interval_at(
            started.checked_add(self.report_interval).unwrap_or(started),
            self.report_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut end_reason = EndReason::Completed;
        while !clock.is_complete() {
            tokio::select! {
                biased;

                key = self.keys.recv() => {
                    let key = key.ok_or(ControllerError::ControlClosed)?;
                    match ControlSignal::from_key(key) {
                        Some(ControlSignal::Save) => {
                            self.save_snapshot(engine.current(), clock.turn()).await?;
                        }
                        Some(ControlSignal::Quit) => {
                            info!(turn = clock.turn(), "Quit requested");
                            self.save_snapshot(engine.current(), clock.turn()).await?;
                            self.set_state(LifecycleState::Quitting);
                            end_reason = EndReason::Quit;
                            break;
                        }
                        Some(ControlSignal::Pause) => {
                            self.pause(clock.turn()).await?;
                            ticker.reset();
                        }
                        None => debug!(key = ?key, "Ignoring unknown key"),
                    }
                }

                _ = ticker.tick() => {
                    self.report_alive(engine.current(), clock.turn()).await?;
                }

                () = std::future::ready(()) => {
                    engine = self.advance(engine, &mut clock).await?;
                }
            }
        }

        self.finish(&engine, &clock, end_reason, started).await
    }

    /// Read the initial image and check its size.
    async fn load_initial(&mut self) -> Result<Grid, ControllerError> {
        let Params {
            image_width: width,
            image_height: height,
            ..
        } = self.params;
        let name = self.params.input_image_name();
        let cells = self.io.read_image(&name).await?;

        let expected = width
            .checked_mul(height)
            .ok_or(GridError::TooLarge { width, height })?;
        if cells.len() != expected {
            return Err(ControllerError::ImageSize {
                name,
                expected,
                actual: cells.len(),
            });
        }

        let grid = Grid::from_row_major(width, height, &cells)?;
        info!(name = %name, alive = grid.alive_count(), "Initial grid loaded");
        Ok(grid)
    }

    /// Compute one turn off the async runtime and emit its events.
    async fn advance(
        &self,
        engine: StepEngine,
        clock: &mut TurnClock,
    ) -> Result<StepEngine, ControllerError> {
        let engine = tokio::task::spawn_blocking(move || {
            let mut engine = engine;
            engine.step().map(|()| engine)
        })
        .await
        .map_err(|err| ControllerError::StepTask {
            message: err.to_string(),
        })??;

        let turn = clock.advance()?;
        for cell in engine.current().flips(engine.previous()) {
            self.emit(Event::CellFlipped { turn, cell }).await?;
        }
        self.emit(Event::TurnComplete { turn }).await?;
        debug!(turn, remaining = clock.remaining(), "Turn complete");
        Ok(engine)
    }

    /// Block on the control stream until the next pause signal.
    async fn pause(&mut self, turn: u64) -> Result<(), ControllerError> {
        self.set_state(LifecycleState::Paused);
        self.emit(Event::LifecycleChanged {
            turn,
            state: LifecycleState::Paused,
        })
        .await?;
        info!(turn, "Paused");

        loop {
            let key = self
                .keys
                .recv()
                .await
                .ok_or(ControllerError::ControlClosed)?;
            if ControlSignal::from_key(key) == Some(ControlSignal::Pause) {
                break;
            }
            debug!(key = ?key, "Discarding key while paused");
        }

        self.set_state(LifecycleState::Running);
        self.emit(Event::LifecycleChanged {
            turn,
            state: LifecycleState::Running,
        })
        .await?;
        info!(turn, "Resumed");
        Ok(())
    }

    async fn report_alive(&self, grid: &Grid, turn: u64) -> Result<(), ControllerError> {
        let count = grid.alive_count();
        debug!(turn, count, "Alive count");
        self.emit(Event::AliveCount { turn, count }).await
    }

    /// Request a snapshot of `grid` named for `turn`.
    async fn save_snapshot(&mut self, grid: &Grid, turn: u64) -> Result<(), ControllerError> {
        let name = self.params.snapshot_name(turn);
        self.io.write_image(&name, grid.to_row_major()).await?;
        self.last_snapshot = Some(turn);
        info!(turn, name = %name, "Snapshot requested");
        Ok(())
    }

    /// Request the final snapshot unless one was already taken at `turn`.
    async fn persist_once(&mut self, grid: &Grid, turn: u64) -> Result<(), ControllerError> {
        if self.last_snapshot == Some(turn) {
            debug!(turn, "Snapshot already requested for this turn");
            return Ok(());
        }
        self.save_snapshot(grid, turn).await
    }

    /// Emit the final state, flush I/O and close the event stream.
    async fn finish(
        mut self,
        engine: &StepEngine,
        clock: &TurnClock,
        end_reason: EndReason,
        started: Instant,
    ) -> Result<RunSummary, ControllerError> {
        let turn = clock.turn();
        let grid = engine.current();
        let alive: BTreeSet<Cell> = grid.alive_cells().collect();
        let alive_cells = alive.len();

        self.emit(Event::FinalState { turn, alive }).await?;
        self.persist_once(grid, turn).await?;
        self.io.wait_idle().await?;

        if self.state == LifecycleState::Running {
            self.set_state(LifecycleState::Quitting);
        }
        self.emit(Event::LifecycleChanged {
            turn,
            state: LifecycleState::Quitting,
        })
        .await?;
        self.set_state(LifecycleState::Done);

        let summary = RunSummary {
            end_reason,
            turns_completed: turn,
            alive_cells,
            elapsed: started.elapsed(),
        };
        // Dropping the controller drops the only event sender.
        drop(self);
        Ok(summary)
    }

    fn set_state(&mut self, next: LifecycleState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "Illegal lifecycle transition");
        }
        self.state = next;
    }

    async fn emit(&self, event: Event) -> Result<(), ControllerError> {
        self.events
            .send(event)
            .await
            .map_err(|_err| ControllerError::EventSinkClosed)
    }
}

/// Log how a run ended.
pub fn log_run_end(summary: &RunSummary) {
    info!(
        reason = ?summary.end_reason,
        turns_completed = summary.turns_completed,
        alive_cells = summary.alive_cells,
        elapsed_ms = u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        "Run ended"
    );
    if summary.turns_completed == 0 {
        warn!("Run ended with no turns computed");
    }
}

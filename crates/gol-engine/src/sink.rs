//! Event sink: presents the controller's event stream.
//!
//! Two formats are supported. `log` turns events into tracing records
//! (alive counts, lifecycle changes and the final state at info, turn
//! completion at debug, flips at trace). `json` writes one JSON object per
//! event to stdout.

use std::io::Write;

use gol_core::config::SinkFormat;
use gol_types::Event;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

/// Start the sink task. It finishes when the event stream closes and
/// returns the number of events it consumed.
pub fn spawn_sink(format: SinkFormat, mut events: mpsc::Receiver<Event>) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut consumed: u64 = 0;
        let mut last_turn: u64 = 0;
        while let Some(event) = events.recv().await {
            last_turn = event.turn();
            match format {
                SinkFormat::Log => log_event(&event),
                SinkFormat::Json => print_json(&event),
            }
            consumed = consumed.saturating_add(1);
        }
        debug!(consumed, last_turn, "Event stream closed");
        consumed
    })
}

fn log_event(event: &Event) {
    match event {
        Event::AliveCount { turn, count } => info!(turn, count, "Alive cells"),
        Event::LifecycleChanged { turn, state } => info!(turn, state = %state, "Lifecycle changed"),
        Event::FinalState { turn, alive } => info!(turn, alive = alive.len(), "Final state"),
        Event::TurnComplete { turn } => debug!(turn, "Turn complete"),
        Event::CellFlipped { turn, cell } => {
            trace!(turn, row = cell.row, col = cell.col, "Cell flipped");
        }
    }
}

fn print_json(event: &Event) {
    let line = match serde_json::to_string(event) {
        Ok(line) => line,
        Err(err) => {
            warn!(error = %err, "Failed to serialize event");
            return;
        }
    };
    let mut stdout = std::io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{line}") {
        warn!(error = %err, "Failed to write event");
    }
}

//! Game of Life engine binary.
//!
//! Wires the turn controller to its collaborators: the PGM image service,
//! a keyboard reader for control keys and an event sink. It runs one
//! simulation to completion or until `q` is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `gol-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Validate the run parameters
//! 4. Start the image service
//! 5. Start the keyboard reader and the event sink
//! 6. Run the turn controller
//! 7. Drain the sink, stop the image service and log the result
//!
//! Keys: `s` saves a snapshot, `q` saves and quits, `p` pauses and resumes.

mod error;
mod keyboard;
mod sink;

use std::path::Path;

use gol_core::config::GolConfig;
use gol_core::controller::{self, TurnController};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Capacity of the key channel between the keyboard reader and the
/// controller.
const KEY_BUFFER: usize = 16;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, a collaborator fails to
/// start, or the run ends abruptly.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("gol-engine starting");
    info!(
        from_file,
        turns = config.params.turns,
        threads = config.params.threads,
        width = config.params.image_width,
        height = config.params.image_height,
        sink = ?config.sink.format,
        "Configuration loaded"
    );

    // 3. Validate.
    config.params.validate().map_err(EngineError::from)?;

    // 4. Image service.
    let (io, io_task) = gol_io::spawn_io(
        config.io.clone(),
        config.params.image_width,
        config.params.image_height,
    );
    info!(
        images_dir = config.io.images_dir,
        output_dir = config.io.output_dir,
        "Image service started"
    );

    // 5. Keyboard reader and event sink.
    let (key_tx, key_rx) = mpsc::channel(KEY_BUFFER);
    let _keyboard = keyboard::spawn_keyboard(key_tx).map_err(EngineError::from)?;
    let (event_tx, event_rx) = mpsc::channel(config.sink.buffer.max(1));
    let sink_task = sink::spawn_sink(config.sink.format, event_rx);

    // 6. Run.
    let result = TurnController::new(config.params, io, key_rx, event_tx)
        .run()
        .await;

    // 7. Drain and shut down. The controller has dropped the event sender
    //    and the image handle, so both tasks finish on their own.
    let consumed = sink_task.await.map_err(|err| EngineError::Task {
        message: format!("event sink: {err}"),
    })?;
    io_task.await.map_err(|err| EngineError::Task {
        message: format!("image service: {err}"),
    })?;

    let summary = result.map_err(EngineError::from)?;
    controller::log_run_end(&summary);

    info!(
        end_reason = ?summary.end_reason,
        events = consumed,
        "gol-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `gol-config.yaml` in the working directory.
///
/// Falls back to defaults (with environment overrides) when the file does
/// not exist. The flag reports whether the file was used.
fn load_config() -> Result<(GolConfig, bool), EngineError> {
    let config_path = Path::new("gol-config.yaml");
    if config_path.exists() {
        Ok((GolConfig::from_file(config_path)?, true))
    } else {
        let mut config = GolConfig::default();
        config.io.apply_env_overrides();
        Ok((config, false))
    }
}

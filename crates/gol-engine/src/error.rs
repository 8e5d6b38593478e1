//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the run.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: gol_core::config::ConfigError,
    },

    /// The turn controller ended the run abruptly.
    #[error("controller error: {source}")]
    Controller {
        /// The underlying controller error.
        #[from]
        source: gol_core::controller::ControllerError,
    },

    /// The keyboard reader thread could not be started.
    #[error("keyboard error: {source}")]
    Keyboard {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A background task (image service or event sink) failed.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}

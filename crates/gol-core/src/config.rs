//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `gol-config.yaml` next to the
//! binary's working directory. This module defines strongly-typed structs
//! that mirror the YAML structure and a loader that reads the file.
//!
//! Only [`Params`] reaches the turn controller; the remaining sections
//! configure the image service, logging and the event sink.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The parameters are outside their valid ranges.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GolConfig {
    /// Run parameters consumed by the turn controller.
    #[serde(default)]
    pub params: Params,

    /// Image service directories.
    #[serde(default)]
    pub io: IoConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event sink presentation.
    #[serde(default)]
    pub sink: SinkConfig,
}

impl GolConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override the image directories:
    /// - `GOL_IMAGES_DIR` overrides `io.images_dir`
    /// - `GOL_OUTPUT_DIR` overrides `io.output_dir`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.io.apply_env_overrides();
        Ok(config)
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Params {
    /// Number of turns to compute.
    #[serde(default = "default_turns")]
    pub turns: u64,

    /// Worker threads per step.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Grid width in cells.
    #[serde(default = "default_image_size")]
    pub image_width: usize,

    /// Grid height in cells.
    #[serde(default = "default_image_size")]
    pub image_height: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            threads: default_threads(),
            image_width: default_image_size(),
            image_height: default_image_size(),
        }
    }
}

impl Params {
    /// Check dimensions and thread count.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if either dimension is zero or the
    /// thread count is outside `1..=image_width`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "image dimensions must be non-zero (got {}x{})",
                    self.image_width, self.image_height
                ),
            });
        }
        if self.threads == 0 || self.threads > self.image_width {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "threads must be between 1 and the image width {} (got {})",
                    self.image_width, self.threads
                ),
            });
        }
        Ok(())
    }

    /// Name of the initial image: `{height}x{width}`.
    pub fn input_image_name(&self) -> String {
        format!("{}x{}", self.image_height, self.image_width)
    }

    /// Name of a snapshot taken at `turn`: `{height}x{width}x{turn}`.
    pub fn snapshot_name(&self, turn: u64) -> String {
        format!("{}x{}x{turn}", self.image_height, self.image_width)
    }
}

/// Image service directories.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IoConfig {
    /// Directory initial images are read from.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Directory snapshots are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl IoConfig {
    /// Override directories with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GOL_IMAGES_DIR") {
            self.images_dir = val;
        }
        if let Ok(val) = std::env::var("GOL_OUTPUT_DIR") {
            self.output_dir = val;
        }
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// How the binary presents events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkFormat {
    /// Structured log lines through `tracing`.
    #[default]
    Log,
    /// One JSON object per event on stdout.
    Json,
}

/// Event sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SinkConfig {
    /// Output format.
    #[serde(default)]
    pub format: SinkFormat,

    /// Capacity of the event channel between controller and sink.
    #[serde(default = "default_sink_buffer")]
    pub buffer: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            format: SinkFormat::default(),
            buffer: default_sink_buffer(),
        }
    }
}

const fn default_turns() -> u64 {
    10_000_000
}

const fn default_threads() -> usize {
    8
}

const fn default_image_size() -> usize {
    512
}

fn default_images_dir() -> String {
    String::from("images")
}

fn default_output_dir() -> String {
    String::from("out")
}

fn default_log_level() -> String {
    String::from("info")
}

const fn default_sink_buffer() -> usize {
    1024
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_uses_defaults() {
        let config: GolConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config.params, Params::default());
        assert_eq!(config.params.turns, 10_000_000);
        assert_eq!(config.params.threads, 8);
        assert_eq!(config.params.image_width, 512);
        assert_eq!(config.io.images_dir, "images");
        assert_eq!(config.io.output_dir, "out");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.sink.format, SinkFormat::Log);
        assert_eq!(config.sink.buffer, 1024);
    }

    #[test]
    fn partial_yaml_overrides() {
        let yaml = "params:\n  turns: 100\n  threads: 4\n  image_width: 64\n  image_height: 32\nsink:\n  format: json\n";
        let config: GolConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            config.params,
            Params {
                turns: 100,
                threads: 4,
                image_width: 64,
                image_height: 32,
            }
        );
        assert_eq!(config.sink.format, SinkFormat::Json);
        assert_eq!(config.sink.buffer, 1024);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        assert!(matches!(
            GolConfig::parse("params: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn validation_bounds_threads_by_width() {
        let mut params = Params {
            turns: 1,
            threads: 16,
            image_width: 16,
            image_height: 16,
        };
        assert!(params.validate().is_ok());
        params.threads = 17;
        assert!(params.validate().is_err());
        params.threads = 0;
        assert!(params.validate().is_err());
        params.threads = 1;
        params.image_height = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn image_names_are_height_first() {
        let params = Params {
            turns: 10,
            threads: 2,
            image_width: 64,
            image_height: 32,
        };
        assert_eq!(params.input_image_name(), "32x64");
        assert_eq!(params.snapshot_name(7), "32x64x7");
    }
}

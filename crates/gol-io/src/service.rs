//! The image service task and its handle.
//!
//! [`spawn_io`] starts one task that owns the filesystem side. Requests
//! arrive as [`IoCommand`]s over a bounded channel and are handled strictly
//! in arrival order, so a read issued after a write to the same name sees
//! the written image.
//!
//! Writes are fire-and-forget. A failed write is logged and remembered;
//! the next [`IoCommand::CheckIdle`] reports it and clears it. Because the
//! queue is ordered, a `CheckIdle` reply also means every earlier request
//! has finished. The task stops once every [`IoHandle`] is dropped.

use std::path::PathBuf;

use gol_core::config::IoConfig;
use gol_core::io::{ImageIo, IoError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::pgm;

/// Capacity of the command queue.
const COMMAND_BUFFER: usize = 64;

/// File extension of stored images.
const EXTENSION: &str = "pgm";

/// A request to the image service.
#[derive(Debug)]
pub enum IoCommand {
    /// Read `{images_dir}/{name}.pgm`.
    Input {
        /// Image name without extension.
        name: String,
        /// Receives the row-major cells or the failure.
        reply: oneshot::Sender<Result<Vec<bool>, IoError>>,
    },

    /// Write `{output_dir}/{name}.pgm`.
    Output {
        /// Image name without extension.
        name: String,
        /// Row-major cells.
        cells: Vec<bool>,
    },

    /// Reply once every earlier command has finished.
    CheckIdle {
        /// Receives the first write failure since the last check, if any.
        reply: oneshot::Sender<Result<(), IoError>>,
    },
}

/// Cloneable handle to a running image service.
#[derive(Debug, Clone)]
pub struct IoHandle {
    commands: mpsc::Sender<IoCommand>,
}

impl IoHandle {
    async fn send(&self, command: IoCommand) -> Result<(), IoError> {
        self.commands
            .send(command)
            .await
            .map_err(|_err| IoError::Stopped)
    }
}

impl ImageIo for IoHandle {
    async fn read_image(&mut self, name: &str) -> Result<Vec<bool>, IoError> {
        let (reply, response) = oneshot::channel();
        self.send(IoCommand::Input {
            name: name.to_owned(),
            reply,
        })
        .await?;
        response.await.map_err(|_err| IoError::Stopped)?
    }

    async fn write_image(&mut self, name: &str, cells: Vec<bool>) -> Result<(), IoError> {
        self.send(IoCommand::Output {
            name: name.to_owned(),
            cells,
        })
        .await
    }

    async fn wait_idle(&mut self) -> Result<(), IoError> {
        let (reply, response) = oneshot::channel();
        self.send(IoCommand::CheckIdle { reply }).await?;
        response.await.map_err(|_err| IoError::Stopped)?
    }
}

/// Start the image service for grids of `width` x `height`.
///
/// Returns the handle used to issue commands and the service task, which
/// finishes after every handle has been dropped.
pub fn spawn_io(config: IoConfig, width: usize, height: usize) -> (IoHandle, JoinHandle<()>) {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let service = IoService {
        images_dir: PathBuf::from(config.images_dir),
        output_dir: PathBuf::from(config.output_dir),
        width,
        height,
        commands: receiver,
        deferred: None,
    };
    let task = tokio::spawn(service.run());
    (IoHandle { commands }, task)
}

struct IoService {
    images_dir: PathBuf,
    output_dir: PathBuf,
    width: usize,
    height: usize,
    commands: mpsc::Receiver<IoCommand>,
    /// First write failure since the last idle check.
    deferred: Option<IoError>,
}

impl IoService {
    async fn run(mut self) {
        debug!(
            images_dir = %self.images_dir.display(),
            output_dir = %self.output_dir.display(),
            "Image service started"
        );

        while let Some(command) = self.commands.recv().await {
            match command {
                IoCommand::Input { name, reply } => {
                    let result = self.input(name).await;
                    if reply.send(result).is_err() {
                        debug!("Read requester went away");
                    }
                }
                IoCommand::Output { name, cells } => {
                    if let Err(err) = self.output(&name, &cells).await {
                        warn!(name = %name, error = %err, "Image write failed");
                        if self.deferred.is_none() {
                            self.deferred = Some(err);
                        }
                    }
                }
                IoCommand::CheckIdle { reply } => {
                    let result = self.deferred.take().map_or(Ok(()), Err);
                    if reply.send(result).is_err() {
                        debug!("Idle requester went away");
                    }
                }
            }
        }

        debug!("Image service stopped");
    }

    async fn input(&self, name: String) -> Result<Vec<bool>, IoError> {
        let path = self.images_dir.join(&name).with_extension(EXTENSION);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(IoError::NotFound { name });
            }
            Err(source) => return Err(IoError::Read { name, source }),
        };

        let image = pgm::decode(&bytes).map_err(|err| IoError::Malformed {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        if image.width != self.width || image.height != self.height {
            return Err(IoError::DimensionMismatch {
                name,
                width: self.width,
                height: self.height,
                actual_width: image.width,
                actual_height: image.height,
            });
        }

        debug!(name = %name, path = %path.display(), "Image read");
        Ok(image.cells)
    }

    async fn output(&self, name: &str, cells: &[bool]) -> Result<(), IoError> {
        let bytes = pgm::encode(self.width, self.height, cells).map_err(|err| {
            IoError::Malformed {
                name: name.to_owned(),
                reason: err.to_string(),
            }
        })?;
        let write_error = |source| IoError::Write {
            name: name.to_owned(),
            source,
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(write_error)?;
        let path = self.output_dir.join(name).with_extension(EXTENSION);
        tokio::fs::write(&path, bytes).await.map_err(write_error)?;

        debug!(name = %name, path = %path.display(), "Image written");
        Ok(())
    }
}

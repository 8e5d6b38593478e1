//! The image I/O collaborator used by the turn controller.
//!
//! [`ImageIo`] is the seam between the controller and whatever stores
//! images. Cells cross it as row-major `Vec<bool>` (true = alive), the same
//! order images are streamed in. Writes may be queued; [`ImageIo::wait_idle`]
//! is the point at which every earlier request is known to have finished.
//!
//! [`MemoryImageIo`] keeps images in memory and records every request. The
//! binary uses the PGM-backed service from `gol-io` instead.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Errors reported by an image I/O collaborator.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// No image exists under the requested name.
    #[error("image {name} not found")]
    NotFound {
        /// Requested image name.
        name: String,
    },

    /// The image exists but could not be read.
    #[error("failed to read image {name}: {source}")]
    Read {
        /// Image name.
        name: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A queued write failed. Reported by the next idle check.
    #[error("failed to write image {name}: {source}")]
    Write {
        /// Image name.
        name: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The image content is not a valid image.
    #[error("image {name} is malformed: {reason}")]
    Malformed {
        /// Image name.
        name: String,
        /// What is wrong with the content.
        reason: String,
    },

    /// The image dimensions differ from the configured grid.
    #[error("image {name} is {actual_width}x{actual_height}, expected {width}x{height}")]
    DimensionMismatch {
        /// Image name.
        name: String,
        /// Configured width.
        width: usize,
        /// Configured height.
        height: usize,
        /// Width found in the image.
        actual_width: usize,
        /// Height found in the image.
        actual_height: usize,
    },

    /// The service behind the handle has shut down.
    #[error("image service stopped")]
    Stopped,
}

/// Loads and persists grid images by name.
pub trait ImageIo: Send {
    /// Read the image `name` as row-major cell states.
    fn read_image(&mut self, name: &str)
    -> impl Future<Output = Result<Vec<bool>, IoError>> + Send;

    /// Request that `cells` (row-major) be persisted as `name`.
    ///
    /// Implementations may return before the write has finished.
    fn write_image(
        &mut self,
        name: &str,
        cells: Vec<bool>,
    ) -> impl Future<Output = Result<(), IoError>> + Send;

    /// Wait until every earlier request has finished.
    fn wait_idle(&mut self) -> impl Future<Output = Result<(), IoError>> + Send;
}

/// A request observed by [`MemoryImageIo`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoOp {
    /// `read_image(name)`.
    Read(String),
    /// `write_image(name, ..)`.
    Write(String),
    /// `wait_idle()`.
    Idle,
}

#[derive(Debug, Default)]
struct MemoryState {
    images: HashMap<String, Vec<bool>>,
    operations: Vec<IoOp>,
}

/// In-memory [`ImageIo`] that records every request.
///
/// Clones share the same store, so a caller can keep one clone to inspect
/// what the controller wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryImageIo {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryImageIo {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-loaded with row-major images.
    pub fn from_images<I>(images: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<bool>)>,
    {
        let state = MemoryState {
            images: images.into_iter().collect(),
            operations: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Every request made so far, in order.
    pub async fn operations(&self) -> Vec<IoOp> {
        self.state.lock().await.operations.clone()
    }

    /// The stored image `name`, if any.
    pub async fn image(&self, name: &str) -> Option<Vec<bool>> {
        self.state.lock().await.images.get(name).cloned()
    }
}

impl ImageIo for MemoryImageIo {
    async fn read_image(&mut self, name: &str) -> Result<Vec<bool>, IoError> {
        let mut state = self.state.lock().await;
        state.operations.push(IoOp::Read(name.to_owned()));
        state
            .images
            .get(name)
            .cloned()
            .ok_or_else(|| IoError::NotFound {
                name: name.to_owned(),
            })
    }

    async fn write_image(&mut self, name: &str, cells: Vec<bool>) -> Result<(), IoError> {
        let mut state = self.state.lock().await;
        state.operations.push(IoOp::Write(name.to_owned()));
        state.images.insert(name.to_owned(), cells);
        Ok(())
    }

    async fn wait_idle(&mut self) -> Result<(), IoError> {
        self.state.lock().await.operations.push(IoOp::Idle);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_io_records_requests_in_order() {
        let mut io = MemoryImageIo::from_images([(String::from("2x2"), vec![true, false, false, true])]);
        let observer = io.clone();

        assert_eq!(io.read_image("2x2").await.unwrap(), vec![true, false, false, true]);
        io.write_image("2x2x1", vec![false; 4]).await.unwrap();
        io.wait_idle().await.unwrap();

        assert_eq!(
            observer.operations().await,
            vec![
                IoOp::Read(String::from("2x2")),
                IoOp::Write(String::from("2x2x1")),
                IoOp::Idle,
            ]
        );
        assert_eq!(observer.image("2x2x1").await, Some(vec![false; 4]));
    }

    #[tokio::test]
    async fn missing_image_is_not_found() {
        let mut io = MemoryImageIo::new();
        let err = io.read_image("8x8").await.unwrap_err();
        assert!(matches!(err, IoError::NotFound { ref name } if name == "8x8"));
    }
}

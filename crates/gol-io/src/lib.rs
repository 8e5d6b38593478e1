//! Image I/O service for the Game of Life engine.
//!
//! Initial grids are read from and snapshots written to binary PGM files.
//! One tokio task owns the filesystem work and processes commands strictly
//! in order; callers talk to it through a cloneable [`IoHandle`] that
//! implements the controller's [`ImageIo`] trait.
//!
//! # Modules
//!
//! - [`error`] -- [`PgmError`] for malformed image content.
//! - [`pgm`] -- Binary PGM (`P5`) encoding and decoding.
//! - [`service`] -- The command queue, its task, and [`spawn_io`].
//!
//! [`ImageIo`]: gol_core::io::ImageIo
//! [`PgmError`]: error::PgmError
//! [`IoHandle`]: service::IoHandle
//! [`spawn_io`]: service::spawn_io

pub mod error;
pub mod pgm;
pub mod service;

pub use service::{IoHandle, spawn_io};

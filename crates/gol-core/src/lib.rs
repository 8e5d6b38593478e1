//! Grid, parallel step engine, and turn controller for the Game of Life
//! engine.
//!
//! This crate owns the simulation itself: a toroidal grid, a
//! double-buffered engine that computes each turn across a fixed set of
//! worker threads, and the controller that drives it turn by turn while
//! servicing control signals and streaming events.
//!
//! # Modules
//!
//! - [`grid`] -- Toroidal [`Grid`] with neighbour counting and the
//!   life rule.
//! - [`engine`] -- [`StepEngine`] and column partitioning.
//! - [`clock`] -- Bounded turn counter.
//! - [`controller`] -- [`TurnController`], the turn loop.
//! - [`io`] -- [`ImageIo`] collaborator trait and an in-memory store.
//! - [`compute`] -- Stateless single-call compute delegate.
//! - [`config`] -- Configuration loading from `gol-config.yaml` into
//!   strongly-typed structs.
//!
//! [`Grid`]: grid::Grid
//! [`StepEngine`]: engine::StepEngine
//! [`TurnController`]: controller::TurnController
//! [`ImageIo`]: io::ImageIo

pub mod clock;
pub mod compute;
pub mod config;
pub mod controller;
pub mod engine;
pub mod grid;
pub mod io;

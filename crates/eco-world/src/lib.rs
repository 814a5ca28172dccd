//! World simulation engine.
//!
//! This module implements the 2D grid where grass grows and rabbits and foxes
//! forage, hunt, breed and die, one four-phase tick at a time.

pub mod cell;
pub mod grid;
pub mod pipeline;
pub mod snapshot;
pub mod world;

pub use cell::Cell;
pub use grid::Grid;
pub use pipeline::{Phase, PhaseReport, TickReport};
pub use snapshot::WorldSnapshot;
pub use world::World;

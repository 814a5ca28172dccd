//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cannot seed {requested} animals on a grid with {capacity} tiles")]
    OverCapacity { requested: usize, capacity: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

//! Core types and utilities for the predator-prey grid ecosystem.

pub mod types;
pub mod config;
pub mod error;
pub mod population;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use population::*;

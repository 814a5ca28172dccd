//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 2D position in the world. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared Euclidean distance to another position
    pub fn distance_squared(&self, other: &Position) -> i32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Chebyshev distance; 1 means the positions are Moore neighbors
    pub fn chebyshev_distance(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Row-major ordering: smaller row first, then smaller column.
impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.y, self.x)
    }
}

/// Grass maturity of a tile, ordered by growth
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum GroundStage {
    #[default]
    Empty,
    Short,
    Medium,
    Tall,
}

impl GroundStage {
    pub const ALL: [GroundStage; 4] = [
        GroundStage::Empty,
        GroundStage::Short,
        GroundStage::Medium,
        GroundStage::Tall,
    ];

    /// Grass amount used when a tile is eaten whole
    pub fn value(self) -> u32 {
        match self {
            GroundStage::Empty => 0,
            GroundStage::Short => 1,
            GroundStage::Medium => 2,
            GroundStage::Tall => 3,
        }
    }

    pub fn has_grass(self) -> bool {
        self > GroundStage::Empty
    }

    /// Next growth stage; `Tall` stays `Tall`
    pub fn grown(self) -> Self {
        match self {
            GroundStage::Empty => GroundStage::Short,
            GroundStage::Short => GroundStage::Medium,
            GroundStage::Medium | GroundStage::Tall => GroundStage::Tall,
        }
    }

    /// One stage down after a partial bite; `Empty` stays `Empty`
    pub fn bitten(self) -> Self {
        match self {
            GroundStage::Tall => GroundStage::Medium,
            GroundStage::Medium => GroundStage::Short,
            GroundStage::Short | GroundStage::Empty => GroundStage::Empty,
        }
    }
}

/// The animal (if any) on a tile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    #[default]
    None,
    Rabbit,
    Fox,
}

impl Occupant {
    pub fn is_none(self) -> bool {
        self == Occupant::None
    }

    pub fn species(self) -> Option<Species> {
        match self {
            Occupant::None => None,
            Occupant::Rabbit => Some(Species::Rabbit),
            Occupant::Fox => Some(Species::Fox),
        }
    }
}

/// Animal species and their behavioral constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Rabbit,
    Fox,
}

impl Species {
    /// Energy gained by a fox per rabbit eaten
    pub const PREY_ENERGY: f64 = 20.0;
    /// Energy gained by a rabbit taking a partial bite
    pub const BITE_ENERGY: f64 = 6.0;
    /// Energy per grass stage when a rabbit eats a whole tile
    pub const GRASS_ENERGY_PER_STAGE: f64 = 8.0;

    pub fn occupant(self) -> Occupant {
        match self {
            Species::Rabbit => Occupant::Rabbit,
            Species::Fox => Occupant::Fox,
        }
    }

    /// Minimum energy to reproduce; below it the animal looks for food
    pub fn reproduce_energy(self) -> f64 {
        match self {
            Species::Rabbit => 14.0,
            Species::Fox => 28.0,
        }
    }

    pub fn starving_energy(self) -> f64 {
        self.reproduce_energy() / 2.0
    }

    /// Cooldown given to both parent and offspring after a birth
    pub fn reproduce_cooldown(self) -> u32 {
        match self {
            Species::Rabbit => 6,
            Species::Fox => 10,
        }
    }

    /// Energy of animals placed at world creation
    pub fn initial_energy(self) -> f64 {
        match self {
            Species::Rabbit => 10.0,
            Species::Fox => 20.0,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Rabbit => write!(f, "rabbit"),
            Species::Fox => write!(f, "fox"),
        }
    }
}

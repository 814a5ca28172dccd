//! Per-tile state: ground cover plus the occupant layer.

use eco_core::{GroundStage, Occupant, Species};
use serde::{Deserialize, Serialize};

/// A single tile of the world.
///
/// `energy`, `reproduce_cooldown` and `age` belong to the occupant and are
/// zero whenever `occupant` is `Occupant::None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub ground: GroundStage,
    pub occupant: Occupant,
    pub energy: f64,
    pub reproduce_cooldown: u32,
    pub age: u32,
}

impl Cell {
    pub fn vacant(ground: GroundStage) -> Self {
        Self {
            ground,
            ..Default::default()
        }
    }

    pub fn animal(species: Species, ground: GroundStage, energy: f64) -> Self {
        Self {
            ground,
            occupant: species.occupant(),
            energy,
            reproduce_cooldown: 0,
            age: 0,
        }
    }

    /// A newborn: starts on the species cooldown so it cannot breed at once
    pub fn offspring(species: Species, ground: GroundStage, energy: f64) -> Self {
        Self {
            reproduce_cooldown: species.reproduce_cooldown(),
            ..Self::animal(species, ground, energy)
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn species(&self) -> Option<Species> {
        self.occupant.species()
    }

    pub fn can_reproduce(&self) -> bool {
        !self.is_vacant() && self.reproduce_cooldown == 0
    }

    /// Move the occupant layer of `animal` onto this tile. Ground is kept.
    pub fn occupy_with(&mut self, animal: &Cell) {
        self.occupant = animal.occupant;
        self.energy = animal.energy;
        self.reproduce_cooldown = animal.reproduce_cooldown;
        self.age = animal.age;
    }

    /// Clear the occupant layer. Ground is kept.
    pub fn vacate(&mut self) {
        *self = Self::vacant(self.ground);
    }
}

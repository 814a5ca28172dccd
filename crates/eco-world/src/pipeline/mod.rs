//! The four ordered phases applied once per tick.
//!
//! Movement phases read the grid as it was when the phase started and write
//! into a fresh copy, so no animal reacts to another animal that already
//! moved this tick. A target tile must be vacant in both buffers before
//! anything is written to it, which keeps one occupant per tile.

mod foxes;
mod grass;
mod rabbits;
mod upkeep;

pub use foxes::HuntReason;

use crate::cell::Cell;
use crate::grid::Grid;
use eco_core::{GroundStage, PopulationSample, Position, Species};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::trace;

/// A stage of the tick pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    GrowGrass,
    MoveRabbits,
    MoveFoxes,
    UpdateEnergy,
}

impl Phase {
    /// Execution order within a tick
    pub const PIPELINE: [Phase; 4] = [
        Phase::GrowGrass,
        Phase::MoveRabbits,
        Phase::MoveFoxes,
        Phase::UpdateEnergy,
    ];

    pub(crate) fn apply(
        self,
        grid: &mut Grid,
        growth_rate: f64,
        rng: &mut ChaCha8Rng,
    ) -> PhaseReport {
        match self {
            Phase::GrowGrass => grass::grow_grass(grid, growth_rate, rng),
            Phase::MoveRabbits => rabbits::move_rabbits(grid, rng),
            Phase::MoveFoxes => foxes::move_foxes(grid, rng),
            Phase::UpdateEnergy => upkeep::update_energy(grid),
        }
    }
}

/// Counters collected while running one or more phases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    /// Tiles that advanced one grass stage
    pub grass_grown: usize,
    /// Grass stages removed by grazing
    pub grass_eaten: usize,
    pub rabbits_born: usize,
    pub foxes_born: usize,
    /// Rabbits eaten by foxes
    pub kills: usize,
    /// Animals that starved in the upkeep phase
    pub deaths: usize,
    /// Relocations of any kind (flee, forage, hunt, wander)
    pub moves: usize,
}

impl PhaseReport {
    pub fn births(&self) -> usize {
        self.rabbits_born + self.foxes_born
    }

    pub(crate) fn record_birth(&mut self, species: Species) {
        match species {
            Species::Rabbit => self.rabbits_born += 1,
            Species::Fox => self.foxes_born += 1,
        }
    }
}

impl AddAssign for PhaseReport {
    fn add_assign(&mut self, other: Self) {
        self.grass_grown += other.grass_grown;
        self.grass_eaten += other.grass_eaten;
        self.rabbits_born += other.rabbits_born;
        self.foxes_born += other.foxes_born;
        self.kills += other.kills;
        self.deaths += other.deaths;
        self.moves += other.moves;
    }
}

/// Result of one full tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub tick: u64,
    pub phases: PhaseReport,
    pub population: PopulationSample,
}

/// Read/write buffer pair used by the movement phases
pub(crate) struct MoveBuffers {
    before: Grid,
    after: Grid,
}

impl MoveBuffers {
    pub(crate) fn new(grid: &Grid) -> Self {
        Self {
            before: grid.clone(),
            after: grid.clone(),
        }
    }

    pub(crate) fn before(&self) -> &Grid {
        &self.before
    }

    /// Tile state as already written this phase
    pub(crate) fn written(&self, pos: Position) -> &Cell {
        self.after.get(pos)
    }

    pub(crate) fn finish(self) -> Grid {
        self.after
    }

    /// Positions in a random visiting order
    pub(crate) fn shuffled_positions(&self, rng: &mut ChaCha8Rng) -> Vec<Position> {
        let mut order: Vec<Position> = self.before.positions().collect();
        order.shuffle(rng);
        order
    }

    /// Neighbors of `pos` in random order, for tie-breaking
    pub(crate) fn shuffled_neighbors(&self, pos: Position, rng: &mut ChaCha8Rng) -> Vec<Position> {
        let mut neighbors = self.before.neighbors(pos);
        neighbors.shuffle(rng);
        neighbors
    }

    /// Vacant at phase start and not claimed by a move this phase
    pub(crate) fn is_free(&self, pos: Position) -> bool {
        self.before.get(pos).is_vacant() && self.after.get(pos).is_vacant()
    }

    pub(crate) fn first_free(&self, candidates: &[Position]) -> Option<Position> {
        candidates.iter().copied().find(|&p| self.is_free(p))
    }

    /// Write `animal` onto `to` and vacate `from`, keeping both grounds
    pub(crate) fn relocate(&mut self, from: Position, to: Position, animal: &Cell) {
        self.after.get_mut(to).occupy_with(animal);
        self.after.get_mut(from).vacate();
    }

    /// Write the updated occupant layer back onto its own tile
    pub(crate) fn stay(&mut self, pos: Position, animal: &Cell) {
        self.after.get_mut(pos).occupy_with(animal);
    }

    pub(crate) fn set_ground(&mut self, pos: Position, ground: GroundStage) {
        self.after.get_mut(pos).ground = ground;
    }

    /// Breeding shared by both species.
    ///
    /// Needs energy at the species threshold and a neighbor of the same
    /// species with zero cooldown. Of such a pair only the row-major smaller
    /// position initiates, so a pair yields at most one birth. The newborn
    /// takes half the initiator's energy and lands on a free neighbor of the
    /// initiator. Returns the newborn's position.
    pub(crate) fn try_reproduce(
        &mut self,
        species: Species,
        pos: Position,
        animal: &mut Cell,
        neighbors: &[Position],
    ) -> Option<Position> {
        if animal.energy < species.reproduce_energy() {
            return None;
        }

        let has_partner = neighbors.iter().any(|&n| {
            let other = self.before.get(n);
            other.species() == Some(species) && other.reproduce_cooldown == 0 && pos < n
        });
        if !has_partner {
            return None;
        }

        let nursery = self.first_free(neighbors)?;
        let child_energy = animal.energy / 2.0;

        animal.energy = child_energy;
        animal.reproduce_cooldown = species.reproduce_cooldown();
        animal.age += 1;

        let ground = self.after.get(nursery).ground;
        self.after.set(nursery, Cell::offspring(species, ground, child_energy));
        self.stay(pos, animal);

        trace!(
            event = "birth",
            species = %species,
            parent = %pos,
            child = %nursery,
            child_energy = child_energy,
            "Animal reproduced"
        );

        Some(nursery)
    }

    /// Move to the first free tile of an already shuffled neighbor list
    pub(crate) fn try_wander(
        &mut self,
        pos: Position,
        animal: &mut Cell,
        neighbors: &[Position],
    ) -> Option<Position> {
        let target = self.first_free(neighbors)?;
        animal.age += 1;
        self.relocate(pos, target, animal);
        Some(target)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use rand::SeedableRng;

    pub fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    pub fn place(grid: &mut Grid, x: i32, y: i32, species: Species, energy: f64) {
        let pos = Position::new(x, y);
        let ground = grid.get(pos).ground;
        grid.set(pos, Cell::animal(species, ground, energy));
    }

    pub fn bare(width: i32, height: i32) -> Grid {
        Grid::new(width, height)
    }

    pub fn carpeted(width: i32, height: i32, ground: GroundStage) -> Grid {
        let mut grid = Grid::new(width, height);
        for cell in grid.cells_mut() {
            cell.ground = ground;
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_pipeline_order() {
        assert_eq!(
            Phase::PIPELINE,
            [
                Phase::GrowGrass,
                Phase::MoveRabbits,
                Phase::MoveFoxes,
                Phase::UpdateEnergy
            ]
        );
    }

    #[test]
    fn test_report_accumulates() {
        let mut total = PhaseReport::default();
        total += PhaseReport {
            rabbits_born: 2,
            kills: 1,
            ..Default::default()
        };
        total += PhaseReport {
            foxes_born: 1,
            deaths: 3,
            ..Default::default()
        };
        assert_eq!(total.births(), 3);
        assert_eq!(total.kills, 1);
        assert_eq!(total.deaths, 3);
    }

    #[test]
    fn test_claimed_tile_is_not_free() {
        let mut grid = bare(3, 1);
        place(&mut grid, 0, 0, Species::Rabbit, 5.0);
        let mut buffers = MoveBuffers::new(&grid);

        let rabbit = *buffers.before().get(Position::new(0, 0));
        assert!(buffers.is_free(Position::new(1, 0)));
        buffers.relocate(Position::new(0, 0), Position::new(1, 0), &rabbit);

        // Claimed in the output, so nobody else may land there
        assert!(!buffers.is_free(Position::new(1, 0)));
        // Vacated this phase, but still occupied at phase start
        assert!(!buffers.is_free(Position::new(0, 0)));
        assert!(buffers.is_free(Position::new(2, 0)));
    }
}

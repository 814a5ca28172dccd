//! Immutable copies of the world handed to renderers and other consumers.

use crate::cell::Cell;
use crate::grid::Grid;
use eco_core::{GroundStage, Occupant, PopulationSample, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value copy of the grid after a tick. The engine never touches it again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl WorldSnapshot {
    pub fn capture(tick: u64, grid: &Grid) -> Self {
        Self {
            tick,
            width: grid.width,
            height: grid.height,
            cells: grid.cells().to_vec(),
        }
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        if pos.x < 0 || pos.x >= self.width || pos.y < 0 || pos.y >= self.height {
            return None;
        }
        self.cells
            .get(pos.y as usize * self.width as usize + pos.x as usize)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Rows of cells, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width.max(1) as usize)
    }

    pub fn population(&self) -> PopulationSample {
        let count = |occupant| self.cells.iter().filter(|c| c.occupant == occupant).count();
        PopulationSample::new(self.tick, count(Occupant::Rabbit), count(Occupant::Fox))
    }
}

fn glyph(cell: &Cell) -> char {
    match (cell.occupant, cell.ground) {
        (Occupant::Rabbit, _) => 'r',
        (Occupant::Fox, _) => 'F',
        (Occupant::None, GroundStage::Empty) => '.',
        (Occupant::None, GroundStage::Short) => ',',
        (Occupant::None, GroundStage::Medium) => ';',
        (Occupant::None, GroundStage::Tall) => '#',
    }
}

/// One character per tile, one line per row.
impl fmt::Display for WorldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(glyph).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eco_core::Species;

    fn sample_grid() -> Grid {
        let mut grid = Grid::new(3, 2);
        grid.get_mut(Position::new(1, 0)).ground = GroundStage::Tall;
        grid.get_mut(Position::new(2, 1)).ground = GroundStage::Short;
        grid.set(
            Position::new(0, 1),
            Cell::animal(Species::Rabbit, GroundStage::Medium, 10.0),
        );
        grid.set(
            Position::new(2, 0),
            Cell::animal(Species::Fox, GroundStage::Empty, 20.0),
        );
        grid
    }

    #[test]
    fn test_render() {
        let snapshot = WorldSnapshot::capture(4, &sample_grid());
        assert_eq!(snapshot.to_string(), ".#F\nr.,\n");
    }

    #[test]
    fn test_population_and_lookup() {
        let snapshot = WorldSnapshot::capture(4, &sample_grid());
        assert_eq!(snapshot.population(), PopulationSample::new(4, 1, 1));
        assert_eq!(
            snapshot.get(Position::new(0, 1)).map(|c| c.occupant),
            Some(Occupant::Rabbit)
        );
        assert!(snapshot.get(Position::new(3, 0)).is_none());
        assert!(snapshot.get(Position::new(0, -1)).is_none());
    }

    #[test]
    fn test_snapshot_is_detached_from_grid() {
        let mut grid = sample_grid();
        let snapshot = WorldSnapshot::capture(1, &grid);
        grid.get_mut(Position::new(0, 1)).vacate();

        assert_eq!(snapshot.population().rabbits, 1);
        assert_eq!(grid.count(Occupant::Rabbit), 0);
    }
}

//! 2D bounded grid for the world.

use crate::cell::Cell;
use eco_core::{GroundStage, Occupant, Position};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A 2D grid of cells, stored row-major. Edges do not wrap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid of bare ground with no animals
    pub fn new(width: i32, height: i32) -> Self {
        let size = width.max(0) as usize * height.max(0) as usize;
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    /// A grid covered in grass of uniformly random maturity
    pub fn with_random_grass(width: i32, height: i32, rng: &mut ChaCha8Rng) -> Self {
        let mut grid = Self::new(width, height);

        for cell in &mut grid.cells {
            let roll = rng.gen::<f64>();
            cell.ground = if roll < 0.33 {
                GroundStage::Short
            } else if roll < 0.66 {
                GroundStage::Medium
            } else {
                GroundStage::Tall
            };
        }

        grid
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Get cell at position.
    ///
    /// Panics if `pos` is outside the grid; callers only pass positions
    /// obtained from `positions` or `neighbors`.
    pub fn get(&self, pos: Position) -> &Cell {
        let index = self.pos_to_index(pos);
        &self.cells[index]
    }

    /// Get mutable cell at position
    pub fn get_mut(&mut self, pos: Position) -> &mut Cell {
        let index = self.pos_to_index(pos);
        &mut self.cells[index]
    }

    /// Set cell at position
    pub fn set(&mut self, pos: Position, cell: Cell) {
        let index = self.pos_to_index(pos);
        self.cells[index] = cell;
    }

    /// Moore neighborhood of a position, clipped at the grid edges
    pub fn neighbors(&self, pos: Position) -> Vec<Position> {
        let mut neighbors = Vec::with_capacity(8);

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }

                let neighbor_pos = pos.add(dx, dy);
                if self.contains(neighbor_pos) {
                    neighbors.push(neighbor_pos);
                }
            }
        }

        neighbors
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        debug_assert!(self.contains(pos), "position {pos} outside grid");
        pos.y as usize * self.width as usize + pos.x as usize
    }

    /// Get position from index
    pub fn index_to_pos(&self, index: usize) -> Position {
        let width = self.width as usize;
        Position::new((index % width) as i32, (index / width) as i32)
    }

    /// Tiles implied by the dimensions; equals `len` for a well-formed grid
    pub fn area(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterator over all positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.cells.len()).map(move |i| self.index_to_pos(i))
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.index_to_pos(i), cell))
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Number of tiles holding the given occupant
    pub fn count(&self, occupant: Occupant) -> usize {
        self.cells.iter().filter(|c| c.occupant == occupant).count()
    }
}

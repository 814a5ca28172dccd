//! The live world: grid, growth rate, random source and tick counter.

use crate::cell::Cell;
use crate::grid::Grid;
use crate::pipeline::{Phase, PhaseReport, TickReport};
use crate::snapshot::WorldSnapshot;
use eco_core::{Error, Occupant, PopulationSample, Result, SimParams, Species};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument, trace};

pub struct World {
    grid: Grid,
    grass_growth_rate: f64,
    rng: ChaCha8Rng,
    tick: u64,
}

impl World {
    /// Build a world from validated parameters.
    ///
    /// Every tile starts with grass of random maturity. Animals are placed
    /// on distinct tiles, rabbits first, then foxes.
    #[instrument(skip(params), fields(width = params.width, height = params.height))]
    pub fn new(params: &SimParams) -> Result<Self> {
        params.validate()?;

        let mut rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut grid = Grid::with_random_grass(params.width, params.height, &mut rng);

        let requested = params.rabbits + params.foxes;
        let spots = rand::seq::index::sample(&mut rng, grid.len(), requested);
        for (i, index) in spots.iter().enumerate() {
            let species = if i < params.rabbits {
                Species::Rabbit
            } else {
                Species::Fox
            };
            let pos = grid.index_to_pos(index);
            let ground = grid.get(pos).ground;
            grid.set(pos, Cell::animal(species, ground, species.initial_energy()));
        }

        info!(
            rabbits = params.rabbits,
            foxes = params.foxes,
            grass_growth_rate = params.grass_growth_rate,
            seed = ?params.seed,
            "World created"
        );

        Ok(Self {
            grid,
            grass_growth_rate: params.grass_growth_rate,
            rng,
            tick: 0,
        })
    }

    /// Wrap a hand-built grid, e.g. a saved layout or a test scenario.
    /// The cell count must match the dimensions.
    pub fn from_grid(grid: Grid, grass_growth_rate: f64, seed: u64) -> Result<Self> {
        SimParams {
            width: grid.width,
            height: grid.height,
            rabbits: 0,
            foxes: 0,
            grass_growth_rate,
            seed: Some(seed),
        }
        .validate()?;

        if grid.len() != grid.area() {
            return Err(Error::InvalidState(format!(
                "grid holds {} cells, expected {} for {}x{}",
                grid.len(),
                grid.area(),
                grid.width,
                grid.height
            )));
        }

        Ok(Self {
            grid,
            grass_growth_rate,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
        })
    }

    /// Run the full pipeline once
    pub fn step(&mut self) -> TickReport {
        let mut phases = PhaseReport::default();
        for phase in Phase::PIPELINE {
            phases += self.run_phase(phase);
        }
        self.tick += 1;

        let population = self.population();
        trace!(
            tick = self.tick,
            rabbits = population.rabbits,
            foxes = population.foxes,
            births = phases.births(),
            kills = phases.kills,
            deaths = phases.deaths,
            "Tick complete"
        );

        TickReport {
            tick: self.tick,
            phases,
            population,
        }
    }

    /// Apply a single phase without advancing the tick counter
    pub fn run_phase(&mut self, phase: Phase) -> PhaseReport {
        phase.apply(&mut self.grid, self.grass_growth_rate, &mut self.rng)
    }

    pub fn population(&self) -> PopulationSample {
        PopulationSample::new(
            self.tick,
            self.grid.count(Occupant::Rabbit),
            self.grid.count(Occupant::Fox),
        )
    }

    pub fn is_extinct(&self) -> bool {
        self.population().is_extinct()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.tick, &self.grid)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn grass_growth_rate(&self) -> f64 {
        self.grass_growth_rate
    }
}

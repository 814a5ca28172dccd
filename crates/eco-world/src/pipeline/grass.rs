use super::PhaseReport;
use crate::grid::Grid;
use eco_core::GroundStage;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Advance grass one stage with probability `rate` per tile.
///
/// Bare ground only sprouts next to a tile that already has grass, judged
/// on the ground layer as it was at phase start. Tall grass stays tall.
pub(crate) fn grow_grass(grid: &mut Grid, rate: f64, rng: &mut ChaCha8Rng) -> PhaseReport {
    let before = grid.clone();
    let mut report = PhaseReport::default();

    for (pos, cell) in before.iter() {
        let can_grow = match cell.ground {
            GroundStage::Empty => before
                .neighbors(pos)
                .iter()
                .any(|&n| before.get(n).ground.has_grass()),
            GroundStage::Short | GroundStage::Medium => true,
            GroundStage::Tall => false,
        };

        if can_grow && rng.gen::<f64>() < rate {
            grid.get_mut(pos).ground = cell.ground.grown();
            report.grass_grown += 1;
        }
    }

    report
}

use super::{MoveBuffers, PhaseReport};
use crate::cell::Cell;
use crate::grid::Grid;
use eco_core::{GroundStage, Occupant, Position, Species};
use rand_chacha::ChaCha8Rng;

/// Rabbits act in random order: flee, forage, reproduce or wander,
/// whichever applies first. Rabbits on cooldown sit still.
pub(crate) fn move_rabbits(grid: &mut Grid, rng: &mut ChaCha8Rng) -> PhaseReport {
    let mut buffers = MoveBuffers::new(grid);
    let mut report = PhaseReport::default();

    for pos in buffers.shuffled_positions(rng) {
        let mut rabbit = *buffers.before().get(pos);
        if rabbit.occupant != Occupant::Rabbit || rabbit.reproduce_cooldown > 0 {
            continue;
        }

        let neighbors = buffers.shuffled_neighbors(pos, rng);

        if flee(&mut buffers, pos, &mut rabbit, &neighbors).is_some() {
            report.moves += 1;
        } else if let Some(eaten) = forage(&mut buffers, pos, &mut rabbit, &neighbors) {
            report.moves += 1;
            report.grass_eaten += eaten as usize;
        } else if buffers
            .try_reproduce(Species::Rabbit, pos, &mut rabbit, &neighbors)
            .is_some()
        {
            report.record_birth(Species::Rabbit);
        } else if buffers.try_wander(pos, &mut rabbit, &neighbors).is_some() {
            report.moves += 1;
        }
    }

    *grid = buffers.finish();
    report
}

/// Maximin escape: among free neighbors pick the one whose nearest
/// adjacent fox is farthest away. The first maximum wins.
fn flee(
    buffers: &mut MoveBuffers,
    pos: Position,
    rabbit: &mut Cell,
    neighbors: &[Position],
) -> Option<Position> {
    let foxes: Vec<Position> = neighbors
        .iter()
        .copied()
        .filter(|&n| buffers.before().get(n).occupant == Occupant::Fox)
        .collect();
    if foxes.is_empty() {
        return None;
    }

    let mut best: Option<(i32, Position)> = None;
    for &candidate in neighbors {
        if !buffers.is_free(candidate) {
            continue;
        }

        let nearest_fox = foxes
            .iter()
            .map(|fox| candidate.distance_squared(fox))
            .min()
            .unwrap_or(i32::MAX);

        if best.map_or(true, |(distance, _)| nearest_fox > distance) {
            best = Some((nearest_fox, candidate));
        }
    }

    let (_, target) = best?;
    rabbit.age += 1;
    buffers.relocate(pos, target, rabbit);
    Some(target)
}

/// Hungry rabbits step onto a free grassy neighbor and eat. Starving ones
/// clear the tile, the rest take one stage. Returns stages eaten.
fn forage(
    buffers: &mut MoveBuffers,
    pos: Position,
    rabbit: &mut Cell,
    neighbors: &[Position],
) -> Option<u32> {
    let species = Species::Rabbit;
    if rabbit.energy >= species.reproduce_energy() {
        return None;
    }

    let target = neighbors
        .iter()
        .copied()
        .find(|&n| buffers.is_free(n) && buffers.before().get(n).ground.has_grass())?;
    let ground = buffers.before().get(target).ground;

    let (gain, remaining) = if rabbit.energy < species.starving_energy() {
        (
            ground.value() as f64 * Species::GRASS_ENERGY_PER_STAGE,
            GroundStage::Empty,
        )
    } else {
        (Species::BITE_ENERGY, ground.bitten())
    };

    rabbit.energy += gain;
    rabbit.age += 1;
    buffers.relocate(pos, target, rabbit);
    buffers.set_ground(target, remaining);

    Some(ground.value() - remaining.value())
}

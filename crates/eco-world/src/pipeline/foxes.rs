use super::{MoveBuffers, PhaseReport};
use crate::cell::Cell;
use crate::grid::Grid;
use eco_core::{Occupant, Position, Species};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Why a fox went for a rabbit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HuntReason {
    /// Below half the breeding threshold
    Starving,
    /// Below the breeding threshold
    Hungry,
}

impl HuntReason {
    fn for_energy(energy: f64) -> Option<Self> {
        let fox = Species::Fox;
        if energy < fox.starving_energy() {
            Some(HuntReason::Starving)
        } else if energy < fox.reproduce_energy() {
            Some(HuntReason::Hungry)
        } else {
            None
        }
    }
}

/// Foxes act in random order: hunt, reproduce or wander. A kill always
/// ends the fox's turn, whether it was starving or merely hungry.
pub(crate) fn move_foxes(grid: &mut Grid, rng: &mut ChaCha8Rng) -> PhaseReport {
    let mut buffers = MoveBuffers::new(grid);
    let mut report = PhaseReport::default();

    for pos in buffers.shuffled_positions(rng) {
        let mut fox = *buffers.before().get(pos);
        if fox.occupant != Occupant::Fox || fox.reproduce_cooldown > 0 {
            continue;
        }

        let neighbors = buffers.shuffled_neighbors(pos, rng);

        if hunt(&mut buffers, pos, &mut fox, &neighbors).is_some() {
            report.kills += 1;
            report.moves += 1;
        } else if buffers
            .try_reproduce(Species::Fox, pos, &mut fox, &neighbors)
            .is_some()
        {
            report.record_birth(Species::Fox);
        } else if buffers.try_wander(pos, &mut fox, &neighbors).is_some() {
            report.moves += 1;
        }
    }

    *grid = buffers.finish();
    report
}

/// Eat an adjacent rabbit and take its tile. The prey must still be there:
/// another fox may have eaten it earlier in the phase.
fn hunt(
    buffers: &mut MoveBuffers,
    pos: Position,
    fox: &mut Cell,
    neighbors: &[Position],
) -> Option<Position> {
    let reason = HuntReason::for_energy(fox.energy)?;

    let prey = neighbors.iter().copied().find(|&n| {
        buffers.before().get(n).occupant == Occupant::Rabbit
            && buffers.written(n).occupant == Occupant::Rabbit
    })?;

    fox.energy += Species::PREY_ENERGY;
    fox.age += 1;
    buffers.relocate(pos, prey, fox);

    trace!(
        event = "kill",
        reason = ?reason,
        fox = %pos,
        prey = %prey,
        fox_energy = fox.energy,
        "Fox ate a rabbit"
    );

    Some(prey)
}

use super::PhaseReport;
use crate::grid::Grid;
use tracing::trace;

/// Charge every animal `1 + age / 10` energy, tick cooldowns down and
/// remove the animals that run out. The only place animals die.
pub(crate) fn update_energy(grid: &mut Grid) -> PhaseReport {
    let mut report = PhaseReport::default();

    for cell in grid.cells_mut() {
        if cell.is_vacant() {
            continue;
        }

        cell.energy -= 1.0 + cell.age as f64 / 10.0;
        cell.reproduce_cooldown = cell.reproduce_cooldown.saturating_sub(1);

        if cell.energy <= 0.0 {
            trace!(
                event = "death",
                occupant = ?cell.occupant,
                age = cell.age,
                "Animal starved"
            );
            cell.vacate();
            report.deaths += 1;
        }
    }

    report
}

//! Population counts recorded once per tick.

use serde::{Deserialize, Serialize};

/// Animal counts after a completed tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PopulationSample {
    pub tick: u64,
    pub rabbits: usize,
    pub foxes: usize,
}

impl PopulationSample {
    pub fn new(tick: u64, rabbits: usize, foxes: usize) -> Self {
        Self {
            tick,
            rabbits,
            foxes,
        }
    }

    pub fn total(&self) -> usize {
        self.rabbits + self.foxes
    }

    /// Both species gone; the run cannot continue
    pub fn is_extinct(&self) -> bool {
        self.total() == 0
    }
}

/// Append-only record of population samples in tick order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PopulationHistory {
    samples: Vec<PopulationSample>,
}

impl PopulationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Samples must arrive in increasing tick order.
    pub fn record(&mut self, sample: PopulationSample) {
        debug_assert!(
            self.samples.last().map_or(true, |last| last.tick < sample.tick),
            "population samples must be recorded in tick order"
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[PopulationSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&PopulationSample> {
        self.samples.last()
    }

    pub fn peak_rabbits(&self) -> usize {
        self.samples.iter().map(|s| s.rabbits).max().unwrap_or(0)
    }

    pub fn peak_foxes(&self) -> usize {
        self.samples.iter().map(|s| s.foxes).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extinction() {
        assert!(PopulationSample::new(3, 0, 0).is_extinct());
        assert!(!PopulationSample::new(3, 0, 1).is_extinct());
        assert_eq!(PopulationSample::new(1, 4, 2).total(), 6);
    }

    #[test]
    fn test_history_summary() {
        let mut history = PopulationHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.peak_rabbits(), 0);

        history.record(PopulationSample::new(1, 10, 2));
        history.record(PopulationSample::new(2, 14, 3));
        history.record(PopulationSample::new(3, 9, 5));

        assert_eq!(history.len(), 3);
        assert_eq!(history.peak_rabbits(), 14);
        assert_eq!(history.peak_foxes(), 5);
        assert_eq!(history.latest(), Some(&PopulationSample::new(3, 9, 5)));
    }
}

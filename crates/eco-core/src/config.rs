//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Initial world parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Width of the world grid (columns)
    pub width: i32,
    /// Height of the world grid (rows)
    pub height: i32,
    /// Rabbits placed at creation
    pub rabbits: usize,
    /// Foxes placed at creation
    pub foxes: usize,
    /// Per-tick probability of a tile advancing one grass stage (0.0 to 1.0)
    pub grass_growth_rate: f64,
    /// Random seed for reproducibility; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            width: 32,
            height: 16,
            rabbits: 12,
            foxes: 6,
            grass_growth_rate: 0.1,
            seed: None,
        }
    }
}

impl SimParams {
    pub fn capacity(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }

    /// Reject parameters the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.height < 1 {
            return Err(Error::InvalidConfig(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }

        if self.width as i64 * self.height as i64 > i32::MAX as i64 {
            return Err(Error::InvalidConfig(format!(
                "grid of {}x{} tiles is too large",
                self.width, self.height
            )));
        }

        if !self.grass_growth_rate.is_finite() || !(0.0..=1.0).contains(&self.grass_growth_rate) {
            return Err(Error::InvalidConfig(format!(
                "grass growth rate must be within [0, 1], got {}",
                self.grass_growth_rate
            )));
        }

        let requested = self.rabbits + self.foxes;
        let capacity = self.capacity();
        if requested > capacity {
            return Err(Error::OverCapacity {
                requested,
                capacity,
            });
        }

        Ok(())
    }
}

/// Tick loop timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep between ticks (milliseconds)
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; `None` runs until extinction or cancellation
    pub max_ticks: Option<u64>,
    /// Emit a population gauge every N ticks
    pub metrics_interval: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            max_ticks: None,
            metrics_interval: 50,
        }
    }
}

/// Runner binary configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub sim: SimParams,
    pub scheduler: SchedulerConfig,
    pub consumer: ConsumerConfig,
}

/// Consumer side of the run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Poll interval of the consumer loop (milliseconds)
    pub frame_interval_ms: u64,
    /// Print every new frame as text
    pub render_ascii: bool,
    /// Where to write the population history at the end of the run
    pub history_path: Option<String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 100,
            render_ascii: false,
            history_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let params = SimParams::default();
        assert_eq!(params.width, 32);
        assert_eq!(params.height, 16);
        assert_eq!(params.rabbits, 12);
        assert_eq!(params.foxes, 6);
        assert!(params.validate().is_ok());

        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.tick_interval_ms, 100);
        assert!(scheduler.max_ticks.is_none());
    }

    #[test]
    fn test_rejects_empty_grid() {
        let params = SimParams {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_dimensions_overflowing_i32() {
        let params = SimParams {
            width: 65536,
            height: 65536,
            rabbits: 0,
            foxes: 0,
            ..Default::default()
        };
        assert!(matches!(params.validate(), Err(Error::InvalidConfig(_))));

        let params = SimParams {
            width: i32::MAX,
            height: 1,
            rabbits: 0,
            foxes: 0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_growth_rate_out_of_range() {
        for rate in [-0.1, 1.5, f64::NAN] {
            let params = SimParams {
                grass_growth_rate: rate,
                ..Default::default()
            };
            assert!(params.validate().is_err(), "rate {rate} accepted");
        }

        let params = SimParams {
            grass_growth_rate: 1.0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_rejects_over_capacity() {
        let params = SimParams {
            width: 2,
            height: 2,
            rabbits: 3,
            foxes: 2,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(Error::OverCapacity {
                requested: 5,
                capacity: 4
            })
        ));
    }

    #[test]
    fn test_partial_runner_config() {
        let json = r#"{ "sim": { "width": 8, "seed": 7 }, "scheduler": { "max_ticks": 20 } }"#;
        let config: RunnerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sim.width, 8);
        assert_eq!(config.sim.height, 16);
        assert_eq!(config.sim.seed, Some(7));
        assert_eq!(config.scheduler.max_ticks, Some(20));
        assert_eq!(config.scheduler.tick_interval_ms, 100);
        assert_eq!(config.consumer.frame_interval_ms, 100);
    }
}

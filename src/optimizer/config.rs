//! Optimization configuration

use crate::error::{Result, TunerError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeDirection {
    #[serde(alias = "min")]
    Minimize,
    #[serde(alias = "max")]
    Maximize,
}

impl OptimizeDirection {
    /// Strict improvement test; ties keep the incumbent.
    pub fn is_better(&self, candidate: f64, incumbent: f64) -> bool {
        match self {
            OptimizeDirection::Minimize => candidate < incumbent,
            OptimizeDirection::Maximize => candidate > incumbent,
        }
    }

    /// Ordering that puts the better fitness first
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            OptimizeDirection::Minimize => a.total_cmp(&b),
            OptimizeDirection::Maximize => b.total_cmp(&a),
        }
    }

    /// Worst possible fitness for this direction
    pub fn worst(&self) -> f64 {
        match self {
            OptimizeDirection::Minimize => f64::INFINITY,
            OptimizeDirection::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Map NaN to the worst fitness so comparisons stay total
    pub fn sanitize(&self, fitness: f64) -> f64 {
        if fitness.is_nan() { self.worst() } else { fitness }
    }
}

impl Default for OptimizeDirection {
    fn default() -> Self {
        OptimizeDirection::Maximize
    }
}

impl FromStr for OptimizeDirection {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "max" | "maximize" => Ok(OptimizeDirection::Maximize),
            "min" | "minimize" => Ok(OptimizeDirection::Minimize),
            other => Err(TunerError::InvalidConfig(format!(
                "minmax must be 'max' or 'min', got '{}'",
                other
            ))),
        }
    }
}

/// Configuration for the slime mould optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmaConfig {
    /// Number of update passes over the population
    pub epoch: usize,

    /// Number of candidate solutions
    pub pop_size: usize,

    /// Probability of replacing an individual with a random position
    pub p_t: f64,

    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for SmaConfig {
    fn default() -> Self {
        Self {
            epoch: 18,
            pop_size: 100,
            p_t: 0.03,
            random_state: Some(42),
        }
    }
}

impl SmaConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the epoch budget
    pub fn with_epoch(mut self, epoch: usize) -> Self {
        self.epoch = epoch;
        self
    }

    /// Builder method to set the population size
    pub fn with_pop_size(mut self, pop_size: usize) -> Self {
        self.pop_size = pop_size;
        self
    }

    /// Builder method to set the random re-exploration probability
    pub fn with_p_t(mut self, p_t: f64) -> Self {
        self.p_t = p_t;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Reject configurations that cannot run
    pub fn validate(&self) -> Result<()> {
        if self.pop_size < 1 {
            return Err(TunerError::InvalidConfig(format!(
                "pop_size must be >= 1, got {}",
                self.pop_size
            )));
        }
        if self.epoch < 1 {
            return Err(TunerError::InvalidConfig(format!(
                "epoch must be >= 1, got {}",
                self.epoch
            )));
        }
        if !(0.0..=1.0).contains(&self.p_t) {
            return Err(TunerError::InvalidConfig(format!(
                "p_t must be in [0, 1], got {}",
                self.p_t
            )));
        }
        Ok(())
    }

    /// Objective evaluations a full run performs (initial population included)
    pub fn n_evaluations(&self) -> usize {
        self.pop_size.saturating_mul(self.epoch.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SmaConfig::default();
        assert_eq!(config.epoch, 18);
        assert_eq!(config.pop_size, 100);
        assert!(config.validate().is_ok());
        assert_eq!(config.n_evaluations(), 1900);
    }

    #[test]
    fn test_builder() {
        let config = SmaConfig::new()
            .with_epoch(5)
            .with_pop_size(10)
            .with_p_t(0.1)
            .with_random_state(7);

        assert_eq!(config.epoch, 5);
        assert_eq!(config.pop_size, 10);
        assert_eq!(config.random_state, Some(7));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(SmaConfig::new().with_pop_size(0).validate(), Err(TunerError::InvalidConfig(_))));
        assert!(matches!(SmaConfig::new().with_epoch(0).validate(), Err(TunerError::InvalidConfig(_))));
        assert!(matches!(SmaConfig::new().with_p_t(1.5).validate(), Err(TunerError::InvalidConfig(_))));
    }

    #[test]
    fn test_direction() {
        let max = OptimizeDirection::Maximize;
        assert!(max.is_better(0.9, 0.8));
        assert!(!max.is_better(0.8, 0.8));
        assert_eq!(max.compare(0.9, 0.1), Ordering::Less);
        assert_eq!(max.sanitize(f64::NAN), f64::NEG_INFINITY);

        let min = OptimizeDirection::Minimize;
        assert!(min.is_better(0.1, 0.2));
        assert_eq!(min.compare(0.9, 0.1), Ordering::Greater);

        assert_eq!("max".parse::<OptimizeDirection>().unwrap(), max);
        assert_eq!("MIN".parse::<OptimizeDirection>().unwrap(), min);
        assert!("up".parse::<OptimizeDirection>().is_err());
    }
}

//! Optimization problem: a search space, an objective and a direction

use super::config::OptimizeDirection;
use super::objective::{ClassifierKind, Objective, SgdObjective};
use super::search_space::{Bound, HyperparamSet, SearchSpace};
use crate::error::{Result, TunerError};
use crate::utils::PreparedData;
use std::fmt;
use std::sync::Arc;

/// Declarative description of a tuning problem
#[derive(Debug, Clone)]
pub struct ProblemConfig {
    pub bounds: Vec<Bound>,
    pub minmax: OptimizeDirection,
    pub data: Option<Arc<PreparedData>>,
    pub classifier_name: String,
    /// Seed handed to the classifier, not to the optimizer
    pub random_state: u64,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        Self {
            bounds: SearchSpace::sgd_default().bounds().to_vec(),
            minmax: OptimizeDirection::Maximize,
            data: None,
            classifier_name: "SGD".to_string(),
            random_state: 55,
        }
    }
}

impl ProblemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, data: Arc<PreparedData>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_bounds(mut self, bounds: Vec<Bound>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_minmax(mut self, minmax: OptimizeDirection) -> Self {
        self.minmax = minmax;
        self
    }

    pub fn with_classifier_name(mut self, name: impl Into<String>) -> Self {
        self.classifier_name = name.into();
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

/// A search space bound to an objective
pub struct Problem {
    space: SearchSpace,
    objective: Box<dyn Objective>,
    direction: OptimizeDirection,
}

impl fmt::Debug for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Problem")
            .field("space", &self.space)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

impl Problem {
    /// Build a problem around any objective
    pub fn new(space: SearchSpace, objective: impl Objective + 'static, direction: OptimizeDirection) -> Self {
        Self {
            space,
            objective: Box::new(objective),
            direction,
        }
    }

    /// Validate a config and wire up the classifier objective
    pub fn from_config(config: ProblemConfig) -> Result<Self> {
        let kind: ClassifierKind = config.classifier_name.parse()?;
        let space = SearchSpace::new(config.bounds)?;
        let data = config
            .data
            .ok_or_else(|| TunerError::InvalidConfig("problem has no dataset attached".to_string()))?;

        let objective = match kind {
            ClassifierKind::Sgd => {
                let missing: Vec<&str> = SgdObjective::REQUIRED_PARAMS
                    .iter()
                    .copied()
                    .filter(|name| space.get(name).is_none())
                    .collect();
                if !missing.is_empty() {
                    return Err(TunerError::InvalidConfig(format!(
                        "SGD search space is missing dimensions: {}",
                        missing.join(", ")
                    )));
                }
                SgdObjective::new(data).with_random_state(config.random_state)
            }
        };

        Ok(Self::new(space, objective, config.minmax))
    }

    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    pub fn direction(&self) -> OptimizeDirection {
        self.direction
    }

    pub fn n_dims(&self) -> usize {
        self.space.dims()
    }

    pub fn decode(&self, x: &[f64]) -> HyperparamSet {
        self.space.decode(x)
    }

    /// Decode then score a native position. NaN scores become the worst fitness.
    pub fn objective(&self, x: &[f64]) -> f64 {
        let params = self.space.decode(x);
        self.direction.sanitize(self.objective.evaluate(&params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_space() -> SearchSpace {
        SearchSpace::new(vec![
            Bound::float("x", -1.0, 1.0).unwrap(),
            Bound::categorical("mode", ["a", "b"]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_objective_decodes_before_scoring() {
        let problem = Problem::new(
            toy_space(),
            |p: &HyperparamSet| {
                let bonus = if p.get_str("mode") == Some("b") { 1.0 } else { 0.0 };
                p.get_float("x").unwrap_or(0.0) + bonus
            },
            OptimizeDirection::Maximize,
        );

        assert_eq!(problem.n_dims(), 2);
        assert_eq!(problem.objective(&[0.5, 1.5]), 1.5);
        // Out-of-range coordinates are clamped on decode
        assert_eq!(problem.objective(&[3.0, 0.2]), 1.0);
    }

    #[test]
    fn test_nan_fitness_is_worst() {
        let problem = Problem::new(toy_space(), |_: &HyperparamSet| f64::NAN, OptimizeDirection::Minimize);
        assert_eq!(problem.objective(&[0.0, 0.0]), f64::INFINITY);
    }

    #[test]
    fn test_from_config_requires_data() {
        let err = Problem::from_config(ProblemConfig::default()).unwrap_err();
        assert!(matches!(err, TunerError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_config_rejects_unknown_classifier() {
        let config = ProblemConfig::new().with_classifier_name("RandomForest");
        assert!(matches!(Problem::from_config(config), Err(TunerError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_config_rejects_bad_bounds() {
        let bounds = vec![Bound::Float {
            name: "alpha".into(),
            lower: 1.0,
            upper: 0.0,
        }];
        let config = ProblemConfig::new().with_bounds(bounds);
        assert!(matches!(Problem::from_config(config), Err(TunerError::InvalidBound { .. })));
    }
}

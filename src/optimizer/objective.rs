//! Objective functions scored by the optimizer

use super::search_space::HyperparamSet;
use crate::error::{Result, TunerError};
use crate::training::{accuracy_score, ModelMetrics, Penalty, SGDClassifier, SGDConfig, SGDLoss};
use crate::utils::PreparedData;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Scores a decoded parameter set. Must not panic; failures map to a fitness.
pub trait Objective: Send + Sync {
    fn evaluate(&self, params: &HyperparamSet) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&HyperparamSet) -> f64 + Send + Sync,
{
    fn evaluate(&self, params: &HyperparamSet) -> f64 {
        self(params)
    }
}

/// Model families the objective can train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassifierKind {
    #[serde(rename = "SGD")]
    Sgd,
}

impl FromStr for ClassifierKind {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "SGD" => Ok(ClassifierKind::Sgd),
            _ => Err(TunerError::InvalidConfig(format!("unknown classifier '{}'", s))),
        }
    }
}

/// Trains an SGD classifier on the prepared split and returns test accuracy
#[derive(Debug, Clone)]
pub struct SgdObjective {
    data: Arc<PreparedData>,
    base: SGDConfig,
}

impl SgdObjective {
    /// Parameters every candidate must carry
    pub const REQUIRED_PARAMS: [&'static str; 4] = ["alpha", "l1_ratio", "penalty", "loss"];

    pub fn new(data: Arc<PreparedData>) -> Self {
        Self {
            data,
            base: SGDConfig {
                random_state: Some(55),
                ..SGDConfig::default()
            },
        }
    }

    /// Seed passed to every classifier
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.base.random_state = Some(seed);
        self
    }

    pub fn data(&self) -> &PreparedData {
        &self.data
    }

    /// Classifier settings for one candidate
    pub fn sgd_config(&self, params: &HyperparamSet) -> Result<SGDConfig> {
        let float = |name: &str| {
            params
                .get_float(name)
                .ok_or_else(|| TunerError::ObjectiveEvaluation(format!("missing float parameter '{}'", name)))
        };
        let string = |name: &str| {
            params
                .get_str(name)
                .ok_or_else(|| TunerError::ObjectiveEvaluation(format!("missing string parameter '{}'", name)))
        };

        Ok(SGDConfig {
            loss: SGDLoss::from_str(string("loss")?)?,
            penalty: Penalty::from_str(string("penalty")?)?,
            alpha: float("alpha")?,
            l1_ratio: float("l1_ratio")?,
            ..self.base.clone()
        })
    }

    /// Fit and score, surfacing the failure reason
    pub fn try_evaluate(&self, params: &HyperparamSet) -> Result<f64> {
        let config = self.sgd_config(params)?;
        let mut model = SGDClassifier::new(config);
        model.fit(&self.data.x_train, &self.data.y_train)?;
        let y_pred = model.predict(&self.data.x_test)?;
        accuracy_score(&self.data.y_test, &y_pred)
    }

    /// Full test-split metrics for one candidate, positive class = larger label
    pub fn evaluate_metrics(&self, params: &HyperparamSet) -> Result<ModelMetrics> {
        let mut model = SGDClassifier::new(self.sgd_config(params)?);
        model.fit(&self.data.x_train, &self.data.y_train)?;
        let positive = model.classes.ok_or(TunerError::ModelNotFitted)?[1];
        let y_pred = model.predict(&self.data.x_test)?;
        ModelMetrics::compute_classification(&self.data.y_test, &y_pred, positive)
    }
}

impl Objective for SgdObjective {
    fn evaluate(&self, params: &HyperparamSet) -> f64 {
        match self.try_evaluate(params) {
            Ok(accuracy) => accuracy,
            Err(e) => {
                let e = match e {
                    e @ TunerError::ObjectiveEvaluation(_) => e,
                    other => TunerError::ObjectiveEvaluation(other.to_string()),
                };
                debug!(error = %e, params = %params, "Candidate scored 0.0");
                0.0
            }
        }
    }
}

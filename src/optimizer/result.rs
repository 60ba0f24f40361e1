//! Search outcome and its serialized forms

use super::history::History;
use super::search_space::HyperparamSet;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything a finished search produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_position: Vec<f64>,
    pub best_params: HyperparamSet,
    pub best_fitness: f64,
    pub history: History,
    pub n_evaluations: usize,
    pub duration_secs: f64,
}

/// Convergence curves plus the winner, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    pub epoch: Vec<usize>,
    pub current_best: Vec<f64>,
    pub global_best: Vec<f64>,
    pub best_params: HyperparamSet,
    pub best_fitness: f64,
}

impl OptimizationResult {
    pub fn payload(&self) -> ResultPayload {
        ResultPayload {
            epoch: self.history.epochs(),
            current_best: self.history.current_best(),
            global_best: self.history.global_best(),
            best_params: self.best_params.clone(),
            best_fitness: self.best_fitness,
        }
    }

    /// Write the full result as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

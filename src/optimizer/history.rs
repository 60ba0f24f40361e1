//! Per-epoch convergence record

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// One row of the convergence history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub epoch: usize,
    /// Best fitness in the population after this epoch
    pub current_best: f64,
    /// Best fitness seen so far
    pub global_best: f64,
    /// Population spread around the per-dimension median
    pub diversity: f64,
    pub runtime_secs: f64,
}

/// Append-only list of epoch records, indexed from 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    records: Vec<FitnessRecord>,
}

impl History {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: FitnessRecord) {
        debug_assert_eq!(record.epoch, self.records.len());
        self.records.push(record);
    }

    pub fn records(&self) -> &[FitnessRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&FitnessRecord> {
        self.records.last()
    }

    pub fn epochs(&self) -> Vec<usize> {
        self.records.iter().map(|r| r.epoch).collect()
    }

    pub fn current_best(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.current_best).collect()
    }

    pub fn global_best(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.global_best).collect()
    }

    pub fn diversity(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.diversity).collect()
    }

    /// Diversity as a percentage of the largest diversity observed
    pub fn exploration(&self) -> Vec<f64> {
        let max = self
            .records
            .iter()
            .map(|r| r.diversity)
            .fold(0.0_f64, f64::max);
        self.records
            .iter()
            .map(|r| if max > 0.0 { 100.0 * r.diversity / max } else { 0.0 })
            .collect()
    }

    pub fn exploitation(&self) -> Vec<f64> {
        self.exploration().into_iter().map(|x| 100.0 - x).collect()
    }
}

/// Mean over dimensions of the mean absolute deviation from the median
pub fn population_diversity(positions: &[Vec<f64>]) -> f64 {
    let n = positions.len();
    let dims = positions.first().map_or(0, Vec::len);
    if n == 0 || dims == 0 {
        return 0.0;
    }

    let matrix = Array2::from_shape_fn((n, dims), |(i, j)| positions[i].get(j).copied().unwrap_or(0.0));
    let spread: Vec<f64> = matrix
        .axis_iter(Axis(1))
        .map(|column| {
            let mut sorted = column.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let median = if n % 2 == 1 {
                sorted[n / 2]
            } else {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            };
            column.iter().map(|x| (x - median).abs()).sum::<f64>() / n as f64
        })
        .collect();

    spread.iter().sum::<f64>() / dims as f64
}

//! Hyperparameter optimization module
//!
//! Slime mould search over a mixed continuous/categorical space:
//! - [`SearchSpace`] maps named dimensions onto native numeric ranges
//! - [`Problem`] binds a space to an [`Objective`] and a direction
//! - [`SlimeMould`] runs the population search and records a [`History`]

mod config;
mod history;
mod objective;
mod problem;
mod result;
mod search_space;
mod sma;

pub use config::{OptimizeDirection, SmaConfig};
pub use history::{population_diversity, FitnessRecord, History};
pub use objective::{ClassifierKind, Objective, SgdObjective};
pub use problem::{Problem, ProblemConfig};
pub use result::{OptimizationResult, ResultPayload};
pub use search_space::{Bound, HyperparamSet, ParameterValue, SearchSpace, CATEGORICAL_EPS};
pub use sma::SlimeMould;

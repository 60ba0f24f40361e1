//! Model training module
//!
//! Provides the linear classifier scored by the hyperparameter search:
//! - Stochastic Gradient Descent (SGD) classifier
//! - Classification metrics

pub mod metrics;
pub mod sgd;

pub use metrics::{accuracy_score, ModelMetrics};
pub use sgd::{LearningRateSchedule, Penalty, SGDClassifier, SGDConfig, SGDLoss};

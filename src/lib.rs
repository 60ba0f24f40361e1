//! SMA Tuner - slime mould hyperparameter search for linear classifiers
//!
//! This crate tunes an SGD linear classifier on a tabular dataset with the
//! Slime Mould Algorithm:
//! - Data loading, stratified splitting and scaling
//! - A from-scratch SGD classifier with nine losses and three penalties
//! - Population search over a mixed float/categorical space
//! - Web server and CLI interfaces
//!
//! # Modules
//!
//! - [`utils`] - Dataset loading and preparation
//! - [`preprocessing`] - Train/test split and feature scaling
//! - [`training`] - SGD classifier and metrics
//! - [`optimizer`] - Search space, objective and slime mould optimizer
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod optimizer;
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{Result, TunerError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, TunerError};

    // Data
    pub use crate::preprocessing::{Scaler, ScalerType};
    pub use crate::utils::{DatasetConfig, PreparedData};

    // Training
    pub use crate::training::{SGDClassifier, SGDConfig, SGDLoss, Penalty};

    // Optimization
    pub use crate::optimizer::{
        Bound, HyperparamSet, Objective, OptimizationResult, OptimizeDirection, ParameterValue,
        Problem, ProblemConfig, SearchSpace, SlimeMould, SmaConfig,
    };
}

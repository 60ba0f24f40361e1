//! Data preprocessing module
//!
//! Fixed single-pass steps applied before the search starts:
//! - Stratified train/test splitting
//! - Feature scaling (StandardScaler, MinMaxScaler)

mod scaler;
mod split;

pub use scaler::{Scaler, ScalerType};
pub use split::{train_test_split, TrainTestSplit};

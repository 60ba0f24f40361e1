//! Feature scaling implementations

use crate::error::{Result, TunerError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Type of scaler to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
    /// No scaling
    None,
}

impl Default for ScalerType {
    fn default() -> Self {
        ScalerType::Standard
    }
}

/// Per-column parameters of a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: Array1<f64>,    // mean or min
    scale: Array1<f64>,     // std or range
}

/// Column-wise feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Option<ScalerParams>,
}

impl Scaler {
    /// Create a new scaler
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: None,
        }
    }

    pub fn scaler_type(&self) -> &ScalerType {
        &self.scaler_type
    }

    pub fn is_fitted(&self) -> bool {
        self.params.is_some()
    }

    /// Fit the scaler to the columns of `x`
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(TunerError::DataError("cannot fit a scaler on zero rows".into()));
        }
        let p = x.ncols();

        let (center, scale) = match self.scaler_type {
            ScalerType::Standard => {
                let mean = x
                    .mean_axis(Axis(0))
                    .ok_or_else(|| TunerError::DataError("empty feature matrix".into()))?;
                // Population std, matching the usual z-score scaler
                let std = x.std_axis(Axis(0), 0.0);
                (mean, std)
            }
            ScalerType::MinMax => {
                let min = x.fold_axis(Axis(0), f64::INFINITY, |&a, &b| a.min(b));
                let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |&a, &b| a.max(b));
                let range = &max - &min;
                (min, range)
            }
            ScalerType::None => (Array1::zeros(p), Array1::ones(p)),
        };

        let scale = scale.mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });
        self.params = Some(ScalerParams { center, scale });
        Ok(self)
    }

    /// Transform the data with the fitted parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let params = self.fitted_params(x)?;
        Ok((x - &params.center) / &params.scale)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    fn fitted_params(&self, x: &Array2<f64>) -> Result<&ScalerParams> {
        let params = self.params.as_ref().ok_or(TunerError::ModelNotFitted)?;
        if x.ncols() != params.center.len() {
            return Err(TunerError::ShapeError {
                expected: format!("{} columns", params.center.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }
        Ok(params)
    }
}

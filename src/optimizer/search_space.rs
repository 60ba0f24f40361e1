//! Search space definition for hyperparameters
//!
//! Every dimension has a native numeric range the optimizer moves in. Float
//! dimensions use their own limits; categorical dimensions map onto
//! `[0, n - CATEGORICAL_EPS]` and are floored back to a choice index.

use crate::error::{Result, TunerError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Gap kept below `n` so a categorical coordinate never floors to `n`
pub const CATEGORICAL_EPS: f64 = 1e-4;

/// A single search dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "UncheckedBound")]
pub enum Bound {
    /// Continuous parameter in `[lower, upper]`
    Float { name: String, lower: f64, upper: f64 },
    /// Choice among string values, in declared order
    Categorical { name: String, valid_values: Vec<String> },
}

/// Wire form of [`Bound`], validated on conversion
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum UncheckedBound {
    Float { name: String, lower: f64, upper: f64 },
    Categorical { name: String, valid_values: Vec<String> },
}

impl TryFrom<UncheckedBound> for Bound {
    type Error = TunerError;

    fn try_from(raw: UncheckedBound) -> Result<Self> {
        match raw {
            UncheckedBound::Float { name, lower, upper } => Bound::float(name, lower, upper),
            UncheckedBound::Categorical { name, valid_values } => Bound::categorical(name, valid_values),
        }
    }
}

impl Bound {
    /// Create a validated float dimension
    pub fn float(name: impl Into<String>, lower: f64, upper: f64) -> Result<Self> {
        let bound = Bound::Float {
            name: name.into(),
            lower,
            upper,
        };
        bound.validate()?;
        Ok(bound)
    }

    /// Create a validated categorical dimension
    pub fn categorical<S: Into<String>>(
        name: impl Into<String>,
        valid_values: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let bound = Bound::Categorical {
            name: name.into(),
            valid_values: valid_values.into_iter().map(Into::into).collect(),
        };
        bound.validate()?;
        Ok(bound)
    }

    pub fn name(&self) -> &str {
        match self {
            Bound::Float { name, .. } | Bound::Categorical { name, .. } => name,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Bound::Float { name, lower, upper } => {
                if !lower.is_finite() || !upper.is_finite() {
                    return Err(TunerError::invalid_bound(name, "limits must be finite"));
                }
                if lower >= upper {
                    return Err(TunerError::invalid_bound(
                        name,
                        format!("lower ({}) must be below upper ({})", lower, upper),
                    ));
                }
            }
            Bound::Categorical { name, valid_values } => {
                if valid_values.is_empty() {
                    return Err(TunerError::invalid_bound(name, "no valid values"));
                }
                let mut seen = HashSet::new();
                if let Some(dup) = valid_values.iter().find(|v| !seen.insert(v.as_str())) {
                    return Err(TunerError::invalid_bound(name, format!("duplicate value '{}'", dup)));
                }
            }
        }
        Ok(())
    }

    /// Numeric range the optimizer searches in
    pub fn native_range(&self) -> (f64, f64) {
        match self {
            Bound::Float { lower, upper, .. } => (*lower, *upper),
            Bound::Categorical { valid_values, .. } => {
                (0.0, valid_values.len() as f64 - CATEGORICAL_EPS)
            }
        }
    }

    /// Clamp a native coordinate into range; NaN goes to the lower limit
    pub fn correct(&self, x: f64) -> f64 {
        let (lo, hi) = self.native_range();
        if x.is_nan() {
            lo
        } else {
            x.clamp(lo, hi)
        }
    }

    /// Domain value to native coordinate
    pub fn encode(&self, value: &ParameterValue) -> Result<f64> {
        match (self, value) {
            (Bound::Float { .. }, ParameterValue::Float(v)) => Ok(*v),
            (Bound::Categorical { name, valid_values }, ParameterValue::String(s)) => valid_values
                .iter()
                .position(|v| v == s)
                .map(|idx| idx as f64)
                .ok_or_else(|| TunerError::InvalidParameter {
                    name: name.clone(),
                    value: s.clone(),
                    reason: format!("not one of {:?}", valid_values),
                }),
            (bound, value) => Err(TunerError::InvalidParameter {
                name: bound.name().to_string(),
                value: value.to_string(),
                reason: "value type does not match the dimension".to_string(),
            }),
        }
    }

    /// Native coordinate to domain value. Total for any input.
    pub fn decode(&self, x: f64) -> ParameterValue {
        let x = self.correct(x);
        match self {
            Bound::Float { .. } => ParameterValue::Float(x),
            Bound::Categorical { valid_values, .. } => {
                let idx = (x.floor() as usize).min(valid_values.len() - 1);
                ParameterValue::String(valid_values[idx].clone())
            }
        }
    }
}

/// Decoded parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f64),
    String(String),
}

impl ParameterValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::String(_) => None,
        }
    }

    /// Get as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            ParameterValue::Float(_) => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Float(v) => write!(f, "{}", v),
            ParameterValue::String(s) => f.write_str(s),
        }
    }
}

/// Named hyperparameters produced by decoding a candidate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperparamSet {
    values: BTreeMap<String, ParameterValue>,
}

impl HyperparamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParameterValue::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParameterValue::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ParameterValue)> for HyperparamSet {
    fn from_iter<I: IntoIterator<Item = (String, ParameterValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for HyperparamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        Ok(())
    }
}

/// Ordered set of search dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSearchSpace")]
pub struct SearchSpace {
    bounds: Vec<Bound>,
}

#[derive(Deserialize)]
struct UncheckedSearchSpace {
    bounds: Vec<Bound>,
}

impl TryFrom<UncheckedSearchSpace> for SearchSpace {
    type Error = TunerError;

    fn try_from(raw: UncheckedSearchSpace) -> Result<Self> {
        SearchSpace::new(raw.bounds)
    }
}

impl SearchSpace {
    /// Validate and build a search space
    pub fn new(bounds: Vec<Bound>) -> Result<Self> {
        if bounds.is_empty() {
            return Err(TunerError::invalid_bound("<space>", "search space has no dimensions"));
        }
        let mut names = HashSet::new();
        for bound in &bounds {
            bound.validate()?;
            if !names.insert(bound.name()) {
                return Err(TunerError::invalid_bound(bound.name(), "duplicate dimension name"));
            }
        }
        Ok(Self { bounds })
    }

    /// The four SGD classifier dimensions tuned by default
    pub fn sgd_default() -> Self {
        let categorical = |name: &str, values: &[&str]| Bound::Categorical {
            name: name.to_string(),
            valid_values: values.iter().map(|v| v.to_string()).collect(),
        };

        Self {
            bounds: vec![
                Bound::Float {
                    name: "alpha".to_string(),
                    lower: 1e-8,
                    upper: 10.0,
                },
                Bound::Float {
                    name: "l1_ratio".to_string(),
                    lower: 0.0,
                    upper: 1.0,
                },
                categorical("penalty", &["l1", "l2", "elasticnet"]),
                categorical(
                    "loss",
                    &[
                        "hinge",
                        "log_loss",
                        "modified_huber",
                        "squared_hinge",
                        "perceptron",
                        "squared_error",
                        "huber",
                        "epsilon_insensitive",
                        "squared_epsilon_insensitive",
                    ],
                ),
            ],
        }
    }

    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }

    /// Number of dimensions
    pub fn dims(&self) -> usize {
        self.bounds.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.bounds.iter().map(Bound::name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Bound> {
        self.bounds.iter().find(|b| b.name() == name)
    }

    pub fn lower_bounds(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.native_range().0).collect()
    }

    pub fn upper_bounds(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.native_range().1).collect()
    }

    /// Encode a full parameter set into a native position
    pub fn encode(&self, params: &HyperparamSet) -> Result<Vec<f64>> {
        self.bounds
            .iter()
            .map(|bound| {
                let value = params.get(bound.name()).ok_or_else(|| TunerError::InvalidParameter {
                    name: bound.name().to_string(),
                    value: "<missing>".to_string(),
                    reason: "no value supplied for this dimension".to_string(),
                })?;
                bound.encode(value)
            })
            .collect()
    }

    /// Decode a native position. Missing coordinates decode like NaN.
    pub fn decode(&self, x: &[f64]) -> HyperparamSet {
        self.bounds
            .iter()
            .enumerate()
            .map(|(j, bound)| {
                let coord = x.get(j).copied().unwrap_or(f64::NAN);
                (bound.name().to_string(), bound.decode(coord))
            })
            .collect()
    }

    /// Uniform sample inside the native bounds
    pub fn sample_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.bounds
            .iter()
            .map(|bound| {
                let (lo, hi) = bound.native_range();
                lo + rng.gen::<f64>() * (hi - lo)
            })
            .collect()
    }

    /// Clamp a position into the native bounds in place
    pub fn correct(&self, position: &mut [f64]) {
        for (x, bound) in position.iter_mut().zip(&self.bounds) {
            *x = bound.correct(*x);
        }
    }
}

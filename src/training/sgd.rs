//! Stochastic Gradient Descent (SGD) linear classifier
//!
//! Binary linear classifier fitted one sample at a time. Supports the nine
//! usual loss functions, L1/L2/ElasticNet penalties and the "optimal"
//! learning rate schedule `1 / (alpha * (t0 + t))`.

use crate::error::{Result, TunerError};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gradients are clipped to this magnitude before the update.
const MAX_DLOSS: f64 = 1e12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SGDLoss {
    Hinge,                     // SVM-like
    LogLoss,                   // Logistic regression
    ModifiedHuber,             // Smooth hinge
    SquaredHinge,
    Perceptron,                // Hinge with a zero margin
    SquaredError,
    Huber,
    EpsilonInsensitive,
    SquaredEpsilonInsensitive,
}

impl SGDLoss {
    pub const ALL: [SGDLoss; 9] = [
        SGDLoss::Hinge,
        SGDLoss::LogLoss,
        SGDLoss::ModifiedHuber,
        SGDLoss::SquaredHinge,
        SGDLoss::Perceptron,
        SGDLoss::SquaredError,
        SGDLoss::Huber,
        SGDLoss::EpsilonInsensitive,
        SGDLoss::SquaredEpsilonInsensitive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SGDLoss::Hinge => "hinge",
            SGDLoss::LogLoss => "log_loss",
            SGDLoss::ModifiedHuber => "modified_huber",
            SGDLoss::SquaredHinge => "squared_hinge",
            SGDLoss::Perceptron => "perceptron",
            SGDLoss::SquaredError => "squared_error",
            SGDLoss::Huber => "huber",
            SGDLoss::EpsilonInsensitive => "epsilon_insensitive",
            SGDLoss::SquaredEpsilonInsensitive => "squared_epsilon_insensitive",
        }
    }

    /// Loss of prediction `p` against a signed target `y` (±1).
    pub fn loss(&self, p: f64, y: f64, epsilon: f64) -> f64 {
        match self {
            SGDLoss::Hinge => (1.0 - p * y).max(0.0),
            SGDLoss::Perceptron => (-p * y).max(0.0),
            SGDLoss::SquaredHinge => {
                let z = 1.0 - p * y;
                if z > 0.0 { z * z } else { 0.0 }
            }
            SGDLoss::LogLoss => {
                let z = p * y;
                if z > 18.0 {
                    (-z).exp()
                } else if z < -18.0 {
                    -z
                } else {
                    (-z).exp().ln_1p()
                }
            }
            SGDLoss::ModifiedHuber => {
                let z = p * y;
                if z >= 1.0 {
                    0.0
                } else if z >= -1.0 {
                    (1.0 - z) * (1.0 - z)
                } else {
                    -4.0 * z
                }
            }
            SGDLoss::SquaredError => 0.5 * (p - y) * (p - y),
            SGDLoss::Huber => {
                let r = (p - y).abs();
                if r <= epsilon { 0.5 * r * r } else { epsilon * r - 0.5 * epsilon * epsilon }
            }
            SGDLoss::EpsilonInsensitive => ((y - p).abs() - epsilon).max(0.0),
            SGDLoss::SquaredEpsilonInsensitive => {
                let r = (y - p).abs() - epsilon;
                if r > 0.0 { r * r } else { 0.0 }
            }
        }
    }

    /// Derivative of the loss with respect to the prediction.
    pub fn dloss(&self, p: f64, y: f64, epsilon: f64) -> f64 {
        match self {
            SGDLoss::Hinge => if p * y <= 1.0 { -y } else { 0.0 },
            SGDLoss::Perceptron => if p * y <= 0.0 { -y } else { 0.0 },
            SGDLoss::SquaredHinge => {
                let z = 1.0 - p * y;
                if z > 0.0 { -2.0 * y * z } else { 0.0 }
            }
            SGDLoss::LogLoss => {
                let z = p * y;
                if z > 18.0 {
                    -y * (-z).exp()
                } else if z < -18.0 {
                    -y
                } else {
                    -y / (z.exp() + 1.0)
                }
            }
            SGDLoss::ModifiedHuber => {
                let z = p * y;
                if z >= 1.0 {
                    0.0
                } else if z >= -1.0 {
                    -2.0 * (1.0 - z) * y
                } else {
                    -4.0 * y
                }
            }
            SGDLoss::SquaredError => p - y,
            SGDLoss::Huber => {
                let r = p - y;
                if r.abs() <= epsilon { r } else if r > 0.0 { epsilon } else { -epsilon }
            }
            SGDLoss::EpsilonInsensitive => {
                if y - p > epsilon {
                    -1.0
                } else if p - y > epsilon {
                    1.0
                } else {
                    0.0
                }
            }
            SGDLoss::SquaredEpsilonInsensitive => {
                let z = y - p;
                if z > epsilon {
                    -2.0 * (z - epsilon)
                } else if z < -epsilon {
                    2.0 * (-z - epsilon)
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for SGDLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SGDLoss {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        SGDLoss::ALL
            .iter()
            .copied()
            .find(|loss| loss.as_str() == s)
            .ok_or_else(|| TunerError::InvalidParameter {
                name: "loss".to_string(),
                value: s.to_string(),
                reason: "unknown loss function".to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Penalty {
    L1,
    L2,
    ElasticNet,
}

impl Penalty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Penalty::L1 => "l1",
            Penalty::L2 => "l2",
            Penalty::ElasticNet => "elasticnet",
        }
    }

    /// Effective L1 share of the penalty; only ElasticNet uses the configured ratio.
    fn effective_l1_ratio(&self, l1_ratio: f64) -> f64 {
        match self {
            Penalty::L1 => 1.0,
            Penalty::L2 => 0.0,
            Penalty::ElasticNet => l1_ratio,
        }
    }
}

impl FromStr for Penalty {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "l1" => Ok(Penalty::L1),
            "l2" => Ok(Penalty::L2),
            "elasticnet" => Ok(Penalty::ElasticNet),
            other => Err(TunerError::InvalidParameter {
                name: "penalty".to_string(),
                value: other.to_string(),
                reason: "expected one of l1, l2, elasticnet".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LearningRateSchedule {
    Constant,
    Optimal,     // 1 / (alpha * (t + t0))
    InvScaling,  // eta0 / t^power_t
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SGDConfig {
    pub loss: SGDLoss,
    pub penalty: Penalty,
    pub alpha: f64,
    pub l1_ratio: f64,      // ElasticNet mixing (0 = L2, 1 = L1)
    pub learning_rate: LearningRateSchedule,
    pub eta0: f64,
    pub power_t: f64,       // For InvScaling schedule
    pub epsilon: f64,       // For Huber and epsilon-insensitive losses
    pub max_iter: usize,
    pub tol: f64,
    pub n_iter_no_change: usize,
    pub shuffle: bool,
    pub random_state: Option<u64>,
}

impl Default for SGDConfig {
    fn default() -> Self {
        Self {
            loss: SGDLoss::Hinge,
            penalty: Penalty::L2,
            alpha: 0.0001,
            l1_ratio: 0.15,
            learning_rate: LearningRateSchedule::Optimal,
            eta0: 0.0,
            power_t: 0.5,
            epsilon: 0.1,
            max_iter: 1000,
            tol: 1e-3,
            n_iter_no_change: 5,
            shuffle: true,
            random_state: Some(42),
        }
    }
}

impl SGDConfig {
    fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: f64, reason: &str| TunerError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        if !(self.alpha >= 0.0) || !self.alpha.is_finite() {
            return Err(invalid("alpha", self.alpha, "must be a finite value >= 0"));
        }
        if !(0.0..=1.0).contains(&self.l1_ratio) {
            return Err(invalid("l1_ratio", self.l1_ratio, "must be in [0, 1]"));
        }
        if self.max_iter == 0 {
            return Err(invalid("max_iter", 0.0, "must be >= 1"));
        }
        match self.learning_rate {
            LearningRateSchedule::Optimal if self.alpha == 0.0 => Err(invalid(
                "alpha",
                self.alpha,
                "must be > 0 with the optimal learning rate",
            )),
            LearningRateSchedule::Constant | LearningRateSchedule::InvScaling
                if !(self.eta0 > 0.0) =>
            {
                Err(invalid("eta0", self.eta0, "must be > 0"))
            }
            _ => Ok(()),
        }
    }
}

/// Truncated-gradient L1 step with cumulative penalty (`u` total, `q` applied so far).
fn apply_l1_penalty(w: &mut Array1<f64>, q: &mut Array1<f64>, u: f64) {
    for (wj, qj) in w.iter_mut().zip(q.iter_mut()) {
        let z = *wj;
        if *wj > 0.0 {
            *wj = (*wj - (u + *qj)).max(0.0);
        } else if *wj < 0.0 {
            *wj = (*wj + (u - *qj)).min(0.0);
        }
        *qj += *wj - z;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SGDClassifier {
    pub config: SGDConfig,
    pub weights: Option<Array1<f64>>,
    pub bias: f64,
    /// Sorted class labels; `classes[1]` is the positive class
    pub classes: Option<[f64; 2]>,
    pub n_iter: usize,
}

impl SGDClassifier {
    pub fn new(config: SGDConfig) -> Self {
        Self { config, weights: None, bias: 0.0, classes: None, n_iter: 0 }
    }

    fn learning_rate(&self, t: usize, optimal_init: f64) -> f64 {
        match self.config.learning_rate {
            LearningRateSchedule::Constant => self.config.eta0,
            LearningRateSchedule::Optimal => {
                1.0 / (self.config.alpha * (optimal_init + t as f64 - 1.0))
            }
            LearningRateSchedule::InvScaling => {
                self.config.eta0 / (t as f64).powf(self.config.power_t)
            }
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        let p = x.ncols();
        if n == 0 { return Err(TunerError::TrainingError("Empty dataset".into())); }
        if y.len() != n {
            return Err(TunerError::ShapeError {
                expected: format!("{} labels", n),
                actual: format!("{} labels", y.len()),
            });
        }
        self.config.validate()?;

        let classes = binary_classes(y)?;
        let y_signed: Vec<f64> = y.iter().map(|&v| if v == classes[1] { 1.0 } else { -1.0 }).collect();

        let loss = self.config.loss;
        let alpha = self.config.alpha;
        let epsilon = self.config.epsilon;
        let l1_ratio = self.config.penalty.effective_l1_ratio(self.config.l1_ratio);

        // Heuristic initial step of the optimal schedule (Bottou's t0)
        let optimal_init = match self.config.learning_rate {
            LearningRateSchedule::Optimal => {
                let typw = (1.0 / alpha.sqrt()).sqrt();
                let initial_eta0 = typw / loss.dloss(-typw, 1.0, epsilon).max(1.0);
                1.0 / (initial_eta0 * alpha)
            }
            _ => 0.0,
        };

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        let mut w = Array1::<f64>::zeros(p);
        let mut b = 0.0;
        let mut u = 0.0;
        let mut q = Array1::<f64>::zeros(p);
        let mut indices: Vec<usize> = (0..n).collect();
        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut t = 1usize;
        self.n_iter = 0;

        for epoch in 0..self.config.max_iter {
            if self.config.shuffle {
                indices.shuffle(&mut rng);
            }
            let mut sumloss = 0.0;

            for &i in &indices {
                let xi = x.row(i);
                let yi = y_signed[i];
                let pred = xi.dot(&w) + b;
                let eta = self.learning_rate(t, optimal_init);

                sumloss += loss.loss(pred, yi, epsilon);
                let dloss = loss.dloss(pred, yi, epsilon).clamp(-MAX_DLOSS, MAX_DLOSS);
                let update = -eta * dloss;

                if l1_ratio < 1.0 {
                    w *= (1.0 - (1.0 - l1_ratio) * eta * alpha).max(0.0);
                }
                if update != 0.0 {
                    w.scaled_add(update, &xi);
                    b += update;
                }
                if l1_ratio > 0.0 {
                    u += l1_ratio * eta * alpha;
                    apply_l1_penalty(&mut w, &mut q, u);
                }
                t += 1;
            }

            self.n_iter = epoch + 1;

            if !b.is_finite() || w.iter().any(|v| !v.is_finite()) {
                return Err(TunerError::TrainingError(format!(
                    "Floating-point under-/overflow at epoch {}; try a larger alpha or scaled inputs",
                    epoch + 1
                )));
            }

            if sumloss > best_loss - self.config.tol * n as f64 {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if sumloss < best_loss {
                best_loss = sumloss;
            }
            if no_improvement >= self.config.n_iter_no_change {
                break;
            }
        }

        self.weights = Some(w);
        self.bias = b;
        self.classes = Some(classes);
        Ok(())
    }

    /// Signed distance to the separating hyperplane
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let w = self.weights.as_ref().ok_or(TunerError::ModelNotFitted)?;
        if x.ncols() != w.len() {
            return Err(TunerError::ShapeError {
                expected: format!("{} features", w.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(w) + self.bias)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let classes = self.classes.ok_or(TunerError::ModelNotFitted)?;
        let scores = self.decision_function(x)?;
        Ok(scores.mapv(|s| if s > 0.0 { classes[1] } else { classes[0] }))
    }
}

fn binary_classes(y: &Array1<f64>) -> Result<[f64; 2]> {
    if y.iter().any(|v| !v.is_finite()) {
        return Err(TunerError::DataError("labels must be finite".into()));
    }
    let mut classes: Vec<f64> = y.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    match classes.as_slice() {
        [neg, pos] => Ok([*neg, *pos]),
        other => Err(TunerError::TrainingError(format!(
            "binary classification needs exactly 2 classes, got {}",
            other.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_classification_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_vec((100, 2), (0..200).map(|i| (i as f64) / 100.0 - 1.0).collect()).unwrap();
        let y = Array1::from_vec((0..100).map(|i| if i < 50 { 0.0 } else { 1.0 }).collect());
        (x, y)
    }

    fn accuracy(preds: &Array1<f64>, y: &Array1<f64>) -> f64 {
        preds.iter().zip(y.iter()).filter(|(&p, &t)| p == t).count() as f64 / y.len() as f64
    }

    #[test]
    fn test_sgd_classifier_log() {
        let (x, y) = make_classification_data();
        let config = SGDConfig { loss: SGDLoss::LogLoss, ..Default::default() };
        let mut model = SGDClassifier::new(config);
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        let acc = accuracy(&preds, &y);
        assert!(acc > 0.6, "Accuracy too low: {}", acc);
    }

    #[test]
    fn test_sgd_classifier_hinge() {
        let (x, y) = make_classification_data();
        let mut model = SGDClassifier::new(SGDConfig::default());
        model.fit(&x, &y).unwrap();
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.len(), 100);
        assert!(preds.iter().all(|&p| p == 0.0 || p == 1.0));
        assert!(model.n_iter >= 1);
    }

    #[test]
    fn test_every_loss_and_penalty_fits() {
        let (x, y) = make_classification_data();
        for loss in SGDLoss::ALL {
            for penalty in [Penalty::L1, Penalty::L2, Penalty::ElasticNet] {
                let config = SGDConfig {
                    loss,
                    penalty,
                    alpha: 0.01,
                    l1_ratio: 0.5,
                    learning_rate: LearningRateSchedule::Constant,
                    eta0: 0.01,
                    ..Default::default()
                };
                let mut model = SGDClassifier::new(config);
                model.fit(&x, &y).unwrap_or_else(|e| panic!("{} / {:?}: {}", loss, penalty, e));
                assert_eq!(model.predict(&x).unwrap().len(), 100);
            }
        }
    }

    #[test]
    fn test_seeded_fit_is_deterministic() {
        let (x, y) = make_classification_data();
        let config = SGDConfig { loss: SGDLoss::ModifiedHuber, random_state: Some(55), ..Default::default() };
        let mut a = SGDClassifier::new(config.clone());
        let mut b = SGDClassifier::new(config);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.weights, b.weights);
        assert_eq!(a.bias, b.bias);
    }

    #[test]
    fn test_divergence_is_reported() {
        let (x, y) = make_classification_data();
        let config = SGDConfig {
            loss: SGDLoss::SquaredError,
            learning_rate: LearningRateSchedule::Constant,
            eta0: 1e300,
            alpha: 0.0,
            ..Default::default()
        };
        let mut model = SGDClassifier::new(config);
        assert!(matches!(model.fit(&x, &y), Err(TunerError::TrainingError(_))));
    }

    #[test]
    fn test_single_class_rejected() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let y = Array1::from_vec(vec![1.0; 4]);
        let mut model = SGDClassifier::new(SGDConfig::default());
        assert!(matches!(model.fit(&x, &y), Err(TunerError::TrainingError(_))));
    }

    #[test]
    fn test_invscaling_schedule() {
        let (x, y) = make_classification_data();
        let config = SGDConfig {
            learning_rate: LearningRateSchedule::InvScaling,
            eta0: 0.01,
            ..Default::default()
        };
        let mut model = SGDClassifier::new(config);
        model.fit(&x, &y).unwrap();
        assert!(model.weights.is_some());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("squared_epsilon_insensitive".parse::<SGDLoss>().unwrap(), SGDLoss::SquaredEpsilonInsensitive);
        assert_eq!("elasticnet".parse::<Penalty>().unwrap(), Penalty::ElasticNet);
        assert!("log".parse::<SGDLoss>().is_err());
        assert!("l3".parse::<Penalty>().is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = make_classification_data();
        let model = SGDClassifier::new(SGDConfig::default());
        assert!(matches!(model.predict(&x), Err(TunerError::ModelNotFitted)));
    }
}

//! Hold-out train/test splitting

use crate::error::{Result, TunerError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A materialised train/test split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Split rows into train and test sets.
///
/// `test_size` is the fraction of rows held out (rounded up). With `stratify`
/// every class keeps its share of rows in both sets; each class needs at
/// least two members.
pub fn train_test_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    test_size: f64,
    stratify: bool,
    random_state: Option<u64>,
) -> Result<TrainTestSplit> {
    let n_samples = x.nrows();
    if y.len() != n_samples {
        return Err(TunerError::ShapeError {
            expected: format!("{} labels", n_samples),
            actual: format!("{} labels", y.len()),
        });
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TunerError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }

    // Tolerance keeps 0.3 * 100 at 30 rather than 31
    let n_test = (test_size * n_samples as f64 - 1e-9).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(TunerError::DataError(format!(
            "test_size {} leaves an empty split for {} samples",
            test_size, n_samples
        )));
    }

    let mut rng = match random_state {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let (mut train_idx, mut test_idx) = if stratify {
        stratified_indices(y, n_test, &mut rng)?
    } else {
        let mut indices: Vec<usize> = (0..n_samples).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        (train, indices)
    };

    train_idx.shuffle(&mut rng);
    test_idx.shuffle(&mut rng);

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &train_idx),
        x_test: x.select(Axis(0), &test_idx),
        y_train: y.select(Axis(0), &train_idx),
        y_test: y.select(Axis(0), &test_idx),
    })
}

fn stratified_indices(
    y: &Array1<f64>,
    n_test: usize,
    rng: &mut ChaCha8Rng,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let n_samples = y.len();

    // Group indices by class, classes in ascending label order
    let mut labels: Vec<f64> = y.to_vec();
    labels.sort_by(|a, b| a.total_cmp(b));
    labels.dedup();

    let mut class_indices: Vec<Vec<usize>> = labels
        .iter()
        .map(|&label| (0..n_samples).filter(|&i| y[i] == label).collect())
        .collect();

    if let Some((label, members)) = labels
        .iter()
        .zip(class_indices.iter())
        .find(|(_, members)| members.len() < 2)
    {
        return Err(TunerError::DataError(format!(
            "class {} has {} member(s); stratified split needs at least 2",
            label,
            members.len()
        )));
    }

    // Proportional allocation, remainder to the largest fractional parts
    let exact: Vec<f64> = class_indices
        .iter()
        .map(|members| members.len() as f64 * n_test as f64 / n_samples as f64)
        .collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let mut remaining = n_test - counts.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa)
    });
    for &c in order.iter().cycle().take(order.len() * 2) {
        if remaining == 0 {
            break;
        }
        if counts[c] < class_indices[c].len() {
            counts[c] += 1;
            remaining -= 1;
        }
    }

    let mut train = Vec::with_capacity(n_samples - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (members, &k) in class_indices.iter_mut().zip(counts.iter()) {
        members.shuffle(rng);
        test.extend_from_slice(&members[..k]);
        train.extend_from_slice(&members[k..]);
    }

    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_data(n: usize, positives: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| if i < positives { 1.0 } else { 0.0 });
        (x, y)
    }

    #[test]
    fn test_split_sizes() {
        let (x, y) = make_data(100, 50);
        let split = train_test_split(&x, &y, 0.3, true, Some(1)).unwrap();
        assert_eq!(split.x_test.nrows(), 30);
        assert_eq!(split.x_train.nrows(), 70);
        assert_eq!(split.y_test.len(), 30);
        assert_eq!(split.x_train.ncols(), 2);
    }

    #[test]
    fn test_stratification_preserves_ratio() {
        let (x, y) = make_data(100, 20);
        let split = train_test_split(&x, &y, 0.3, true, Some(7)).unwrap();
        let test_pos = split.y_test.iter().filter(|&&v| v == 1.0).count();
        let train_pos = split.y_train.iter().filter(|&&v| v == 1.0).count();
        assert_eq!(test_pos, 6);
        assert_eq!(train_pos, 14);
    }

    #[test]
    fn test_rows_stay_aligned() {
        let (x, y) = make_data(40, 20);
        let split = train_test_split(&x, &y, 0.25, true, Some(3)).unwrap();
        for (row, &label) in split.x_train.rows().into_iter().zip(split.y_train.iter()) {
            let original = (row[0] / 2.0) as usize;
            assert_eq!(label, if original < 20 { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn test_seeded_split_is_reproducible() {
        let (x, y) = make_data(50, 25);
        let a = train_test_split(&x, &y, 0.3, true, Some(1)).unwrap();
        let b = train_test_split(&x, &y, 0.3, true, Some(1)).unwrap();
        assert_eq!(a.x_test, b.x_test);
        assert_eq!(a.y_train, b.y_train);
    }

    #[test]
    fn test_plain_split() {
        let (x, y) = make_data(10, 5);
        let split = train_test_split(&x, &y, 0.5, false, Some(0)).unwrap();
        assert_eq!(split.x_train.nrows() + split.x_test.nrows(), 10);
    }

    #[test]
    fn test_invalid_inputs() {
        let (x, y) = make_data(10, 1);
        assert!(matches!(
            train_test_split(&x, &y, 0.3, true, Some(0)),
            Err(TunerError::DataError(_))
        ));
        assert!(matches!(
            train_test_split(&x, &y, 1.5, false, Some(0)),
            Err(TunerError::InvalidParameter { .. })
        ));
    }
}

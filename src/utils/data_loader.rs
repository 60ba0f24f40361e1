//! Data loading utilities

use crate::error::{Result, TunerError};
use crate::preprocessing::{train_test_split, Scaler, ScalerType};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Data loader for tabular files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used for schema inference on CSV files
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Load a CSV file
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        if !path.exists() {
            return Err(TunerError::DataError(format!("file not found: {}", path.display())));
        }

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| TunerError::DataError(e.to_string()))?
            .finish()
            .map_err(|e| TunerError::DataError(e.to_string()))
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| TunerError::DataError(format!("{}: {}", path.display(), e)))?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| TunerError::DataError(e.to_string()))
    }

    /// Load a JSON file
    pub fn load_json(&self, path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| TunerError::DataError(format!("{}: {}", path.display(), e)))?;

        JsonReader::new(file)
            .finish()
            .map_err(|e| TunerError::DataError(e.to_string()))
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: &Path) -> Result<DataFrame> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "parquet" | "pq" => self.load_parquet(path),
            "json" => self.load_json(path),
            // CSV is the default
            _ => self.load_csv(path),
        }
    }
}

/// Where the dataset lives and how it is turned into train/test arrays
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
    /// Binary label column
    pub target: String,
    /// Identifier columns removed before training
    pub drop_columns: Vec<String>,
    pub test_size: f64,
    pub stratify: bool,
    pub random_state: Option<u64>,
    pub scaler: ScalerType,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/alzheimers_disease_data.csv"),
            target: "Diagnosis".to_string(),
            drop_columns: vec!["PatientID".to_string(), "DoctorInCharge".to_string()],
            test_size: 0.3,
            stratify: true,
            random_state: Some(1),
            scaler: ScalerType::Standard,
        }
    }
}

impl DatasetConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_drop_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_scaler(mut self, scaler: ScalerType) -> Self {
        self.scaler = scaler;
        self
    }

    /// Load the file and produce the prepared split
    pub fn load(&self) -> Result<PreparedData> {
        let start = Instant::now();
        let df = DataLoader::new().load_auto(&self.path)?;
        info!(
            path = %self.path.display(),
            rows = df.height(),
            cols = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        PreparedData::from_frame(&df, self)
    }
}

/// Fixed, pre-split and pre-scaled data shared by every objective evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedData {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl PreparedData {
    /// Extract features and labels from a frame, then split and scale them
    pub fn from_frame(df: &DataFrame, config: &DatasetConfig) -> Result<Self> {
        let (x, y, feature_names) = frame_to_arrays(df, &config.target, &config.drop_columns)?;
        Self::from_arrays(x, y, feature_names, config)
    }

    /// Split and scale in-memory arrays
    pub fn from_arrays(
        x: Array2<f64>,
        y: Array1<f64>,
        feature_names: Vec<String>,
        config: &DatasetConfig,
    ) -> Result<Self> {
        if feature_names.len() != x.ncols() {
            return Err(TunerError::ShapeError {
                expected: format!("{} feature names", x.ncols()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }

        let split = train_test_split(&x, &y, config.test_size, config.stratify, config.random_state)?;

        // Fit on train only, apply to both
        let mut scaler = Scaler::new(config.scaler.clone());
        let x_train = scaler.fit_transform(&split.x_train)?;
        let x_test = scaler.transform(&split.x_test)?;

        debug!(
            n_train = x_train.nrows(),
            n_test = x_test.nrows(),
            n_features = x_train.ncols(),
            scaler = ?config.scaler,
            "Prepared train/test split"
        );

        Ok(Self {
            x_train,
            x_test,
            y_train: split.y_train,
            y_test: split.y_test,
            feature_names,
        })
    }

    pub fn n_features(&self) -> usize {
        self.x_train.ncols()
    }

    pub fn n_train(&self) -> usize {
        self.x_train.nrows()
    }

    pub fn n_test(&self) -> usize {
        self.x_test.nrows()
    }
}

/// Drop identifier columns and convert the rest to a numeric matrix and label vector
pub fn frame_to_arrays(
    df: &DataFrame,
    target: &str,
    drop_columns: &[String],
) -> Result<(Array2<f64>, Array1<f64>, Vec<String>)> {
    let mut df = df.clone();
    for name in drop_columns {
        if df.column(name).is_err() {
            return Err(TunerError::FeatureNotFound(name.clone()));
        }
        df = df.drop(name)?;
    }

    let target_column = df
        .column(target)
        .map_err(|_| TunerError::FeatureNotFound(target.to_string()))?;
    let y = column_values(target_column)?;
    let features = df.drop(target)?;

    if features.width() == 0 {
        return Err(TunerError::DataError("no feature columns left after dropping".into()));
    }

    let feature_names: Vec<String> = features
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut x = Array2::<f64>::zeros((features.height(), features.width()));
    for (j, column) in features.get_columns().iter().enumerate() {
        let values = column_values(column)?;
        x.column_mut(j).assign(&values);
    }

    Ok((x, y, feature_names))
}

fn column_values(column: &Column) -> Result<Array1<f64>> {
    let name = column.name().to_string();
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|e| TunerError::DataError(format!("column '{}' is not numeric: {}", name, e)))?;
    let ca = series.f64()?;

    ca.into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                TunerError::DataError(format!("missing or non-numeric value in column '{}' at row {}", name, row))
            })
        })
        .collect::<Result<Vec<f64>>>()
        .map(Array1::from_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_df() -> DataFrame {
        df!(
            "PatientID" => &[1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            "Age" => &[60.0, 70.0, 65.0, 80.0, 75.0, 62.0, 68.0, 90.0, 85.0, 71.0],
            "MMSE" => &[28.0, 20.0, 27.0, 12.0, 15.0, 29.0, 26.0, 10.0, 11.0, 18.0],
            "DoctorInCharge" => &["XXX"; 10],
            "Diagnosis" => &[0i64, 1, 0, 1, 1, 0, 0, 1, 1, 0]
        )
        .unwrap()
    }

    #[test]
    fn test_frame_to_arrays() {
        let df = sample_df();
        let drop = vec!["PatientID".to_string(), "DoctorInCharge".to_string()];
        let (x, y, names) = frame_to_arrays(&df, "Diagnosis", &drop).unwrap();

        assert_eq!(names, vec!["Age".to_string(), "MMSE".to_string()]);
        assert_eq!(x.dim(), (10, 2));
        assert_eq!(x[[3, 1]], 12.0);
        assert_eq!(y[1], 1.0);
    }

    #[test]
    fn test_missing_columns() {
        let df = sample_df();
        let err = frame_to_arrays(&df, "Label", &[]).unwrap_err();
        assert!(matches!(err, TunerError::FeatureNotFound(ref c) if c == "Label"));

        let err = frame_to_arrays(&df, "Diagnosis", &["Nope".to_string()]).unwrap_err();
        assert!(matches!(err, TunerError::FeatureNotFound(_)));
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let df = sample_df();
        let err = frame_to_arrays(&df, "Diagnosis", &["PatientID".to_string()]).unwrap_err();
        assert!(matches!(err, TunerError::DataError(_)));
    }

    #[test]
    fn test_prepared_data_from_frame() {
        let df = sample_df();
        let config = DatasetConfig::default();
        let data = PreparedData::from_frame(&df, &config).unwrap();

        assert_eq!(data.n_test(), 3);
        assert_eq!(data.n_train(), 7);
        assert_eq!(data.n_features(), 2);
        // Train features are standardized
        let mean = data.x_train.column(0).mean().unwrap();
        assert!(mean.abs() < 1e-10);
    }

    #[test]
    fn test_load_missing_file() {
        let config = DatasetConfig::new("/nonexistent/data.csv");
        assert!(matches!(config.load(), Err(TunerError::DataError(_))));
    }

    #[test]
    fn test_load_csv_roundtrip() {
        let path = std::env::temp_dir().join(format!("sma-tuner-loader-{}.csv", std::process::id()));
        let mut df = sample_df();
        let mut file = File::create(&path).unwrap();
        CsvWriter::new(&mut file).finish(&mut df).unwrap();

        let loaded = DataLoader::new().load_auto(&path).unwrap();
        assert_eq!(loaded.height(), 10);
        assert_eq!(loaded.width(), 5);

        let data = DatasetConfig::new(&path).load().unwrap();
        assert_eq!(data.n_train() + data.n_test(), 10);

        std::fs::remove_file(&path).ok();
    }
}

#[cfg(feature = "python")]
use pyo3::exceptions::{PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Schema: {0}")]
    Schema(String),

    #[error("Dataset has no dates to index")]
    EmptyDataset,

    #[error("Ordinal {ordinal} out of range: index holds {len} dates")]
    OutOfRange { ordinal: usize, len: usize },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: usize, end: usize },

    #[error("Invalid divisor: {0} (must be a positive number)")]
    InvalidDivisor(f64),

    #[error("Invalid rolling window: {0} (must be at least 1)")]
    InvalidWindow(usize),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(feature = "python")]
impl From<DashboardError> for PyErr {
    fn from(err: DashboardError) -> PyErr {
        match err {
            DashboardError::OutOfRange { .. }
            | DashboardError::InvalidRange { .. }
            | DashboardError::InvalidDivisor(_)
            | DashboardError::InvalidWindow(_)
            | DashboardError::UnknownMetric(_)
            | DashboardError::Config(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

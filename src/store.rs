use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime};
use polars::datatypes::TimeUnit;
use polars::prelude::StrptimeOptions;
use polars::prelude::*;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{DashboardError, Result};
use crate::schema::{format, metric, record};

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// One flat input row, as delivered by the data-acquisition layer.
///
/// Metric values are keyed by column name; unknown keys are ignored at load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub location: Option<String>,
    #[serde(default)]
    pub iso_code: Option<String>,
    pub date: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Option<f64>>,
}

/// The normalized dataset.
///
/// Columns: location, iso_code, date (Datetime, microseconds) and every
/// metric column as Float64. Rows are ordered by (location, date). The frame
/// is never mutated after construction.
#[derive(Debug, Clone)]
pub struct TabularStore {
    frame: DataFrame,
}

impl TabularStore {
    // ── Loading ─────────────────────────────────────────────────────────────

    /// Load a CSV file with every column read as a string, then normalize.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0)) // all columns as String
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        debug!(path = %path.display(), rows = raw.height(), "read raw csv");
        Self::from_frame(raw)
    }

    /// Load a sequence of flat records.
    pub fn from_records(records: &[RawRecord]) -> Result<Self> {
        let mut locations = Vec::with_capacity(records.len());
        let mut iso_codes = Vec::with_capacity(records.len());
        let mut dates = Vec::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            let location = rec.location.clone().ok_or_else(|| {
                DashboardError::Schema(format!("record {i} has no {}", record::LOCATION))
            })?;
            let date = rec.date.clone().ok_or_else(|| {
                DashboardError::Schema(format!("record {i} has no {}", record::DATE))
            })?;
            locations.push(location);
            iso_codes.push(rec.iso_code.clone());
            dates.push(date);
        }

        let mut columns = vec![
            Column::new(record::LOCATION.into(), &locations),
            Column::new(record::ISO_CODE.into(), &iso_codes),
            Column::new(record::DATE.into(), &dates),
        ];
        for name in metric::ALL {
            let values: Vec<Option<f64>> = records
                .iter()
                .map(|rec| rec.metrics.get(name).copied().flatten())
                .collect();
            columns.push(Column::new(name.into(), &values));
        }

        Self::from_frame(DataFrame::new(columns)?)
    }

    /// Normalize an arbitrary frame into the store schema.
    ///
    /// Required columns: location, date. `date` is either a string in
    /// `%Y-%m-%d` form or a Datetime. Metric columns may be strings or numbers;
    /// unparsable values become null, absent columns become all-null.
    pub fn from_frame(raw: DataFrame) -> Result<Self> {
        let mut raw = raw;

        // Trim whitespace from column names
        let trimmed: Vec<String> = raw
            .get_column_names_str()
            .iter()
            .map(|c| c.trim().to_string())
            .collect();
        raw.set_column_names(trimmed.as_slice())?;

        require_columns(&raw, &[record::LOCATION, record::DATE])?;

        let date_expr = match raw.column(record::DATE)?.dtype() {
            DataType::String => col(record::DATE)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .str()
                .to_datetime(
                    Some(TimeUnit::Microseconds),
                    None,
                    StrptimeOptions {
                        format: Some(format::DATE.into()),
                        strict: true,
                        ..Default::default()
                    },
                    lit("raise"),
                ),
            // Floor to midnight so every row matches its calendar day.
            DataType::Datetime(_, _) => {
                let micros = col(record::DATE)
                    .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                    .cast(DataType::Int64);
                let day = lit(MICROS_PER_DAY);
                let time_of_day = ((micros.clone() % day.clone()) + day.clone()) % day;
                (micros - time_of_day)
                    .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                    .alias(record::DATE)
            }
            other => {
                return Err(DashboardError::Schema(format!(
                    "column '{}' has unsupported type {other}",
                    record::DATE
                )))
            }
        };

        let iso_expr = if raw.schema().contains(record::ISO_CODE) {
            col(record::ISO_CODE).cast(DataType::String)
        } else {
            lit(NULL).cast(DataType::String).alias(record::ISO_CODE)
        };

        let mut exprs = vec![
            col(record::LOCATION).cast(DataType::String),
            iso_expr,
            date_expr,
        ];

        let mut filled = Vec::new();
        for name in metric::ALL {
            let expr = match raw.column(name).ok().map(|c| c.dtype()) {
                Some(DataType::String) => col(name)
                    .str()
                    .strip_chars(lit(" \t\r\n"))
                    .cast(DataType::Float64),
                Some(_) => col(name).cast(DataType::Float64),
                None => {
                    filled.push(name);
                    lit(NULL).cast(DataType::Float64).alias(name)
                }
            };
            exprs.push(expr);
        }

        let frame = raw
            .lazy()
            .select(exprs)
            .sort_by_exprs(
                [col(record::LOCATION), col(record::DATE)],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()
            .map_err(|e| DashboardError::Schema(format!("cannot normalize dataset: {e}")))?;

        for name in [record::LOCATION, record::DATE] {
            let null_count = frame.column(name)?.null_count();
            if null_count > 0 {
                return Err(DashboardError::Schema(format!(
                    "column '{name}' has {null_count} null values"
                )));
            }
        }

        if !filled.is_empty() {
            debug!(columns = ?filled, "metric columns absent, filled with nulls");
        }

        let store = Self { frame };
        info!(
            rows = store.height(),
            locations = store.locations()?.len(),
            "loaded dataset"
        );
        Ok(store)
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Sorted distinct location names, for the country selector.
    pub fn locations(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .frame
            .column(record::LOCATION)?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Sorted distinct dates across all locations.
    pub fn distinct_dates(&self) -> Result<BTreeSet<NaiveDate>> {
        Ok(date_values(&self.frame)?.into_iter().collect())
    }
}

// ── Frame helpers ───────────────────────────────────────────────────────────

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(DashboardError::Schema(format!(
                "missing required column '{col_name}'"
            )));
        }
    }
    Ok(())
}

/// Calendar date of every row of a store-shaped frame, in row order.
pub(crate) fn date_values(frame: &DataFrame) -> Result<Vec<NaiveDate>> {
    let micros = frame
        .column(record::DATE)?
        .as_materialized_series()
        .cast(&DataType::Int64)?;
    let dates = micros
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(i, us)| {
            us.and_then(micros_to_date)
                .ok_or_else(|| DashboardError::Schema(format!("null date at row {i}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(dates)
}

/// Location of every row, in row order.
pub(crate) fn location_values(frame: &DataFrame) -> Result<Vec<String>> {
    frame
        .column(record::LOCATION)?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, loc)| {
            loc.map(str::to_string)
                .ok_or_else(|| DashboardError::Schema(format!("null location at row {i}")))
        })
        .collect()
}

/// Numeric values of a column, in row order. Fails with `UnknownMetric` if
/// the column does not exist.
pub(crate) fn numeric_values(frame: &DataFrame, column: &str) -> Result<Vec<Option<f64>>> {
    let values = frame
        .column(column)
        .map_err(|_| DashboardError::UnknownMetric(column.to_string()))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().collect())
}

pub(crate) fn micros_to_date(us: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_micros(us).map(|dt| dt.date_naive())
}

pub(crate) fn date_to_micros(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_micros()
}

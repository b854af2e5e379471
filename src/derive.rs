use polars::prelude::*;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::query::ProjectedSubset;
use crate::schema::derived;
use crate::store;

/// Default trailing window: the current day and the six before it.
pub const DEFAULT_WINDOW: usize = 7;

/// Attach a `rolling_mean` column: per location, the mean of the non-null
/// `metric` values among the current row and the `window - 1` rows before it
/// in the same location. Rows keep their subset order; groups are never
/// re-sorted. A window without any value yields null.
pub fn derive_rolling_mean(
    subset: &ProjectedSubset,
    metric: &str,
    window: usize,
) -> Result<ProjectedSubset> {
    if window == 0 {
        return Err(DashboardError::InvalidWindow(window));
    }
    let values = store::numeric_values(subset.frame(), metric)?;

    let mut means: Vec<Option<f64>> = vec![None; values.len()];
    for (_, rows) in subset.location_groups()? {
        let group: Vec<Option<f64>> = rows.iter().map(|&row| values[row]).collect();
        for (row, mean) in rows.iter().zip(trailing_mean(&group, window)) {
            means[*row] = mean;
        }
    }

    let mut frame = subset.frame().clone();
    frame.with_column(Column::new(derived::ROLLING_MEAN.into(), &means))?;

    debug!(metric, window, rows = frame.height(), "derived rolling mean");
    Ok(ProjectedSubset::new(frame))
}

/// Attach a `scaled_value` column equal to `metric / divisor`.
pub fn derive_scaled(
    subset: &ProjectedSubset,
    metric: &str,
    divisor: f64,
) -> Result<ProjectedSubset> {
    if !(divisor > 0.0 && divisor.is_finite()) {
        return Err(DashboardError::InvalidDivisor(divisor));
    }
    let scaled: Vec<Option<f64>> = store::numeric_values(subset.frame(), metric)?
        .into_iter()
        .map(|v| v.map(|v| v / divisor))
        .collect();

    let mut frame = subset.frame().clone();
    frame.with_column(Column::new(derived::SCALED_VALUE.into(), &scaled))?;

    debug!(metric, divisor, rows = frame.height(), "derived scaled value");
    Ok(ProjectedSubset::new(frame))
}

/// Trailing mean over every prefix window ending at each index, skipping
/// nulls. Windows shorter than `window` at the start are averaged as-is.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|index| {
            let start = (index + 1).saturating_sub(window);
            let (sum, count) = values[start..=index]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect()
}

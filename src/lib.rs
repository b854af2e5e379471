//! Time-series filtering and derived-metric engine behind the World COVID-19
//! dashboard.
//!
//! A [`TabularStore`] holds the normalized dataset, a [`DateIndex`] maps
//! slider ordinals to dates, and every view is computed by composing
//! [`query`], the derivations in [`derive`] and a builder from [`views`].
//! [`Dashboard`] bundles the store, the index and the configuration.

pub mod config;
pub mod dashboard;
pub mod date_index;
pub mod derive;
pub mod error;
pub mod query;
pub mod schema;
pub mod selection;
pub mod store;
pub mod views;

#[cfg(feature = "python")]
mod python;
#[cfg(test)]
mod test_support;

pub use config::DashboardConfig;
pub use dashboard::Dashboard;
pub use date_index::{DateIndex, TickLabelSet, TickPolicy};
pub use derive::{derive_rolling_mean, derive_scaled, DEFAULT_WINDOW};
pub use error::{DashboardError, Result};
pub use query::{filter, query, ProjectedSubset};
pub use selection::{DateRange, Scale, Selection};
pub use store::{RawRecord, TabularStore};
pub use views::{
    build_indicator_series, build_line_series, build_map_frames, IndicatorChart, MapFrames,
    SeriesView,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;
#[cfg(feature = "python")]
use pyo3::types::PyModule;

/// Export schema constants as Python submodules
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Record
    let record = PyModule::new(m.py(), "record")?;
    record.add("LOCATION", schema::record::LOCATION)?;
    record.add("ISO_CODE", schema::record::ISO_CODE)?;
    record.add("DATE", schema::record::DATE)?;
    m.add_submodule(&record)?;

    // Metrics
    let metric = PyModule::new(m.py(), "metric")?;
    metric.add("ALL", schema::metric::ALL.to_vec())?;
    m.add_submodule(&metric)?;

    // Derived
    let derived = PyModule::new(m.py(), "derived")?;
    derived.add("ROLLING_MEAN", schema::derived::ROLLING_MEAN)?;
    derived.add("SCALED_VALUE", schema::derived::SCALED_VALUE)?;
    m.add_submodule(&derived)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
#[pyo3(name = "_core")]
fn covid_explorer_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyDashboard>()?;
    m.add_class::<python::PySelection>()?;
    add_schema_exports(m)?;
    Ok(())
}

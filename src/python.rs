use std::collections::{BTreeMap, BTreeSet};

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::schema::{format, INDICATORS};
use crate::selection::{Scale, Selection};

/// Python view of a `Selection`.
///
/// `start`/`end` are date ordinals; leaving both out selects the full range,
/// leaving one out pins that side to the corresponding end of the index.
#[pyclass(name = "Selection")]
#[derive(Clone)]
pub struct PySelection {
    start: Option<usize>,
    end: Option<usize>,
    countries: BTreeSet<String>,
    indicator: String,
    scale: Scale,
    show_points: bool,
}

#[pymethods]
impl PySelection {
    #[new]
    #[pyo3(signature = (
        indicator = "new_cases_per_million",
        start = None,
        end = None,
        countries = None,
        scale = "linear",
        show_points = false,
    ))]
    fn new(
        indicator: &str,
        start: Option<usize>,
        end: Option<usize>,
        countries: Option<Vec<String>>,
        scale: &str,
        show_points: bool,
    ) -> PyResult<Self> {
        Ok(Self {
            start,
            end,
            countries: countries.unwrap_or_default().into_iter().collect(),
            indicator: indicator.to_string(),
            scale: scale.parse::<Scale>()?,
            show_points,
        })
    }

    #[getter]
    fn indicator(&self) -> &str {
        &self.indicator
    }

    #[getter]
    fn countries(&self) -> Vec<String> {
        self.countries.iter().cloned().collect()
    }
}

impl PySelection {
    fn to_selection(&self, dashboard: &Dashboard) -> Selection {
        let selection = Selection::new(self.indicator.clone())
            .with_countries(self.countries.iter().cloned())
            .with_scale(self.scale)
            .with_points(self.show_points);
        match (self.start, self.end) {
            (None, None) => selection,
            (start, end) => selection.with_date_range(
                start.unwrap_or(0),
                end.unwrap_or_else(|| dashboard.index().last_ordinal()),
            ),
        }
    }
}

/// Entry point for the Dash front-end. View methods return JSON strings.
#[pyclass(name = "Dashboard")]
pub struct PyDashboard {
    inner: Dashboard,
}

#[pymethods]
impl PyDashboard {
    #[new]
    #[pyo3(signature = (data_path, config_path = None))]
    fn new(data_path: &str, config_path: Option<&str>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => DashboardConfig::from_path(path)?,
            None => DashboardConfig::default(),
        };
        Ok(Self {
            inner: Dashboard::from_csv(data_path, config)?,
        })
    }

    // ── Controls ────────────────────────────────────────────────────────────

    #[getter]
    fn date_count(&self) -> usize {
        self.inner.index().len()
    }

    fn dates(&self) -> Vec<String> {
        self.inner
            .index()
            .dates()
            .iter()
            .map(|d| d.format(format::DATE).to_string())
            .collect()
    }

    fn tick_labels(&self) -> BTreeMap<usize, String> {
        self.inner
            .index()
            .ticks()
            .iter()
            .map(|(k, label)| (k, label.to_string()))
            .collect()
    }

    fn locations(&self) -> PyResult<Vec<String>> {
        Ok(self.inner.store().locations()?)
    }

    /// (field, label) pairs for the indicator dropdowns.
    #[staticmethod]
    fn indicators() -> Vec<(&'static str, &'static str)> {
        INDICATORS.iter().map(|ind| (ind.field, ind.label)).collect()
    }

    fn chart_names(&self) -> Vec<String> {
        self.inner
            .config()
            .charts
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn default_selection(&self) -> PySelection {
        let selection = self.inner.default_selection();
        PySelection {
            start: None,
            end: None,
            countries: selection.countries().clone(),
            indicator: selection.indicator().to_string(),
            scale: selection.scale(),
            show_points: selection.show_points(),
        }
    }

    fn range_label(&self, selection: PyRef<'_, PySelection>) -> PyResult<String> {
        Ok(self
            .inner
            .range_label(&selection.to_selection(&self.inner))?)
    }

    // ── Views ───────────────────────────────────────────────────────────────

    fn query(&self, selection: PyRef<'_, PySelection>) -> PyResult<PyDataFrame> {
        let subset = self.inner.query(&selection.to_selection(&self.inner))?;
        Ok(PyDataFrame(subset.into_frame()))
    }

    fn map_frames(&self, selection: PyRef<'_, PySelection>) -> PyResult<String> {
        let view = self.inner.map_frames(&selection.to_selection(&self.inner))?;
        Ok(view.to_json()?)
    }

    fn line_chart(&self, selection: PyRef<'_, PySelection>) -> PyResult<String> {
        let view = self.inner.line_chart(&selection.to_selection(&self.inner))?;
        Ok(view.to_json()?)
    }

    fn indicator_chart(&self, name: &str, selection: PyRef<'_, PySelection>) -> PyResult<String> {
        let chart = self.inner.chart(name)?;
        let view = self
            .inner
            .indicator_chart(&selection.to_selection(&self.inner), chart)?;
        Ok(view.to_json()?)
    }
}

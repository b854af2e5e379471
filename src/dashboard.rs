use std::path::Path;

use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::date_index::DateIndex;
use crate::derive::{derive_rolling_mean, derive_scaled};
use crate::error::{DashboardError, Result};
use crate::query::{query, ProjectedSubset};
use crate::schema::derived;
use crate::selection::Selection;
use crate::store::TabularStore;
use crate::views::{
    build_indicator_series, build_line_series, build_map_frames, IndicatorChart, MapFrames,
    SeriesView,
};

/// Loaded dataset plus everything precomputed from it.
///
/// Read-only after construction; every view call runs
/// Selection → Filter → Derive → Build on fresh frames, so one `Dashboard`
/// can serve concurrent callers without locking.
#[derive(Debug, Clone)]
pub struct Dashboard {
    store: TabularStore,
    index: DateIndex,
    config: DashboardConfig,
}

impl Dashboard {
    pub fn new(store: TabularStore, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let index = DateIndex::build_with(&store, config.tick_policy())?;
        info!(
            rows = store.height(),
            dates = index.len(),
            ticks = index.ticks().len(),
            "dashboard ready"
        );
        Ok(Self {
            store,
            index,
            config,
        })
    }

    pub fn from_csv(path: impl AsRef<Path>, config: DashboardConfig) -> Result<Self> {
        Self::new(TabularStore::from_csv(path)?, config)
    }

    pub fn store(&self) -> &TabularStore {
        &self.store
    }

    pub fn index(&self) -> &DateIndex {
        &self.index
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Initial state of the controls: configured indicator and countries over
    /// the full date range.
    pub fn default_selection(&self) -> Selection {
        Selection::new(self.config.default_indicator.clone())
            .with_countries(self.config.default_countries.iter().cloned())
    }

    pub fn chart(&self, name: &str) -> Result<&IndicatorChart> {
        self.config
            .chart(name)
            .ok_or_else(|| DashboardError::Config(format!("unknown chart '{name}'")))
    }

    pub fn range_label(&self, selection: &Selection) -> Result<String> {
        self.index.range_label(selection.resolved_range(&self.index)?)
    }

    // ── Pipelines ───────────────────────────────────────────────────────────

    pub fn query(&self, selection: &Selection) -> Result<ProjectedSubset> {
        query(&self.store, &self.index, selection)
    }

    pub fn map_frames(&self, selection: &Selection) -> Result<MapFrames> {
        let subset = self.query(selection)?;
        build_map_frames(&subset, selection)
    }

    pub fn line_chart(&self, selection: &Selection) -> Result<SeriesView> {
        let subset = self.query(selection)?;
        let subset =
            derive_rolling_mean(&subset, selection.indicator(), self.config.rolling_window)?;
        build_line_series(&subset, selection)
    }

    pub fn indicator_chart(
        &self,
        selection: &Selection,
        chart: &IndicatorChart,
    ) -> Result<SeriesView> {
        let subset = self.query(selection)?;
        let subset = derive_scaled(&subset, &chart.metric, chart.divisor)?;
        let subset =
            derive_rolling_mean(&subset, derived::SCALED_VALUE, self.config.rolling_window)?;
        debug!(chart = %chart.name, rows = subset.height(), "built indicator chart");
        build_indicator_series(&subset, selection, chart)
    }

    /// Every configured indicator chart, in configuration order.
    pub fn indicator_charts(&self, selection: &Selection) -> Result<Vec<SeriesView>> {
        // Filter once, then derive per chart.
        let subset = self.query(selection)?;
        self.config
            .charts
            .iter()
            .map(|chart| {
                let scaled = derive_scaled(&subset, &chart.metric, chart.divisor)?;
                let smoothed = derive_rolling_mean(
                    &scaled,
                    derived::SCALED_VALUE,
                    self.config.rolling_window,
                )?;
                build_indicator_series(&smoothed, selection, chart)
            })
            .collect()
    }
}

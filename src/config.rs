use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::date_index::TickPolicy;
use crate::derive::DEFAULT_WINDOW;
use crate::error::{DashboardError, Result};
use crate::schema::{metric, INDICATORS};
use crate::views::IndicatorChart;

/// Dashboard settings. Every field has a default, so a YAML file only needs
/// the keys it overrides:
///
/// ```yaml
/// rolling_window: 14
/// default_countries: [Norway, Sweden]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    pub rolling_window: usize,
    pub tick_interval_months: u32,
    pub tick_guard_start: usize,
    pub tick_guard_end: usize,
    pub default_indicator: String,
    pub default_countries: Vec<String>,
    pub charts: Vec<IndicatorChart>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let ticks = TickPolicy::default();
        Self {
            rolling_window: DEFAULT_WINDOW,
            tick_interval_months: ticks.interval_months,
            tick_guard_start: ticks.guard_start,
            tick_guard_end: ticks.guard_end,
            default_indicator: metric::NEW_CASES_PER_MILLION.to_string(),
            default_countries: ["Canada", "United States", "United Kingdom", "France", "Singapore"]
                .into_iter()
                .map(String::from)
                .collect(),
            charts: IndicatorChart::presets(),
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rolling_window == 0 {
            return Err(DashboardError::Config(
                "rolling_window must be at least 1".to_string(),
            ));
        }
        if self.tick_interval_months == 0 {
            return Err(DashboardError::Config(
                "tick_interval_months must be at least 1".to_string(),
            ));
        }
        if !INDICATORS.iter().any(|ind| ind.field == self.default_indicator) {
            return Err(DashboardError::Config(format!(
                "default_indicator '{}' is not a selectable indicator",
                self.default_indicator
            )));
        }
        for chart in &self.charts {
            if !(chart.divisor > 0.0 && chart.divisor.is_finite()) {
                return Err(DashboardError::Config(format!(
                    "chart '{}' has non-positive divisor {}",
                    chart.name, chart.divisor
                )));
            }
        }
        Ok(())
    }

    pub fn tick_policy(&self) -> TickPolicy {
        TickPolicy {
            interval_months: self.tick_interval_months,
            guard_start: self.tick_guard_start,
            guard_end: self.tick_guard_end,
        }
    }

    pub fn chart(&self, name: &str) -> Option<&IndicatorChart> {
        self.charts.iter().find(|c| c.name == name)
    }
}

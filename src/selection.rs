use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::date_index::DateIndex;
use crate::error::{DashboardError, Result};
use crate::schema::metric;

/// Inclusive range of date ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: usize,
    pub end: usize,
}

impl DateRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Reject out-of-order bounds and ordinals the index does not cover.
    /// Bounds are never clamped here.
    pub fn validate(&self, index: &DateIndex) -> Result<()> {
        if self.start > self.end {
            return Err(DashboardError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        if self.end >= index.len() {
            return Err(DashboardError::OutOfRange {
                ordinal: self.end,
                len: index.len(),
            });
        }
        Ok(())
    }
}

/// Axis scale requested for line and indicator charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    #[default]
    Linear,
    Symlog,
}

impl Scale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scale::Linear => "linear",
            Scale::Symlog => "symlog",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scale {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Scale::Linear),
            "symlog" | "log" => Ok(Scale::Symlog),
            other => Err(DashboardError::Config(format!(
                "Invalid scale: '{other}'. Must be 'linear' or 'symlog'"
            ))),
        }
    }
}

/// The user's current query. Immutable: every `with_*` call returns a new
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    date_range: Option<DateRange>,
    countries: BTreeSet<String>,
    indicator: String,
    scale: Scale,
    show_points: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(metric::NEW_CASES_PER_MILLION)
    }
}

impl Selection {
    /// Full date range, all countries, linear scale, no points.
    pub fn new(indicator: impl Into<String>) -> Self {
        Self {
            date_range: None,
            countries: BTreeSet::new(),
            indicator: indicator.into(),
            scale: Scale::Linear,
            show_points: false,
        }
    }

    pub fn with_date_range(self, start: usize, end: usize) -> Self {
        Self {
            date_range: Some(DateRange::new(start, end)),
            ..self
        }
    }

    pub fn with_full_range(self) -> Self {
        Self {
            date_range: None,
            ..self
        }
    }

    pub fn with_countries<I, S>(self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            countries: countries.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_indicator(self, indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            ..self
        }
    }

    pub fn with_scale(self, scale: Scale) -> Self {
        Self { scale, ..self }
    }

    pub fn with_points(self, show_points: bool) -> Self {
        Self {
            show_points,
            ..self
        }
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    /// Empty means every location.
    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn show_points(&self) -> bool {
        self.show_points
    }

    /// The concrete, validated range for `index`. An absent range means the
    /// full range of the index.
    pub fn resolved_range(&self, index: &DateIndex) -> Result<DateRange> {
        let range = self.date_range.unwrap_or_else(|| index.full_range());
        range.validate(index)?;
        Ok(range)
    }
}

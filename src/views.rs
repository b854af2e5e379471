//! View models handed to the rendering layer.
//!
//! Every builder is a pure function of a projected subset (with the derived
//! columns it needs already attached) and a selection. Locations without rows
//! in the subset never appear in the output.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::query::ProjectedSubset;
use crate::schema::{derived, format, indicator_label, metric, record};
use crate::selection::{Scale, Selection};
use crate::store;

// ── Config ──────────────────────────────────────────────────────────────────

/// One fixed-metric chart: which column, how it is titled, and the unit
/// divisor applied before smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorChart {
    pub name: String,
    pub metric: String,
    pub title: String,
    #[serde(default = "unit_divisor")]
    pub divisor: f64,
}

fn unit_divisor() -> f64 {
    1.0
}

impl IndicatorChart {
    pub fn new(name: &str, metric: &str, title: &str, divisor: f64) -> Self {
        Self {
            name: name.to_string(),
            metric: metric.to_string(),
            title: title.to_string(),
            divisor,
        }
    }

    /// The four charts of the "Charts" tab.
    pub fn presets() -> Vec<IndicatorChart> {
        vec![
            Self::new(
                "vaccinated",
                metric::PEOPLE_FULLY_VACCINATED,
                "People fully vaccinated",
                1_000_000.0,
            ),
            Self::new(
                "newly_vaccinated",
                metric::NEW_VACCINATIONS,
                "People newly vaccinated",
                1_000_000.0,
            ),
            Self::new(
                "icu",
                metric::ICU_PATIENTS_PER_MILLION,
                "ICU patients per million",
                1.0,
            ),
            Self::new(
                "hospitalized",
                metric::HOSP_PATIENTS_PER_MILLION,
                "Hospitalized patients per million",
                1.0,
            ),
        ]
    }
}

// ── View models ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapValue {
    pub iso_code: String,
    pub location: String,
    pub value: Option<f64>,
}

/// All countries on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrame {
    pub date: String,
    pub values: Vec<MapValue>,
}

/// Animated choropleth: one frame per distinct date, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFrames {
    pub indicator: String,
    pub label: Option<String>,
    pub frames: Vec<MapFrame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSeries {
    pub location: String,
    pub rolling_mean: Vec<SeriesPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<SeriesPoint>>,
}

/// Per-location smoothed lines for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub metric: String,
    pub title: String,
    pub scale: Scale,
    pub series: Vec<LocationSeries>,
}

macro_rules! impl_to_json {
    ($($ty:ty),*) => {
        $(impl $ty {
            pub fn to_json(&self) -> Result<String> {
                Ok(serde_json::to_string(self)?)
            }
        })*
    };
}

impl_to_json!(MapFrames, SeriesView);

// ── Builders ────────────────────────────────────────────────────────────────

/// Map frames of the selection's indicator. Rows without an iso_code
/// (aggregate regions) cannot be placed on a map and are left out.
pub fn build_map_frames(subset: &ProjectedSubset, selection: &Selection) -> Result<MapFrames> {
    let indicator = selection.indicator();
    let values = store::numeric_values(subset.frame(), indicator)?;
    let dates = store::date_values(subset.frame())?;
    let locations = store::location_values(subset.frame())?;
    let iso_codes = subset.frame().column(record::ISO_CODE)?.str()?;

    let mut frames: BTreeMap<NaiveDate, Vec<MapValue>> = BTreeMap::new();
    for (row, date) in dates.iter().enumerate() {
        let day = frames.entry(*date).or_default();
        let Some(iso_code) = iso_codes.get(row) else {
            continue;
        };
        day.push(MapValue {
            iso_code: iso_code.to_string(),
            location: locations[row].clone(),
            value: values[row],
        });
    }

    Ok(MapFrames {
        indicator: indicator.to_string(),
        label: indicator_label(indicator).map(str::to_string),
        frames: frames
            .into_iter()
            .map(|(date, values)| MapFrame {
                date: date.format(format::DATE).to_string(),
                values,
            })
            .collect(),
    })
}

/// Comparative line plot of the selection's indicator. Expects a
/// `rolling_mean` derived from that indicator; raw points are attached when
/// the selection asks for them.
pub fn build_line_series(subset: &ProjectedSubset, selection: &Selection) -> Result<SeriesView> {
    let indicator = selection.indicator();
    let title = indicator_label(indicator).unwrap_or(indicator);
    let raw = selection.show_points().then_some(indicator);
    build_series(subset, selection.scale(), indicator, title, raw)
}

/// One of the fixed-metric charts. Expects a `rolling_mean` derived from the
/// chart's (scaled) metric.
pub fn build_indicator_series(
    subset: &ProjectedSubset,
    selection: &Selection,
    chart: &IndicatorChart,
) -> Result<SeriesView> {
    build_series(subset, selection.scale(), &chart.metric, &chart.title, None)
}

fn build_series(
    subset: &ProjectedSubset,
    scale: Scale,
    metric: &str,
    title: &str,
    raw_points: Option<&str>,
) -> Result<SeriesView> {
    if !subset.has_column(derived::ROLLING_MEAN) {
        return Err(DashboardError::MissingColumn(derived::ROLLING_MEAN.to_string()));
    }
    let means = store::numeric_values(subset.frame(), derived::ROLLING_MEAN)?;
    let raw = raw_points
        .map(|column| store::numeric_values(subset.frame(), column))
        .transpose()?;
    let dates: Vec<String> = store::date_values(subset.frame())?
        .iter()
        .map(|d| d.format(format::DATE).to_string())
        .collect();

    let point = |row: usize, values: &[Option<f64>]| SeriesPoint {
        date: dates[row].clone(),
        value: values[row],
    };

    let series = subset
        .location_groups()?
        .into_iter()
        .map(|(location, rows)| LocationSeries {
            location,
            rolling_mean: rows.iter().map(|&row| point(row, means.as_slice())).collect(),
            points: raw
                .as_ref()
                .map(|raw| rows.iter().map(|&row| point(row, raw.as_slice())).collect()),
        })
        .collect();

    Ok(SeriesView {
        metric: metric.to_string(),
        title: title.to_string(),
        scale,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_index::DateIndex;
    use crate::derive::{derive_rolling_mean, derive_scaled, DEFAULT_WINDOW};
    use crate::query::query;
    use crate::store::TabularStore;
    use crate::test_support::{daily_records, raw_record};

    fn fixture() -> (TabularStore, DateIndex) {
        let mut records = daily_records(
            "Canada",
            Some("CAN"),
            "2021-01-01",
            4,
            metric::NEW_CASES,
            100.0,
        );
        records.extend(daily_records(
            "France",
            Some("FRA"),
            "2021-01-02",
            3,
            metric::NEW_CASES,
            0.0,
        ));
        records.extend(daily_records(
            "World",
            None,
            "2021-01-01",
            4,
            metric::NEW_CASES,
            1000.0,
        ));
        let store = TabularStore::from_records(&records).unwrap();
        let index = DateIndex::build(&store).unwrap();
        (store, index)
    }

    #[test]
    fn map_has_one_frame_per_date_and_skips_regions() {
        let (store, index) = fixture();
        let sel = Selection::new(metric::NEW_CASES);
        let subset = query(&store, &index, &sel).unwrap();

        let map = build_map_frames(&subset, &sel).unwrap();

        assert_eq!(map.frames.len(), 4);
        assert_eq!(map.frames[0].date, "2021-01-01");
        assert_eq!(map.frames[0].values.len(), 1);
        assert_eq!(map.frames[1].values.len(), 2);
        assert_eq!(map.label.as_deref(), Some("Daily confirmed cases"));
        assert!(map
            .frames
            .iter()
            .flat_map(|f| &f.values)
            .all(|v| v.location != "World"));
        assert_eq!(
            map.frames[3].values[1],
            MapValue {
                iso_code: "FRA".into(),
                location: "France".into(),
                value: Some(0.0),
            }
        );
    }

    #[test]
    fn map_with_unknown_indicator_fails() {
        let (store, index) = fixture();
        let sel = Selection::new("excess_mortality");
        let subset = query(&store, &index, &sel).unwrap();
        assert!(matches!(
            build_map_frames(&subset, &sel),
            Err(DashboardError::UnknownMetric(_))
        ));
    }

    #[test]
    fn line_series_per_location_with_optional_points() {
        let (store, index) = fixture();
        let sel = Selection::new(metric::NEW_CASES)
            .with_countries(["Canada", "France"])
            .with_scale(Scale::Symlog);
        let subset = query(&store, &index, &sel).unwrap();
        let subset = derive_rolling_mean(&subset, metric::NEW_CASES, DEFAULT_WINDOW).unwrap();

        let without = build_line_series(&subset, &sel).unwrap();
        assert_eq!(without.series.len(), 2);
        assert_eq!(without.scale, Scale::Symlog);
        assert!(without.series.iter().all(|s| s.points.is_none()));
        // Zero under symlog is still a plain value.
        assert_eq!(without.series[1].rolling_mean[0].value, Some(0.0));

        let with = build_line_series(&subset, &sel.clone().with_points(true)).unwrap();
        let canada = &with.series[0];
        assert_eq!(canada.location, "Canada");
        assert_eq!(canada.rolling_mean.len(), 4);
        assert_eq!(canada.points.as_ref().map(Vec::len), Some(4));
        assert_eq!(canada.rolling_mean[3].date, "2021-01-04");
    }

    #[test]
    fn locations_without_rows_are_absent() {
        let (store, index) = fixture();
        // France starts on the second day.
        let sel = Selection::new(metric::NEW_CASES)
            .with_date_range(0, 0)
            .with_countries(["Canada", "France"]);
        let subset = query(&store, &index, &sel).unwrap();
        let subset = derive_rolling_mean(&subset, metric::NEW_CASES, DEFAULT_WINDOW).unwrap();

        let view = build_line_series(&subset, &sel).unwrap();
        let names: Vec<&str> = view.series.iter().map(|s| s.location.as_str()).collect();
        assert_eq!(names, ["Canada"]);
    }

    #[test]
    fn series_requires_rolling_mean() {
        let (store, index) = fixture();
        let sel = Selection::new(metric::NEW_CASES);
        let subset = query(&store, &index, &sel).unwrap();
        assert!(matches!(
            build_line_series(&subset, &sel),
            Err(DashboardError::MissingColumn(_))
        ));
    }

    #[test]
    fn indicator_chart_uses_scaled_metric() {
        let records = vec![
            raw_record(
                "Canada",
                Some("CAN"),
                "2021-06-01",
                &[(metric::PEOPLE_FULLY_VACCINATED, 1_000_000.0)],
            ),
            raw_record(
                "Canada",
                Some("CAN"),
                "2021-06-02",
                &[(metric::PEOPLE_FULLY_VACCINATED, 3_000_000.0)],
            ),
        ];
        let store = TabularStore::from_records(&records).unwrap();
        let index = DateIndex::build(&store).unwrap();
        let chart = &IndicatorChart::presets()[0];
        let sel = Selection::default();

        let subset = query(&store, &index, &sel).unwrap();
        let subset = derive_scaled(&subset, &chart.metric, chart.divisor).unwrap();
        let subset = derive_rolling_mean(&subset, derived::SCALED_VALUE, DEFAULT_WINDOW).unwrap();
        let view = build_indicator_series(&subset, &sel, chart).unwrap();

        assert_eq!(view.title, "People fully vaccinated");
        let values: Vec<Option<f64>> =
            view.series[0].rolling_mean.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn view_models_serialize() {
        let view = SeriesView {
            metric: metric::ICU_PATIENTS_PER_MILLION.into(),
            title: "ICU patients per million".into(),
            scale: Scale::Linear,
            series: vec![LocationSeries {
                location: "Canada".into(),
                rolling_mean: vec![SeriesPoint {
                    date: "2021-01-01".into(),
                    value: None,
                }],
                points: None,
            }],
        };
        let json: serde_json::Value = serde_json::from_str(&view.to_json().unwrap()).unwrap();
        assert_eq!(json["scale"], "linear");
        assert!(json["series"][0].get("points").is_none());
        assert!(json["series"][0]["rolling_mean"][0]["value"].is_null());
    }
}

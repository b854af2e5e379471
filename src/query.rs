use std::collections::{BTreeSet, HashMap};

use polars::datatypes::TimeUnit;
use polars::prelude::*;
use tracing::debug;

use crate::date_index::DateIndex;
use crate::error::Result;
use crate::schema::record;
use crate::selection::{DateRange, Selection};
use crate::store::{self, TabularStore};

/// Rows of the store left after date-range and country filtering, plus any
/// derived columns attached since. Freshly allocated per query.
#[derive(Debug, Clone)]
pub struct ProjectedSubset {
    frame: DataFrame,
}

impl ProjectedSubset {
    pub(crate) fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    /// Row indices per location, locations in order of first appearance and
    /// rows in subset order.
    pub fn location_groups(&self) -> Result<Vec<(String, Vec<usize>)>> {
        let locations = store::location_values(&self.frame)?;
        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (row, location) in locations.iter().enumerate() {
            let slot = *slots.entry(location.as_str()).or_insert_with(|| {
                groups.push((location.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(row);
        }
        Ok(groups)
    }
}

/// Project the store down to the rows a selection asks for.
///
/// An absent date range selects the full index.
pub fn query(
    store: &TabularStore,
    index: &DateIndex,
    selection: &Selection,
) -> Result<ProjectedSubset> {
    let range = selection.resolved_range(index)?;
    filter(store, index, range, selection.countries())
}

/// Keep rows with `resolve(start) <= date <= resolve(end)` and, when
/// `countries` is non-empty, a location in `countries`. Row order of the store
/// is preserved.
pub fn filter(
    store: &TabularStore,
    index: &DateIndex,
    range: DateRange,
    countries: &BTreeSet<String>,
) -> Result<ProjectedSubset> {
    range.validate(index)?;
    let from = index.resolve(range.start)?;
    let to = index.resolve(range.end)?;

    let datetime = DataType::Datetime(TimeUnit::Microseconds, None);
    let mut predicate = col(record::DATE)
        .gt_eq(lit(store::date_to_micros(from)).cast(datetime.clone()))
        .and(col(record::DATE).lt_eq(lit(store::date_to_micros(to)).cast(datetime)));

    if !countries.is_empty() {
        let names: Vec<String> = countries.iter().cloned().collect();
        let names = Series::new(record::LOCATION.into(), &names);
        predicate = predicate.and(col(record::LOCATION).is_in(lit(names), false));
    }

    let frame = store.frame().clone().lazy().filter(predicate).collect()?;

    debug!(
        from = %from,
        to = %to,
        countries = countries.len(),
        rows = frame.height(),
        "projected subset"
    );

    Ok(ProjectedSubset::new(frame))
}

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::schema::format;
use crate::selection::DateRange;
use crate::store::TabularStore;

/// Placement rule for range-control tick labels.
///
/// Interior labels sit on the first day of every `interval_months`-th month,
/// counted from the first indexed month, and only when more than
/// `guard_start` ordinals from the start and more than `guard_end` ordinals
/// from the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickPolicy {
    pub interval_months: u32,
    pub guard_start: usize,
    pub guard_end: usize,
}

impl Default for TickPolicy {
    fn default() -> Self {
        Self {
            interval_months: 2,
            guard_start: 10,
            guard_end: 30,
        }
    }
}

/// Sparse ordinal → label map for a range control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TickLabelSet {
    labels: BTreeMap<usize, String>,
}

impl TickLabelSet {
    pub fn get(&self, ordinal: usize) -> Option<&str> {
        self.labels.get(&ordinal).map(String::as_str)
    }

    pub fn contains(&self, ordinal: usize) -> bool {
        self.labels.contains_key(&ordinal)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn ordinals(&self) -> impl Iterator<Item = usize> + '_ {
        self.labels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.labels.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Bijection between ordinals `0..N` and the distinct dates of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateIndex {
    dates: Vec<NaiveDate>,
    ticks: TickLabelSet,
}

impl DateIndex {
    /// Build the index and its tick labels with the default tick policy.
    pub fn build(store: &TabularStore) -> Result<Self> {
        Self::build_with(store, TickPolicy::default())
    }

    pub fn build_with(store: &TabularStore, policy: TickPolicy) -> Result<Self> {
        Self::from_dates(store.distinct_dates()?, policy)
    }

    /// Index an arbitrary collection of dates; duplicates collapse.
    pub fn from_dates(
        dates: impl IntoIterator<Item = NaiveDate>,
        policy: TickPolicy,
    ) -> Result<Self> {
        let dates: Vec<NaiveDate> = dates
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
            return Err(DashboardError::EmptyDataset);
        };

        let boundaries = boundary_dates(first, last, policy.interval_months);
        let last_ordinal = dates.len() - 1;

        let mut labels = BTreeMap::new();
        for (ordinal, date) in dates.iter().enumerate() {
            let edge = ordinal == 0 || ordinal == last_ordinal;
            let interior = boundaries.contains(date)
                && last_ordinal - ordinal > policy.guard_end
                && ordinal > policy.guard_start;
            if edge || interior {
                labels.insert(ordinal, date.format(format::TICK).to_string());
            }
        }

        debug!(
            dates = dates.len(),
            first = %first,
            last = %last,
            labels = labels.len(),
            "built date index"
        );

        Ok(Self {
            dates,
            ticks: TickLabelSet { labels },
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false: an index cannot be built without dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last_ordinal(&self) -> usize {
        self.dates.len() - 1
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn ticks(&self) -> &TickLabelSet {
        &self.ticks
    }

    pub fn resolve(&self, ordinal: usize) -> Result<NaiveDate> {
        self.dates
            .get(ordinal)
            .copied()
            .ok_or(DashboardError::OutOfRange {
                ordinal,
                len: self.dates.len(),
            })
    }

    /// Ordinal of an indexed date.
    pub fn ordinal_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn full_range(&self) -> DateRange {
        DateRange::new(0, self.last_ordinal())
    }

    /// Human-readable read-out of a range, e.g.
    /// `Date range: 2021-01-01 to 2021-03-31`.
    pub fn range_label(&self, range: DateRange) -> Result<String> {
        range.validate(self)?;
        Ok(format!(
            "Date range: {} to {}",
            self.resolve(range.start)?.format(format::DATE),
            self.resolve(range.end)?.format(format::DATE)
        ))
    }
}

/// First days of every `interval`-th month from `first`'s month whose month
/// end does not pass `last`.
fn boundary_dates(first: NaiveDate, last: NaiveDate, interval: u32) -> BTreeSet<NaiveDate> {
    let mut boundaries = BTreeSet::new();
    let Some(mut month) = NaiveDate::from_ymd_opt(first.year(), first.month(), 1) else {
        return boundaries;
    };
    let step = Months::new(interval.max(1));
    loop {
        let month_end = month
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt());
        match month_end {
            Some(end) if end <= last => {
                boundaries.insert(month);
            }
            _ => break,
        }
        month = match month.checked_add_months(step) {
            Some(next) => next,
            None => break,
        };
    }
    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::date;
    use chrono::Days;

    fn consecutive(start: &str, days: u64) -> Vec<NaiveDate> {
        let start = date(start);
        (0..days).map(|d| start + Days::new(d)).collect()
    }

    #[test]
    fn ordinals_resolve_in_increasing_order() {
        let mut dates = consecutive("2021-01-01", 40);
        dates.reverse();
        dates.push(date("2021-01-05")); // duplicate
        let index = DateIndex::from_dates(dates.clone(), TickPolicy::default()).unwrap();

        assert_eq!(index.len(), 40);
        let resolved: Vec<NaiveDate> =
            (0..index.len()).map(|i| index.resolve(i).unwrap()).collect();
        assert!(resolved.windows(2).all(|w| w[0] < w[1]));

        let original: BTreeSet<NaiveDate> = dates.into_iter().collect();
        let round_trip: BTreeSet<NaiveDate> = resolved.into_iter().collect();
        assert_eq!(original, round_trip);
    }

    #[test]
    fn resolve_out_of_range() {
        let index =
            DateIndex::from_dates(consecutive("2021-01-01", 3), TickPolicy::default()).unwrap();
        assert!(matches!(
            index.resolve(3),
            Err(DashboardError::OutOfRange { ordinal: 3, len: 3 })
        ));
    }

    #[test]
    fn empty_dates_fail() {
        let err =
            DateIndex::from_dates(Vec::<NaiveDate>::new(), TickPolicy::default()).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyDataset));
    }

    #[test]
    fn endpoints_always_labeled() {
        for n in [1, 2, 5, 41, 400] {
            let index = DateIndex::from_dates(consecutive("2020-02-15", n), TickPolicy::default())
                .unwrap();
            assert!(index.ticks().contains(0), "n = {n}");
            assert!(index.ticks().contains(index.last_ordinal()), "n = {n}");
        }
    }

    #[test]
    fn single_date_has_one_label() {
        let index = DateIndex::from_dates([date("2021-06-30")], TickPolicy::default()).unwrap();
        assert_eq!(index.ticks().len(), 1);
        assert_eq!(index.ticks().get(0), Some("21/06"));
    }

    #[test]
    fn interior_labels_follow_two_month_boundaries() {
        // 2020-01-01 .. 2020-12-31
        let index =
            DateIndex::from_dates(consecutive("2020-01-01", 366), TickPolicy::default()).unwrap();
        let labeled: Vec<String> = index
            .ticks()
            .ordinals()
            .map(|k| index.resolve(k).unwrap().to_string())
            .collect();

        // 2020-11-01 sits 60 ordinals before the end.
        assert_eq!(
            labeled,
            [
                "2020-01-01",
                "2020-03-01",
                "2020-05-01",
                "2020-07-01",
                "2020-09-01",
                "2020-11-01",
                "2020-12-31",
            ]
        );
        assert_eq!(index.ticks().get(0), Some("20/01"));
    }

    #[test]
    fn interior_labels_respect_start_guard() {
        // 2020-03-01 is on the Jan/Mar/May cycle but only one ordinal in.
        let mut dates = vec![date("2020-01-01")];
        dates.extend(consecutive("2020-03-01", 200));
        let index = DateIndex::from_dates(dates, TickPolicy::default()).unwrap();

        let march = index.ordinal_of(date("2020-03-01")).unwrap();
        assert_eq!(march, 1);
        assert!(!index.ticks().contains(march));

        let may = index.ordinal_of(date("2020-05-01")).unwrap();
        assert!(index.ticks().contains(may));
        let april = index.ordinal_of(date("2020-04-01")).unwrap();
        assert!(!index.ticks().contains(april));
    }

    #[test]
    fn labels_near_the_end_are_suppressed() {
        let dates = consecutive("2020-01-01", 152); // ends 2020-05-31
        let may_first = date("2020-05-01");
        assert!(boundary_dates(dates[0], dates[151], 2).contains(&may_first));

        let index = DateIndex::from_dates(dates, TickPolicy::default()).unwrap();
        let may = index.ordinal_of(may_first).unwrap();
        assert_eq!(index.last_ordinal() - may, 30);
        assert!(!index.ticks().contains(may));
    }

    /// `lead` January days, then 200 days from 2020-03-01 (a boundary).
    fn march_first_after(lead: u64) -> DateIndex {
        let mut dates = consecutive("2020-01-01", lead);
        dates.extend(consecutive("2020-03-01", 200));
        DateIndex::from_dates(dates, TickPolicy::default()).unwrap()
    }

    #[test]
    fn start_guard_fencepost() {
        let index = march_first_after(10);
        let march = index.ordinal_of(date("2020-03-01")).unwrap();
        assert_eq!(march, 10);
        assert!(!index.ticks().contains(march));

        let index = march_first_after(11);
        let march = index.ordinal_of(date("2020-03-01")).unwrap();
        assert_eq!(march, 11);
        assert_eq!(index.ticks().get(march), Some("20/03"));
    }

    #[test]
    fn end_guard_fencepost() {
        let may_first = date("2020-05-01");

        // ends 2020-05-31: 30 ordinals after May 1
        let index =
            DateIndex::from_dates(consecutive("2020-01-01", 152), TickPolicy::default()).unwrap();
        let may = index.ordinal_of(may_first).unwrap();
        assert_eq!(index.last_ordinal() - may, 30);
        assert!(!index.ticks().contains(may));

        // ends 2020-06-01: 31 ordinals after May 1
        let index =
            DateIndex::from_dates(consecutive("2020-01-01", 153), TickPolicy::default()).unwrap();
        let may = index.ordinal_of(may_first).unwrap();
        assert_eq!(index.last_ordinal() - may, 31);
        assert_eq!(index.ticks().get(may), Some("20/05"));
    }

    #[test]
    fn boundaries_stop_at_last_complete_month() {
        let boundaries = boundary_dates(date("2020-01-15"), date("2020-05-30"), 2);
        let got: Vec<String> = boundaries.iter().map(|d| d.to_string()).collect();
        // May ends after the last date, so it is not a boundary.
        assert_eq!(got, ["2020-01-01", "2020-03-01"]);
    }

    #[test]
    fn range_label_formats_both_ends() {
        let index =
            DateIndex::from_dates(consecutive("2021-01-01", 10), TickPolicy::default()).unwrap();
        assert_eq!(
            index.range_label(DateRange::new(2, 9)).unwrap(),
            "Date range: 2021-01-03 to 2021-01-10"
        );
        assert!(index.range_label(DateRange::new(5, 2)).is_err());
    }

    #[test]
    fn sparse_dates_keep_ordinals_compact() {
        let index = DateIndex::from_dates(
            [date("2021-01-01"), date("2021-01-10"), date("2021-02-01")],
            TickPolicy::default(),
        )
        .unwrap();
        assert_eq!(index.ordinal_of(date("2021-01-10")), Some(1));
        assert_eq!(index.ordinal_of(date("2021-01-11")), None);
        assert_eq!(index.full_range(), DateRange::new(0, 2));
    }
}

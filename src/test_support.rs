use chrono::{Days, NaiveDate};

use crate::schema::format;
use crate::store::RawRecord;

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, format::DATE).unwrap()
}

pub(crate) fn raw_record(
    location: &str,
    iso_code: Option<&str>,
    day: &str,
    metrics: &[(&str, f64)],
) -> RawRecord {
    RawRecord {
        location: Some(location.to_string()),
        iso_code: iso_code.map(str::to_string),
        date: Some(day.to_string()),
        metrics: metrics
            .iter()
            .map(|(name, value)| (name.to_string(), Some(*value)))
            .collect(),
    }
}

/// `days` consecutive records for one location with a constant metric value.
pub(crate) fn daily_records(
    location: &str,
    iso_code: Option<&str>,
    start: &str,
    days: u64,
    metric: &str,
    value: f64,
) -> Vec<RawRecord> {
    let start = date(start);
    (0..days)
        .map(|offset| {
            let day = start + Days::new(offset);
            raw_record(location, iso_code, &day.to_string(), &[(metric, value)])
        })
        .collect()
}

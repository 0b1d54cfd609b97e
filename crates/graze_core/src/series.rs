//! As-of lookups over ascending, per-paddock observation sequences.
//!
//! Semantics are "last known value": a step function with no
//! interpolation. Sequences must already be sorted ascending by date.

use chrono::NaiveDate;

use crate::Dated;

/// Value of `field` from the latest entry dated at or before `date` whose
/// value is present and finite. `None` for an empty series or no match.
pub fn last_on_or_before<T, F>(series: &[T], date: NaiveDate, field: F) -> Option<f64>
where
    T: Dated,
    F: Fn(&T) -> Option<f64>,
{
    last_entry_on_or_before(series, date, field).map(|(_, value)| value)
}

/// Like [`last_on_or_before`], also returning the date of the entry used.
pub fn last_entry_on_or_before<T, F>(
    series: &[T],
    date: NaiveDate,
    field: F,
) -> Option<(NaiveDate, f64)>
where
    T: Dated,
    F: Fn(&T) -> Option<f64>,
{
    let end = series.partition_point(|entry| entry.date() <= date);
    series[..end].iter().rev().find_map(|entry| {
        field(entry)
            .filter(|value| value.is_finite())
            .map(|value| (entry.date(), value))
    })
}

/// Sorts by date (stable) and collapses same-date entries, keeping the
/// one supplied last.
pub(crate) fn sort_dedup_by_date<T: Dated>(entries: &mut Vec<T>) {
    entries.sort_by_key(Dated::date);
    let mut kept: Vec<T> = Vec::with_capacity(entries.len());
    for entry in entries.drain(..) {
        match kept.last_mut() {
            Some(last) if last.date() == entry.date() => *last = entry,
            _ => kept.push(entry),
        }
    }
    *entries = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{date, obs};
    use crate::BiomassObservation;

    #[test]
    fn empty_series_returns_none() {
        let series: Vec<BiomassObservation> = vec![];
        assert_eq!(
            last_on_or_before(&series, date("2025-01-10"), BiomassObservation::smoothed_or_raw),
            None
        );
    }

    #[test]
    fn returns_last_value_at_or_before_date() {
        let series = vec![
            obs("2025-01-01", Some(2000.0), Some(2100.0)),
            obs("2025-01-05", Some(2200.0), Some(2300.0)),
            obs("2025-01-09", Some(2400.0), Some(2500.0)),
        ];
        let found = last_entry_on_or_before(&series, date("2025-01-07"), |o| o.smoothed);
        assert_eq!(found, Some((date("2025-01-05"), 2300.0)));
        let exact = last_on_or_before(&series, date("2025-01-09"), |o| o.raw);
        assert_eq!(exact, Some(2400.0));
    }

    #[test]
    fn query_before_first_entry_returns_none() {
        let series = vec![obs("2025-01-05", Some(2200.0), None)];
        assert_eq!(
            last_on_or_before(&series, date("2025-01-04"), |o| o.raw),
            None
        );
    }

    #[test]
    fn skips_missing_and_non_finite_values() {
        let series = vec![
            obs("2025-01-01", Some(1800.0), None),
            obs("2025-01-02", None, None),
            obs("2025-01-03", Some(f64::NAN), None),
        ];
        let found = last_entry_on_or_before(&series, date("2025-01-03"), |o| o.raw);
        assert_eq!(found, Some((date("2025-01-01"), 1800.0)));
    }

    #[test]
    fn dedup_keeps_last_supplied_entry_per_date() {
        let mut series = vec![
            obs("2025-01-03", Some(3.0), None),
            obs("2025-01-01", Some(1.0), None),
            obs("2025-01-03", Some(33.0), None),
        ];
        sort_dedup_by_date(&mut series);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, date("2025-01-01"));
        assert_eq!(series[1].raw, Some(33.0));
    }
}

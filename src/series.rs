use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use crate::model::DailySample;

/// Number of days of per-day traffic the GitHub API serves.
pub const WINDOW_DAYS: u32 = 15;

/// The report window ending at `today`, newest date first. This ordering
/// is both the table column order and the per-day sort-key order.
pub fn date_window(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days as i64).map(|n| today - Duration::days(n)).collect()
}

/// Expand raw samples onto `dates`, in that order, substituting a zero
/// sample for any date the input does not cover. Output length always
/// equals `dates.len()`. Duplicate input dates are last-write-wins.
pub fn normalize(samples: &[DailySample], dates: &[NaiveDate]) -> Vec<DailySample> {
    let by_date: HashMap<NaiveDate, &DailySample> =
        samples.iter().map(|s| (s.date, s)).collect();

    dates
        .iter()
        .map(|date| match by_date.get(date) {
            Some(s) => **s,
            None => DailySample::zero(*date),
        })
        .collect()
}

use std::cmp::Ordering;

use crate::model::{PathStat, ReferrerStat, SummaryRow};

/// Order summary rows by their per-day (clones count, views count)
/// pairs, compared lexicographically in column order (the all-time cell
/// does not participate), then drop rows whose all-time counts are zero
/// for both metrics. `descending` reverses the comparator, not the
/// sorted list, so equal keys keep their incoming order either way.
pub fn sort_summary(mut rows: Vec<SummaryRow>, descending: bool) -> Vec<SummaryRow> {
    rows.sort_by(|a, b| directed(day_keys(a).cmp(day_keys(b)), descending));
    rows.retain(|r| !r.all_time.is_empty());
    rows
}

fn day_keys(row: &SummaryRow) -> impl Iterator<Item = (u64, u64)> + '_ {
    row.days.iter().map(|c| (c.clones.count, c.views.count))
}

fn directed(ord: Ordering, descending: bool) -> Ordering {
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

/// Flat referrer/path records sort by (uniques, count, repository
/// name). No filtering: the API never serves zero-count top entries.
pub trait FlatRecord {
    fn uniques(&self) -> u64;
    fn count(&self) -> u64;
    fn repo(&self) -> &str;
}

impl FlatRecord for ReferrerStat {
    fn uniques(&self) -> u64 {
        self.uniques
    }
    fn count(&self) -> u64 {
        self.count
    }
    fn repo(&self) -> &str {
        &self.repo
    }
}

impl FlatRecord for PathStat {
    fn uniques(&self) -> u64 {
        self.uniques
    }
    fn count(&self) -> u64 {
        self.count
    }
    fn repo(&self) -> &str {
        &self.repo
    }
}

pub fn sort_flat<T: FlatRecord>(mut records: Vec<T>, descending: bool) -> Vec<T> {
    records.sort_by(|a, b| {
        let key = (a.uniques(), a.count(), a.repo()).cmp(&(b.uniques(), b.count(), b.repo()));
        directed(key, descending)
    });
    records
}

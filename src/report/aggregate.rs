use std::collections::HashMap;

use crate::error::{Result, TrafficError};
use crate::model::{DayCell, MetricCell, RepoTraffic, SummaryRow};

/// Merge per-repository views and clones reports into one row per
/// repository: a leading all-time cell, then one cell per date.
///
/// Both report sets must cover the same repositories over the same date
/// sequence; the caller guarantees this by requesting (or zero-filling)
/// both metrics against one window. A mismatch is a contract violation,
/// not a recoverable condition.
pub fn aggregate(views: &[RepoTraffic], clones: &[RepoTraffic]) -> Result<Vec<SummaryRow>> {
    if views.len() != clones.len() {
        return Err(TrafficError::Contract(format!(
            "views cover {} repositories, clones cover {}",
            views.len(),
            clones.len()
        )));
    }

    let clones_by_name: HashMap<&str, &RepoTraffic> =
        clones.iter().map(|r| (r.name.as_str(), r)).collect();

    views
        .iter()
        .map(|v| {
            let c = clones_by_name.get(v.name.as_str()).ok_or_else(|| {
                TrafficError::Contract(format!("no clones report for repository {}", v.name))
            })?;
            build_row(v, c)
        })
        .collect()
}

fn build_row(views: &RepoTraffic, clones: &RepoTraffic) -> Result<SummaryRow> {
    if views.breakdown.len() != clones.breakdown.len() {
        return Err(TrafficError::Contract(format!(
            "breakdown lengths differ for repository {}: {} views days vs {} clones days",
            views.name,
            views.breakdown.len(),
            clones.breakdown.len()
        )));
    }

    let days = views
        .breakdown
        .iter()
        .zip(&clones.breakdown)
        .map(|(v, c)| {
            if v.date != c.date {
                return Err(TrafficError::Contract(format!(
                    "date sequences diverge for repository {}: {} vs {}",
                    views.name, v.date, c.date
                )));
            }
            Ok(DayCell {
                views: MetricCell { uniques: v.uniques, count: v.count },
                clones: MetricCell { uniques: c.uniques, count: c.count },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SummaryRow {
        name: views.name.clone(),
        all_time: DayCell {
            views: MetricCell { uniques: views.uniques, count: views.count },
            clones: MetricCell { uniques: clones.uniques, count: clones.count },
        },
        days,
    })
}

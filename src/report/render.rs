use chrono::NaiveDate;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

use crate::error::Result;
use crate::model::{DayCell, PathStat, ReferrerStat, SummaryOutput, SummaryRow};

/// Render the summary grid. The date axis is truncated to the first
/// `visible_days` columns of the window; rows are printed as sorted.
/// A cell with zero counts for both metrics renders blank even though
/// its row survived the all-zero filter.
pub fn summary_table(
    rows: &[SummaryRow],
    dates: &[NaiveDate],
    visible_days: usize,
    show_views: bool,
    show_clones: bool,
) -> String {
    let visible = visible_days.min(dates.len());

    let mut labels = vec!["Name".to_string(), "All".to_string()];
    labels.extend(dates[..visible].iter().map(|d| d.format("%m/%d\n%a").to_string()));

    let mut builder = Builder::default();
    builder.push_record(labels.clone());
    for row in rows {
        let mut cells = vec![row.name.clone(), format_cell(&row.all_time, show_views, show_clones)];
        cells.extend(
            row.days[..visible]
                .iter()
                .map(|c| format_cell(c, show_views, show_clones)),
        );
        builder.push_record(cells);
    }
    builder.push_record(labels);

    let mut table = builder.build();
    table.with(Style::ascii());
    table.with(Modify::new(Columns::new(1..)).with(Alignment::center()));
    table.to_string()
}

fn format_cell(cell: &DayCell, show_views: bool, show_clones: bool) -> String {
    if cell.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(2);
    if show_views {
        lines.push(format!("{}/{}", cell.views.uniques, cell.views.count));
    }
    if show_clones {
        lines.push(format!("{}/{}", cell.clones.uniques, cell.clones.count));
    }
    lines.join("\n")
}

/// Pretty JSON with sorted keys; the full window and raw zero values
/// are preserved, no truncation and no blank-cell substitution.
pub fn summary_json(doc: &SummaryOutput) -> Result<String> {
    sorted_json(doc)
}

pub fn referrers_table(records: &[ReferrerStat]) -> String {
    flat_table(
        ["Repo", "Referrer", "Uniques", "Count"],
        records.iter().map(|r| {
            [
                r.repo.clone(),
                r.referrer.clone(),
                r.uniques.to_string(),
                r.count.to_string(),
            ]
        }),
    )
}

pub fn paths_table(records: &[PathStat]) -> String {
    flat_table(
        ["Repo", "Path", "Uniques", "Count"],
        records.iter().map(|r| {
            [
                r.repo.clone(),
                r.path.clone(),
                r.uniques.to_string(),
                r.count.to_string(),
            ]
        }),
    )
}

pub fn flat_json<T: Serialize>(records: &[T]) -> Result<String> {
    sorted_json(&records)
}

fn flat_table<const N: usize>(
    labels: [&str; N],
    rows: impl Iterator<Item = [String; N]>,
) -> String {
    let mut builder = Builder::default();
    builder.push_record(labels);
    for row in rows {
        builder.push_record(row);
    }
    builder.push_record(labels);

    let mut table = builder.build();
    table.with(Style::ascii());
    table.with(Modify::new(Columns::new(2..)).with(Alignment::right()));
    table.to_string()
}

// serde_json's default Map is BTreeMap-backed, so round-tripping
// through Value yields deterministically sorted keys.
fn sorted_json<T: Serialize>(doc: &T) -> Result<String> {
    let value = serde_json::to_value(doc)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailySample, MetricCell, RepoTraffic};
    use crate::series;
    use pretty_assertions::assert_eq;

    fn dates() -> Vec<NaiveDate> {
        series::date_window(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), 3)
    }

    fn traffic(name: &str, counts: &[u64]) -> RepoTraffic {
        RepoTraffic {
            breakdown: dates()
                .iter()
                .zip(counts)
                .map(|(d, &count)| DailySample { date: *d, uniques: count.min(2), count })
                .collect(),
            count: counts.iter().sum(),
            name: name.to_string(),
            uniques: 2,
        }
    }

    fn cell(views: u64, clones: u64) -> DayCell {
        DayCell {
            views: MetricCell { uniques: 1, count: views },
            clones: MetricCell { uniques: 1, count: clones },
        }
    }

    #[test]
    fn grid_truncates_to_visible_days() {
        let rows = vec![SummaryRow {
            name: "repo".into(),
            all_time: cell(4, 0),
            days: vec![cell(4, 0), cell(0, 0), cell(0, 0)],
        }];
        let table = summary_table(&rows, &dates(), 1, true, true);
        assert!(table.contains("03/15"));
        assert!(!table.contains("03/14"));
    }

    #[test]
    fn zero_cells_render_blank_but_rows_remain() {
        let rows = vec![SummaryRow {
            name: "repo".into(),
            all_time: cell(4, 0),
            days: vec![cell(4, 0), cell(0, 0), cell(0, 0)],
        }];
        let table = summary_table(&rows, &dates(), 3, true, true);
        assert!(table.contains("repo"));
        assert!(table.contains("1/4"));
        // One populated day cell, plus the all-time cell.
        assert_eq!(table.matches("1/4").count(), 2);
    }

    #[test]
    fn disabled_metric_lines_are_omitted() {
        let populated = cell(4, 7);
        assert_eq!(format_cell(&populated, true, false), "1/4");
        assert_eq!(format_cell(&populated, false, true), "1/7");
        assert_eq!(format_cell(&populated, true, true), "1/4\n1/7");
    }

    #[test]
    fn summary_json_round_trips_every_triple() {
        let doc = SummaryOutput {
            clones: Some(vec![traffic("a", &[0, 0, 0])]),
            views: Some(vec![traffic("a", &[3, 0, 5])]),
        };
        let text = summary_json(&doc).unwrap();
        let parsed: SummaryOutput = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.views, doc.views);
        assert_eq!(parsed.clones, doc.clones);
    }

    #[test]
    fn summary_json_keys_are_sorted_and_dates_iso() {
        let doc = SummaryOutput {
            clones: None,
            views: Some(vec![traffic("a", &[3])]),
        };
        let text = summary_json(&doc).unwrap();
        let clones_at = text.find("\"clones\"").unwrap();
        let views_at = text.find("\"views\"").unwrap();
        assert!(clones_at < views_at);
        assert!(text.contains("\"2024-03-15\""));
        assert!(text.contains("\"clones\": null"));
    }

    #[test]
    fn flat_tables_bookend_with_label_rows() {
        let table = referrers_table(&[ReferrerStat {
            count: 3,
            referrer: "news.ycombinator.com".into(),
            repo: "repo".into(),
            uniques: 2,
        }]);
        assert_eq!(table.matches("Referrer").count(), 2);
        assert!(table.contains("news.ycombinator.com"));
    }
}

use std::collections::HashMap;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use console::style;

use crate::cli::{CommonArgs, Metric, OutputFormat};
use crate::error::{Result, TrafficError};
use crate::fetch;
use crate::github::TrafficClient;
use crate::model::{RepoTraffic, Repository, SummaryOutput};
use crate::report;
use crate::series;

pub async fn exec(
    client: &TrafficClient,
    repos: &[Repository],
    common: &CommonArgs,
    metrics: &[Metric],
    days: u32,
) -> anyhow::Result<()> {
    let show_views = metrics.contains(&Metric::Views);
    let show_clones = metrics.contains(&Metric::Clones);

    let today = Utc::now().date_naive();
    let dates = series::date_window(today, series::WINDOW_DAYS);

    // An unrequested metric still gets zero-filled reports over the
    // same window so aggregation and sorting stay metric-agnostic.
    let views = if show_views {
        fetch_metric(client, repos, common.workers(), "Fetching views stats", Metric::Views, &dates)
            .await
            .context("Failed to fetch views traffic")?
    } else {
        zero_reports(repos, &dates)
    };

    let clones = if show_clones {
        fetch_metric(client, repos, common.workers(), "Fetching clones stats", Metric::Clones, &dates)
            .await
            .context("Failed to fetch clones traffic")?
    } else {
        zero_reports(repos, &dates)
    };

    match common.output_format {
        OutputFormat::Json => {
            let doc = SummaryOutput {
                clones: show_clones.then_some(clones),
                views: show_views.then_some(views),
            };
            println!("{}", report::summary_json(&doc)?);
        }
        OutputFormat::Table => {
            let rows = report::aggregate(&views, &clones)
                .context("Failed to aggregate traffic reports")?;
            let rows = report::sort_summary(rows, common.order.is_descending());
            println!("{}", style("Summary").bold());
            println!(
                "{}",
                report::summary_table(&rows, &dates, days as usize, show_views, show_clones)
            );
        }
    }

    Ok(())
}

/// Fetch one metric for every repository through the worker pool, then
/// densify each breakdown onto the window and restore the resolver's
/// repository order (the pool yields in completion order).
async fn fetch_metric(
    client: &TrafficClient,
    repos: &[Repository],
    workers: usize,
    label: &str,
    metric: Metric,
    dates: &[NaiveDate],
) -> Result<Vec<RepoTraffic>> {
    let api = client.clone();
    let fetched = fetch::fetch_all(repos, workers, label, move |repo: Repository| {
        let api = api.clone();
        async move {
            match metric {
                Metric::Views => api.views_traffic(&repo).await,
                Metric::Clones => api.clones_traffic(&repo).await,
            }
        }
    })
    .await?;

    let mut by_name: HashMap<String, RepoTraffic> = fetched
        .into_iter()
        .map(|(repo, totals)| {
            let report = RepoTraffic {
                breakdown: series::normalize(&totals.samples, dates),
                count: totals.count,
                name: repo.name.clone(),
                uniques: totals.uniques,
            };
            (repo.name, report)
        })
        .collect();

    repos
        .iter()
        .map(|r| {
            by_name.remove(&r.name).ok_or_else(|| {
                TrafficError::Contract(format!("missing fetch result for repository {}", r.name))
            })
        })
        .collect()
}

fn zero_reports(repos: &[Repository], dates: &[NaiveDate]) -> Vec<RepoTraffic> {
    repos
        .iter()
        .map(|r| RepoTraffic::zero(r.name.clone(), dates))
        .collect()
}

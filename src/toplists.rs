use std::collections::HashMap;

use anyhow::Context;
use console::style;

use crate::cli::{CommonArgs, OutputFormat};
use crate::fetch;
use crate::github::TrafficClient;
use crate::model::{PathStat, ReferrerStat, Repository};
use crate::report;

pub async fn referrers(
    client: &TrafficClient,
    repos: &[Repository],
    common: &CommonArgs,
) -> anyhow::Result<()> {
    let api = client.clone();
    let fetched = fetch::fetch_all(
        repos,
        common.workers(),
        "Fetching referrers stats",
        move |repo: Repository| {
            let api = api.clone();
            async move { api.top_referrers(&repo).await }
        },
    )
    .await
    .context("Failed to fetch referrer stats")?;

    let records: Vec<ReferrerStat> = in_repo_order(repos, fetched)
        .flat_map(|(repo, list)| {
            list.into_iter().map(move |r| ReferrerStat {
                count: r.count,
                referrer: r.referrer,
                repo: repo.clone(),
                uniques: r.uniques,
            })
        })
        .collect();
    let records = report::sort_flat(records, common.order.is_descending());

    match common.output_format {
        OutputFormat::Json => println!("{}", report::flat_json(&records)?),
        OutputFormat::Table => {
            println!("{}", style("Referrers").bold());
            println!("{}", report::referrers_table(&records));
        }
    }

    Ok(())
}

pub async fn paths(
    client: &TrafficClient,
    repos: &[Repository],
    common: &CommonArgs,
) -> anyhow::Result<()> {
    let api = client.clone();
    let fetched = fetch::fetch_all(
        repos,
        common.workers(),
        "Fetching paths stats",
        move |repo: Repository| {
            let api = api.clone();
            async move { api.top_paths(&repo).await }
        },
    )
    .await
    .context("Failed to fetch path stats")?;

    let records: Vec<PathStat> = in_repo_order(repos, fetched)
        .flat_map(|(repo, list)| {
            list.into_iter().map(move |p| PathStat {
                count: p.count,
                path: p.path,
                repo: repo.clone(),
                title: p.title,
                uniques: p.uniques,
            })
        })
        .collect();
    let records = report::sort_flat(records, common.order.is_descending());

    match common.output_format {
        OutputFormat::Json => println!("{}", report::flat_json(&records)?),
        OutputFormat::Table => {
            println!("{}", style("Paths").bold());
            println!("{}", report::paths_table(&records));
        }
    }

    Ok(())
}

/// Restore resolver order over completion-ordered fetch results so tied
/// sort keys come out deterministically.
fn in_repo_order<'a, T: 'a>(
    repos: &'a [Repository],
    fetched: Vec<(Repository, T)>,
) -> impl Iterator<Item = (String, T)> + 'a {
    let mut by_name: HashMap<String, T> = fetched
        .into_iter()
        .map(|(repo, payload)| (repo.name, payload))
        .collect();
    repos
        .iter()
        .filter_map(move |r| by_name.remove(&r.name).map(|payload| (r.name.clone(), payload)))
}

use std::future::Future;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use crate::error::{Result, TrafficError};
use crate::model::Repository;

/// Run `fetch` for every repository with at most `workers` calls in
/// flight, yielding results in completion order. One task per
/// repository; each task holds a pool permit only while its call (and
/// possible retry) runs. Progress ticks once per completed repository.
///
/// Any error that `with_rate_limit_retry` does not recover aborts the
/// whole batch: remaining tasks are cancelled and completed results are
/// discarded.
pub async fn fetch_all<T, F, Fut>(
    repos: &[Repository],
    workers: usize,
    label: &str,
    fetch: F,
) -> Result<Vec<(Repository, T)>>
where
    T: Send + 'static,
    F: Fn(Repository) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let progress = progress_bar(repos.len() as u64, label);
    let pool = Arc::new(Semaphore::new(workers));
    let fetch = Arc::new(fetch);
    let mut tasks: JoinSet<Result<(Repository, T)>> = JoinSet::new();

    for repo in repos.iter().cloned() {
        let pool = Arc::clone(&pool);
        let fetch = Arc::clone(&fetch);
        tasks.spawn(async move {
            let _permit = pool
                .acquire_owned()
                .await
                .map_err(|e| TrafficError::Worker(e.to_string()))?;
            let payload = with_rate_limit_retry(|| fetch(repo.clone())).await?;
            Ok((repo, payload))
        });
    }

    let mut completed = Vec::with_capacity(repos.len());
    while let Some(joined) = tasks.join_next().await {
        let (repo, payload) = joined.map_err(|e| TrafficError::Worker(e.to_string()))??;
        progress.inc(1);
        completed.push((repo, payload));
    }

    progress.finish_and_clear();
    Ok(completed)
}

/// Run `call`; on a rate-limit failure with a positive advised wait,
/// sleep that long and retry exactly once. A second failure, or a
/// rate-limit signal without advice, propagates as-is.
pub async fn with_rate_limit_retry<T, F, Fut>(mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match call().await {
        Err(TrafficError::RateLimited { retry_after: Some(wait) }) if !wait.is_zero() => {
            warn!(
                wait_secs = wait.as_secs(),
                "rate limited, retrying once after advised wait"
            );
            tokio::time::sleep(wait).await;
            call().await
        }
        other => other,
    }
}

fn progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message(label.to_string());
    pb
}

//! Batch orchestration: open storage, fan out fetches, store sorted results.
//!
//! Per-target failures never abort the batch. Each target ends up with an
//! [`ItemOutcome`] in the returned [`RunSummary`], in ascending id order.

use futures::stream::{self, StreamExt};
use pagespeed_client::{ClientError, PageSpeedClient};
use pagespeed_core::{AppConfig, PageSpeedResult, Strategy, Target};
use sqlx::SqlitePool;

/// What happened to one target.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutcomeStatus {
    /// A row was written with this performance score.
    Saved { performance: f64 },
    /// No performance score came back; nothing was written.
    Skipped,
    /// The fetch or the insert raised an error.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ItemOutcome {
    pub target_id: i64,
    pub url: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
    pub table_name: String,
    pub outcomes: Vec<ItemOutcome>,
}

impl RunSummary {
    pub fn saved(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Saved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, OutcomeStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Run one batch end to end against the configured API and database.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built, the database cannot
/// be opened, or the run table cannot be created. Per-target errors are
/// recorded in the summary instead.
pub(crate) async fn run_batch(
    config: &AppConfig,
    targets: &[Target],
) -> anyhow::Result<RunSummary> {
    // Built before storage so a bad API url leaves no empty run table behind.
    let client = PageSpeedClient::from_config(config)?;

    tracing::info!(path = %config.database_path.display(), "initializing database");
    let started_at = chrono::Local::now().naive_local();
    let storage = pagespeed_db::initialize_run_storage(&config.database_path, started_at).await?;

    let fetched = fetch_all(
        &client,
        targets,
        config.strategy,
        config.max_concurrent_requests,
    )
    .await;
    let outcomes = store_results(&storage.pool, &storage.table_name, fetched).await;

    pagespeed_db::close(&storage.pool).await;
    tracing::info!(
        table = %storage.table_name,
        "all targets processed and database connection closed"
    );

    Ok(RunSummary {
        table_name: storage.table_name,
        outcomes,
    })
}

/// Fetch every target concurrently and return the results sorted by id.
///
/// `max_concurrent = None` puts every target in flight at once.
pub(crate) async fn fetch_all<'a>(
    client: &PageSpeedClient,
    targets: &'a [Target],
    strategy: Strategy,
    max_concurrent: Option<usize>,
) -> Vec<(&'a Target, Result<PageSpeedResult, ClientError>)> {
    let limit = max_concurrent.unwrap_or(targets.len()).max(1);

    let mut results: Vec<(&Target, Result<PageSpeedResult, ClientError>)> = stream::iter(targets)
        .map(|t| async move { (t, client.fetch(t, strategy).await) })
        .buffer_unordered(limit)
        .collect()
        .await;

    results.sort_by_key(|(t, _)| t.id);
    results
}

/// Write each scored result in the given order, one auto-committed insert
/// per row, and record an outcome for every entry.
pub(crate) async fn store_results(
    pool: &SqlitePool,
    table: &str,
    fetched: Vec<(&Target, Result<PageSpeedResult, ClientError>)>,
) -> Vec<ItemOutcome> {
    let mut outcomes = Vec::with_capacity(fetched.len());

    for (target, fetched) in fetched {
        let status = match fetched {
            Ok(result) => store_one(pool, table, &result).await,
            Err(e) => {
                tracing::error!(
                    target_id = target.id,
                    url = %target.url,
                    error = %e,
                    "error fetching target"
                );
                OutcomeStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        outcomes.push(ItemOutcome {
            target_id: target.id,
            url: target.url.clone(),
            status,
        });
    }

    outcomes
}

async fn store_one(pool: &SqlitePool, table: &str, result: &PageSpeedResult) -> OutcomeStatus {
    let Some(performance) = result.performance else {
        tracing::info!(
            target_id = result.target_id,
            url = %result.url,
            "no performance data; skipping"
        );
        return OutcomeStatus::Skipped;
    };

    match pagespeed_db::insert_result(pool, table, result).await {
        Ok(()) => {
            tracing::info!(
                target_id = result.target_id,
                url = %result.url,
                performance,
                "saved result"
            );
            OutcomeStatus::Saved { performance }
        }
        Err(e) => {
            tracing::error!(
                target_id = result.target_id,
                error = %e,
                "error processing result"
            );
            OutcomeStatus::Failed {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;

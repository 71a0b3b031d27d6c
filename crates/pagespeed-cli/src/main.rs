mod run;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use clap::Parser;
use pagespeed_core::{ConfigError, Target};
use tracing_subscriber::EnvFilter;

/// Batch-audit a fixed URL list with `PageSpeed` Insights and store the scores
/// in a fresh `SQLite` table.
#[derive(Debug, Parser)]
#[command(name = "pagespeed-cli")]
#[command(about = "Batch PageSpeed Insights audits into SQLite")]
struct Cli {
    /// YAML file with `targets: [{id, url}]`; the built-in list is used when unset
    #[arg(long, env = "PAGESPEED_TARGETS_PATH")]
    targets: Option<PathBuf>,

    /// Cap on in-flight API requests; overrides `PAGESPEED_MAX_CONCURRENT_REQUESTS`
    #[arg(long)]
    max_concurrent: Option<NonZeroUsize>,

    /// List the targets that would be audited and exit without calling the
    /// API or touching the database. No API key is needed.
    #[arg(long)]
    dry_run: bool,
}

/// Targets from the YAML file at `path`, or the built-in list.
fn resolve_targets(path: Option<&Path>) -> Result<Vec<Target>, ConfigError> {
    match path {
        Some(path) => pagespeed_core::load_targets(path),
        None => Ok(pagespeed_core::default_targets()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before parsing so the `env` fallbacks on `Cli` see `.env` values.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let targets = resolve_targets(cli.targets.as_deref())?;

    if cli.dry_run {
        println!("dry-run: would audit {} targets", targets.len());
        for t in &targets {
            println!("  {:>4}  {}", t.id, t.url);
        }
        return Ok(());
    }

    let mut config = pagespeed_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    config.targets_path = cli.targets;
    if let Some(n) = cli.max_concurrent {
        config.max_concurrent_requests = Some(n.get());
    }

    tracing::info!(
        targets = targets.len(),
        strategy = %config.strategy,
        "starting PageSpeed batch"
    );
    let summary = run::run_batch(&config, &targets).await?;

    println!(
        "run complete: table={} saved={} skipped={} failed={}",
        summary.table_name,
        summary.saved(),
        summary.skipped(),
        summary.failed()
    );
    for outcome in &summary.outcomes {
        match &outcome.status {
            run::OutcomeStatus::Saved { performance } => {
                println!("  {:>4}  saved    {performance:.2}  {}", outcome.target_id, outcome.url);
            }
            run::OutcomeStatus::Skipped => {
                println!("  {:>4}  skipped        {}", outcome.target_id, outcome.url);
            }
            run::OutcomeStatus::Failed { reason } => {
                println!(
                    "  {:>4}  failed         {}: {reason}",
                    outcome.target_id, outcome.url
                );
            }
        }
    }

    Ok(())
}

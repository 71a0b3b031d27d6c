use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub mod results;

pub use results::{create_run_table, insert_result, list_results, run_table_name, ResultRow};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("invalid table name '{0}': only ASCII letters, digits and '_' are allowed")]
    InvalidTableName(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// A live database handle plus the relation created for the current run.
#[derive(Debug, Clone)]
pub struct RunStorage {
    pub pool: SqlitePool,
    pub table_name: String,
}

/// Open (creating if absent) the `SQLite` database file at `path`.
///
/// The pool holds a single connection: all writes happen on one flow after
/// the fetches join, so there is never more than one writer.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the file cannot be opened or created.
pub async fn open_database(path: &Path) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    connect_with(options).await
}

/// Open a private in-memory database. Contents vanish when the pool closes.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the connection cannot be established.
pub async fn open_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    connect_with(options).await
}

async fn connect_with(options: SqliteConnectOptions) -> Result<SqlitePool, DbError> {
    // One long-lived connection; an in-memory database is per connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Open the database at `path` and create this run's result table, named
/// from `started_at`.
///
/// # Errors
///
/// Returns [`DbError`] if the database cannot be opened or the DDL fails.
pub async fn initialize_run_storage(
    path: &Path,
    started_at: NaiveDateTime,
) -> Result<RunStorage, DbError> {
    let pool = open_database(path).await?;
    let table_name = run_table_name(started_at);
    create_run_table(&pool, &table_name).await?;
    tracing::info!(path = %path.display(), table = %table_name, "created run table");
    Ok(RunStorage { pool, table_name })
}

/// Close the pool, waiting for the connection to be released.
pub async fn close(pool: &SqlitePool) {
    pool.close().await;
}

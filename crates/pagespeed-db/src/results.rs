//! Per-run result tables: naming, DDL, inserts, and read-back.

use chrono::NaiveDateTime;
use pagespeed_core::PageSpeedResult;
use sqlx::SqlitePool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from a `results_*` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResultRow {
    pub id: i64,
    pub url: String,
    pub strategy: String,
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
    pub first_contentful_paint: Option<String>,
    pub speed_index: Option<String>,
    pub interactive: Option<String>,
    pub first_meaningful_paint: Option<String>,
    pub cumulative_layout_shift: Option<String>,
    /// Filled by `DEFAULT CURRENT_TIMESTAMP` (UTC) at insert time.
    pub created_at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Table lifecycle
// ---------------------------------------------------------------------------

/// Table name for a run started at `started_at`, e.g.
/// `results_2025_03_07_142501`. Second resolution: two runs in the same
/// second share a table.
#[must_use]
pub fn run_table_name(started_at: NaiveDateTime) -> String {
    started_at.format("results_%Y_%m_%d_%H%M%S").to_string()
}

fn validate_table_name(name: &str) -> Result<(), DbError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidTableName(name.to_owned()))
    }
}

/// Creates the result table if it does not already exist.
///
/// # Errors
///
/// Returns [`DbError::InvalidTableName`] if `table` is not a plain identifier,
/// or [`DbError::Sqlx`] if the DDL fails.
pub async fn create_run_table(pool: &SqlitePool, table: &str) -> Result<(), DbError> {
    validate_table_name(table)?;

    let ddl = format!(
        "CREATE TABLE IF NOT EXISTS {table} ( \
             id INTEGER PRIMARY KEY, \
             url TEXT NOT NULL, \
             strategy TEXT NOT NULL, \
             performance FLOAT, \
             accessibility FLOAT, \
             best_practices FLOAT, \
             seo FLOAT, \
             first_contentful_paint TEXT, \
             speed_index TEXT, \
             interactive TEXT, \
             first_meaningful_paint TEXT, \
             cumulative_layout_shift TEXT, \
             created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP \
         )"
    );
    sqlx::query(&ddl).execute(pool).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts one result row keyed by its target id. The statement runs outside
/// any explicit transaction, so it is committed as soon as it returns.
///
/// # Errors
///
/// Returns [`DbError::InvalidTableName`] for a bad `table`, or
/// [`DbError::Sqlx`] if the insert fails (e.g. the id already exists).
pub async fn insert_result(
    pool: &SqlitePool,
    table: &str,
    result: &PageSpeedResult,
) -> Result<(), DbError> {
    validate_table_name(table)?;

    let sql = format!(
        "INSERT INTO {table} ( \
             id, url, strategy, performance, accessibility, best_practices, seo, \
             first_contentful_paint, speed_index, interactive, \
             first_meaningful_paint, cumulative_layout_shift \
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    );

    sqlx::query(&sql)
        .bind(result.target_id)
        .bind(result.url.as_str())
        .bind(result.strategy.as_str())
        .bind(result.performance)
        .bind(result.accessibility)
        .bind(result.best_practices)
        .bind(result.seo)
        .bind(result.first_contentful_paint.as_deref())
        .bind(result.speed_index.as_deref())
        .bind(result.interactive.as_deref())
        .bind(result.first_meaningful_paint.as_deref())
        .bind(result.cumulative_layout_shift.as_deref())
        .execute(pool)
        .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns every row of `table` ordered by id.
///
/// # Errors
///
/// Returns [`DbError::InvalidTableName`] for a bad `table`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn list_results(pool: &SqlitePool, table: &str) -> Result<Vec<ResultRow>, DbError> {
    validate_table_name(table)?;

    let sql = format!(
        "SELECT id, url, strategy, performance, accessibility, best_practices, seo, \
                first_contentful_paint, speed_index, interactive, \
                first_meaningful_paint, cumulative_layout_shift, created_at \
         FROM {table} ORDER BY id"
    );
    let rows = sqlx::query_as::<_, ResultRow>(&sql).fetch_all(pool).await?;

    Ok(rows)
}

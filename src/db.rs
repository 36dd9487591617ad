use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::fallback;
use crate::models::{AnalysisRecord, AnalysisResult, Mode};

pub const DEMO_USER: &str = "demo-user";

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Two placeholder analyses a week apart, so history and deltas have data
/// straight away.
pub async fn seed_demo(pool: &SqlitePool) -> anyhow::Result<()> {
    let mode = Mode::Health;

    let earlier = fallback::generate(mode, &fallback::seed_for(mode, "年齡:30", false));
    save_analysis_at(pool, DEMO_USER, mode, &earlier, Utc::now() - Duration::days(7)).await?;

    let latest = fallback::generate(mode, &fallback::seed_for(mode, "年齡:30", true));
    save_analysis(pool, DEMO_USER, mode, &latest).await?;

    Ok(())
}

pub async fn save_analysis(
    pool: &SqlitePool,
    user_id: &str,
    mode: Mode,
    result: &AnalysisResult,
) -> anyhow::Result<Uuid> {
    save_analysis_at(pool, user_id, mode, result, Utc::now()).await
}

pub async fn save_analysis_at(
    pool: &SqlitePool,
    user_id: &str,
    mode: Mode,
    result: &AnalysisResult,
    created_at: DateTime<Utc>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let items =
        serde_json::to_string(&result.items).context("failed to serialize indicator items")?;

    sqlx::query(
        r#"
        INSERT INTO analyses (id, user_id, mode, created_at, overall, items)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(user_id)
    .bind(mode.key())
    .bind(created_at)
    .bind(result.overall)
    .bind(items)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Most-recent records for one (user, mode) pair, newest first, capped at two:
/// the current analysis and the one before it.
pub async fn load_last_two(
    pool: &SqlitePool,
    user_id: &str,
    mode: Mode,
) -> anyhow::Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, mode, created_at, overall, items
        FROM analyses
        WHERE user_id = ? AND mode = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT 2
        "#,
    )
    .bind(user_id)
    .bind(mode.key())
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn load_history(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, mode, created_at, overall, items
        FROM analyses
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

pub async fn load_all(pool: &SqlitePool) -> anyhow::Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, mode, created_at, overall, items
        FROM analyses
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<AnalysisRecord> {
    let id: String = row.get("id");
    let mode: String = row.get("mode");
    let items: String = row.get("items");

    Ok(AnalysisRecord {
        id: Uuid::parse_str(&id).context("malformed record id")?,
        user_id: row.get("user_id"),
        mode: mode.parse::<Mode>()?,
        created_at: row.get("created_at"),
        overall: row.get("overall"),
        items: serde_json::from_str(&items).context("malformed items column")?,
    })
}

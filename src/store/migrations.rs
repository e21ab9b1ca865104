use sqlx::SqlitePool;
use tracing::info;

use super::StoreResult;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    member_id INTEGER PRIMARY KEY,
    username TEXT NOT NULL,
    tag TEXT NOT NULL,
    region TEXT NOT NULL,
    platform TEXT NOT NULL DEFAULT 'pc',
    rank_tier TEXT,
    rank_division INTEGER,
    rank_score INTEGER,
    last_updated INTEGER,
    registered_at INTEGER NOT NULL DEFAULT (unixepoch()),
    notify_dm INTEGER NOT NULL DEFAULT 1,
    notify_rank_up INTEGER NOT NULL DEFAULT 1,
    notify_rank_down INTEGER NOT NULL DEFAULT 1
);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}

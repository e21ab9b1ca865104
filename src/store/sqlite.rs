use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::UserId;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use super::migrations::run_migrations;
use super::{AccountRecord, AccountStore, NotificationPrefs, StoreError, StoreResult};
use crate::rank::{Rank, RankTier};
use crate::valorant::{Platform, Region, ValorantAccount};

const COLUMNS: &str = "member_id, username, tag, region, platform, rank_tier, rank_division, \
     rank_score, last_updated, registered_at, notify_dm, notify_rank_up, notify_rank_down";

#[derive(Debug, FromRow)]
struct AccountRow {
    member_id: i64,
    username: String,
    tag: String,
    region: String,
    platform: String,
    rank_tier: Option<String>,
    rank_division: Option<i64>,
    rank_score: Option<i64>,
    last_updated: Option<i64>,
    registered_at: i64,
    notify_dm: bool,
    notify_rank_up: bool,
    notify_rank_down: bool,
}

impl TryFrom<AccountRow> for AccountRecord {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let member_id = row.member_id as u64;
        let corrupt = |reason: String| StoreError::Corrupt { member_id, reason };

        let region = Region::from_str(&row.region).map_err(|e| corrupt(e.to_string()))?;
        let platform = Platform::from_str(&row.platform).map_err(|e| corrupt(e.to_string()))?;

        let current_rank = match row.rank_tier {
            Some(tier) => {
                let tier = RankTier::from_str(&tier).map_err(|e| corrupt(e.to_string()))?;
                let division = row
                    .rank_division
                    .map(u8::try_from)
                    .transpose()
                    .map_err(|e| corrupt(e.to_string()))?;
                let score = row.rank_score.unwrap_or(0).clamp(0, i64::from(u32::MAX)) as u32;
                Some(Rank::new(tier, division, score).map_err(|e| corrupt(e.to_string()))?)
            }
            None => None,
        };

        let member = (member_id != 0)
            .then(|| UserId::new(member_id))
            .ok_or_else(|| corrupt("member id is zero".into()))?;

        let registered_at = DateTime::<Utc>::from_timestamp(row.registered_at, 0)
            .ok_or_else(|| corrupt(format!("bad timestamp {}", row.registered_at)))?;

        Ok(Self {
            member_id: member,
            account: ValorantAccount {
                username: row.username,
                tag: row.tag,
                region,
                platform,
            },
            current_rank,
            last_updated: row
                .last_updated
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            registered_at,
            notifications: NotificationPrefs {
                dm: row.notify_dm,
                rank_up: row.notify_rank_up,
                rank_down: row.notify_rank_down,
            },
        })
    }
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // every connection to an in-memory database sees a different database
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn get_all(&self) -> StoreResult<Vec<AccountRecord>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {COLUMNS} FROM accounts ORDER BY member_id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccountRecord::try_from).collect()
    }

    async fn get_one(&self, member_id: UserId) -> StoreResult<Option<AccountRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {COLUMNS} FROM accounts WHERE member_id = ?"
        ))
        .bind(member_id.get() as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRecord::try_from).transpose()
    }

    async fn upsert(&self, record: &AccountRecord) -> StoreResult<()> {
        let rank = record.current_rank.as_ref();

        sqlx::query(
            r#"
            INSERT INTO accounts (member_id, username, tag, region, platform, rank_tier,
                rank_division, rank_score, last_updated, registered_at, notify_dm,
                notify_rank_up, notify_rank_down)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(member_id) DO UPDATE SET
                username = excluded.username,
                tag = excluded.tag,
                region = excluded.region,
                platform = excluded.platform,
                rank_tier = excluded.rank_tier,
                rank_division = excluded.rank_division,
                rank_score = excluded.rank_score,
                last_updated = excluded.last_updated,
                registered_at = excluded.registered_at,
                notify_dm = excluded.notify_dm,
                notify_rank_up = excluded.notify_rank_up,
                notify_rank_down = excluded.notify_rank_down
            "#,
        )
        .bind(record.member_id.get() as i64)
        .bind(&record.account.username)
        .bind(&record.account.tag)
        .bind(record.account.region.as_str())
        .bind(record.account.platform.as_str())
        .bind(rank.map(|r| r.tier.as_str()))
        .bind(rank.and_then(|r| r.division).map(|d| i64::from(d.get())))
        .bind(rank.map(|r| i64::from(r.score)))
        .bind(record.last_updated.map(|t| t.timestamp()))
        .bind(record.registered_at.timestamp())
        .bind(record.notifications.dm)
        .bind(record.notifications.rank_up)
        .bind(record.notifications.rank_down)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, member_id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE member_id = ?")
            .bind(member_id.get() as i64)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

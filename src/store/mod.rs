use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;

mod json_file;
mod migrations;
mod models;
mod sqlite;

pub use json_file::JsonFileStore;
pub use models::{AccountRecord, NotificationPrefs};
pub use sqlite::SqliteStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored record for member {member_id} is invalid: {reason}")]
    Corrupt { member_id: u64, reason: String },
}

/// Durable mapping from a member to their registered account.
/// At most one record exists per member.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn get_all(&self) -> StoreResult<Vec<AccountRecord>>;

    async fn get_one(&self, member_id: UserId) -> StoreResult<Option<AccountRecord>>;

    /// Insert or replace the record keyed by `record.member_id`.
    async fn upsert(&self, record: &AccountRecord) -> StoreResult<()>;

    /// Returns whether a record was removed.
    async fn delete(&self, member_id: UserId) -> StoreResult<bool>;
}

/// Open the backend selected in the configuration.
pub async fn open(config: &Config) -> Result<Arc<dyn AccountStore>, AppError> {
    let store: Arc<dyn AccountStore> = match &config.store_backend {
        StoreBackend::Json { path } => {
            info!(path = %path.display(), "🗄️ Using JSON account store");
            Arc::new(JsonFileStore::open(path).await?)
        }
        StoreBackend::Sqlite { url } => {
            info!(%url, "🗄️ Using SQLite account store");
            Arc::new(SqliteStore::connect(url).await?)
        }
    };

    Ok(store)
}

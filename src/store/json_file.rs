use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AccountRecord, AccountStore, StoreError, StoreResult};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    version: u32,
    accounts: Vec<AccountRecord>,
}

/// Flat-file store: the whole document lives in memory and every mutation
/// rewrites the file atomically (temp file, fsync, backup, rename).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    accounts: Mutex<BTreeMap<UserId, AccountRecord>>,
}

impl JsonFileStore {
    /// Load `path`, falling back to its backup when the primary file is unreadable.
    /// A missing file starts an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        let accounts = match load(&path).await {
            Ok(Some(accounts)) => accounts,
            Ok(None) => {
                info!(path = %path.display(), "🗄️ No account file yet, starting empty");
                Vec::new()
            }
            Err(e) => {
                let backup = backup_path(&path);
                warn!(
                    error = %e,
                    backup = %backup.display(),
                    "🗄️ ⚠️ Account file unreadable, loading backup"
                );
                load(&backup).await?.ok_or(e)?
            }
        };

        debug!(count = accounts.len(), "🗄️ Accounts loaded");

        Ok(Self {
            path,
            accounts: Mutex::new(
                accounts
                    .into_iter()
                    .map(|record| (record.member_id, record))
                    .collect(),
            ),
        })
    }

    /// Persist `next` and only then make it the in-memory state.
    async fn commit(
        &self,
        current: &mut BTreeMap<UserId, AccountRecord>,
        next: BTreeMap<UserId, AccountRecord>,
    ) -> StoreResult<()> {
        let document = Document {
            version: FORMAT_VERSION,
            accounts: next.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec_pretty(&document)?;

        write_atomic(&self.path, &bytes).await?;
        *current = next;

        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn get_all(&self) -> StoreResult<Vec<AccountRecord>> {
        Ok(self.accounts.lock().await.values().cloned().collect())
    }

    async fn get_one(&self, member_id: UserId) -> StoreResult<Option<AccountRecord>> {
        Ok(self.accounts.lock().await.get(&member_id).cloned())
    }

    async fn upsert(&self, record: &AccountRecord) -> StoreResult<()> {
        let mut accounts = self.accounts.lock().await;
        let mut next = accounts.clone();
        next.insert(record.member_id, record.clone());

        self.commit(&mut accounts, next).await
    }

    async fn delete(&self, member_id: UserId) -> StoreResult<bool> {
        let mut accounts = self.accounts.lock().await;
        if !accounts.contains_key(&member_id) {
            return Ok(false);
        }

        let mut next = accounts.clone();
        next.remove(&member_id);
        self.commit(&mut accounts, next).await?;

        Ok(true)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

async fn load(path: &Path) -> StoreResult<Option<Vec<AccountRecord>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let document: Document = serde_json::from_slice(&bytes)?;
    Ok(Some(document.accounts))
}

/// Write-to-temp-then-rename, keeping the previous file as `<name>.bak`.
async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp = temp_path(path);
    let result = async {
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        if tokio::fs::try_exists(path).await? {
            tokio::fs::copy(path, backup_path(path)).await?;
        }

        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }

    result.map_err(StoreError::from)
}

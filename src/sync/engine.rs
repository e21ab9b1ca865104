use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use poise::serenity_prelude::{GuildId, UserId};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Span, debug, error, info, instrument, warn};

use super::reconciler::{EnsureSummary, RoleReconciler};
use crate::discord::notifier::NotificationSink;
use crate::discord::roles::{RoleApiError, RoleRef};
use crate::error::AppError;
use crate::rank::{self, ParseError, Rank, RankChange};
use crate::store::{AccountRecord, AccountStore, NotificationPrefs, StoreError};
use crate::valorant::{ApiError, RankSource, ValorantAccount};

/// Why one account's cycle was abandoned.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] ApiError),

    #[error("unreadable rank: {0}")]
    Parse(#[from] ParseError),

    #[error("could not save rank: {0}")]
    Persist(#[from] StoreError),
}

impl SyncError {
    /// The next pass may well succeed for this account.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(e) if e.is_transient())
    }
}

#[derive(Debug)]
pub struct SyncFailure {
    pub member_id: UserId,
    pub riot_id: String,
    pub error: SyncError,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: usize,
    /// Accounts whose tier or division moved, first observations included.
    pub updated: usize,
    pub errors: Vec<SyncFailure>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} updated, {} failed",
            self.processed,
            self.updated,
            self.errors.len()
        )
    }
}

/// Outcome of a single account's successful cycle.
#[derive(Debug)]
struct Synced {
    rank: Rank,
    moved: bool,
}

#[derive(Debug)]
pub struct Registration {
    pub record: AccountRecord,
    /// Set when the record was stored but the role could not be applied yet.
    pub role_error: Option<RoleApiError>,
}

/// Drives the fetch, parse, classify, reconcile, persist cycle over every
/// registered account.
pub struct SyncEngine {
    store: Arc<dyn AccountStore>,
    source: Arc<dyn RankSource>,
    reconciler: RoleReconciler,
    sink: Arc<dyn NotificationSink>,
    guild_id: GuildId,
    pass_lock: Mutex<()>,
    /// Held while a member's record and roles are written.
    records_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn AccountStore>,
        source: Arc<dyn RankSource>,
        reconciler: RoleReconciler,
        sink: Arc<dyn NotificationSink>,
        guild_id: GuildId,
    ) -> Self {
        Self {
            store,
            source,
            reconciler,
            sink,
            guild_id,
            pass_lock: Mutex::new(()),
            records_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }

    /// Run one pass over all accounts, one at a time.
    ///
    /// Returns `None` without doing anything when a pass is already running.
    #[instrument(skip_all, fields(account_count))]
    pub async fn run_pass(&self) -> Option<BatchSummary> {
        let Ok(_guard) = self.pass_lock.try_lock() else {
            debug!("🔄 Previous pass still running, skipping");
            return None;
        };

        let accounts = match self.store.get_all().await {
            Ok(accounts) => accounts,
            Err(e) => {
                error!(error = %e, "🔄 ❌ Could not load accounts");
                return Some(BatchSummary::default());
            }
        };

        Span::current().record("account_count", accounts.len());

        let mut summary = BatchSummary::default();

        for record in accounts {
            summary.processed += 1;

            match self.sync_account(record.clone()).await {
                Ok(Some(synced)) => {
                    if synced.moved {
                        summary.updated += 1;
                    }
                    debug!(riot_id = %record.riot_id(), rank = %synced.rank, "🔄 Account synced");
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        error = %error,
                        transient = error.is_transient(),
                        member_id = %record.member_id,
                        riot_id = %record.riot_id(),
                        "🔄 ⚠️ Account sync failed"
                    );
                    summary.errors.push(SyncFailure {
                        member_id: record.member_id,
                        riot_id: record.riot_id(),
                        error,
                    });
                }
            }
        }

        info!(
            processed = summary.processed,
            updated = summary.updated,
            errors = summary.errors.len(),
            "🔄 Sync pass finished"
        );

        Some(summary)
    }

    #[instrument(
        skip(self, fetched),
        fields(member_id = %fetched.member_id, riot_id = %fetched.riot_id())
    )]
    async fn sync_account(&self, fetched: AccountRecord) -> Result<Option<Synced>, SyncError> {
        let raw = self.source.fetch_rank(&fetched.account).await?;
        let rank = rank::parse(&raw)?;

        let guard = self.records_lock.lock().await;

        // Commands may have changed the record while its rank was fetched.
        let Some(mut record) = self.store.get_one(fetched.member_id).await? else {
            debug!("🔄 Account unregistered during the pass, skipping");
            return Ok(None);
        };
        if record.account != fetched.account {
            debug!(now = %record.riot_id(), "🔄 Account replaced during the pass, skipping");
            return Ok(None);
        }

        let previous = record.current_rank.clone();
        let change = rank::classify(previous.as_ref(), &rank);
        let moved = previous
            .as_ref()
            .is_none_or(|previous| !previous.same_position(&rank));

        if let Err(e) = self
            .reconciler
            .reconcile(self.guild_id, record.member_id, &rank)
            .await
        {
            warn!(error = %e, "🏅 ⚠️ Role update failed, recording rank anyway");
        }

        record.observe(rank.clone(), Utc::now());
        self.store.upsert(&record).await?;
        drop(guard);

        // Only after the new rank is durable, so a failed write cannot announce twice.
        if let Some(change) = change {
            self.announce(&record, &change).await;
        }

        Ok(Some(Synced { rank, moved }))
    }

    async fn announce(&self, record: &AccountRecord, change: &RankChange) {
        info!(
            kind = %change.kind,
            from = %change.previous_label,
            to = %change.new_label,
            "{} Rank change detected",
            change.kind.emoji()
        );
        self.sink.notify(record, change).await;
    }

    /// Validate `account`, store it for `member` seeded with its current rank
    /// and apply the matching role.
    ///
    /// The first observation seeds history, so registering never notifies.
    #[instrument(skip(self, account), fields(%member, riot_id = %account.riot_id()))]
    pub async fn register(
        &self,
        member: UserId,
        account: ValorantAccount,
    ) -> Result<Registration, AppError> {
        let raw = self.source.fetch_rank(&account).await?;
        let rank = rank::parse(&raw)?;

        let _guard = self.records_lock.lock().await;

        let notifications = self
            .store
            .get_one(member)
            .await?
            .map(|existing| existing.notifications)
            .unwrap_or_default();

        let mut record = AccountRecord::new(member, account);
        record.notifications = notifications;
        record.observe(rank.clone(), Utc::now());
        self.store.upsert(&record).await?;

        info!(rank = %rank, "📝 ✅ Account registered");

        let role_error = self
            .reconciler
            .reconcile(self.guild_id, member, &rank)
            .await
            .err();
        if let Some(e) = &role_error {
            warn!(error = %e, "🏅 ⚠️ Could not apply rank role on registration");
        }

        Ok(Registration { record, role_error })
    }

    /// Forget `member` and take every rank-category role away from them.
    /// Returns whether a registration existed.
    #[instrument(skip(self), fields(%member))]
    pub async fn unregister(&self, member: UserId) -> Result<bool, AppError> {
        let _guard = self.records_lock.lock().await;
        let existed = self.store.delete(member).await?;

        match self.reconciler.strip(self.guild_id, member).await {
            Ok(removed) => {
                debug!(count = removed.len(), "🏅 Rank roles stripped");
            }
            Err(RoleApiError::MemberNotFound) => {
                debug!("🏅 Member already left the server");
            }
            Err(e) => return Err(e.into()),
        }

        info!(existed, "📝 Account unregistered");

        Ok(existed)
    }

    /// Replace `member`'s notification preferences.
    pub async fn set_notifications(
        &self,
        member: UserId,
        prefs: NotificationPrefs,
    ) -> Result<AccountRecord, AppError> {
        let _guard = self.records_lock.lock().await;
        let mut record = self
            .store
            .get_one(member)
            .await?
            .ok_or(AppError::NotRegistered)?;

        record.notifications = prefs;
        self.store.upsert(&record).await?;

        Ok(record)
    }

    pub async fn ensure_rank_roles(&self) -> Result<EnsureSummary, AppError> {
        Ok(self.reconciler.ensure_all(self.guild_id).await?)
    }

    /// Delete every rank-category role from the server. Registrations are kept
    /// and the next pass recreates the roles it needs.
    #[instrument(skip(self), fields(guild_id = %self.guild_id))]
    pub async fn delete_rank_roles(&self) -> Result<Vec<RoleRef>, AppError> {
        let _guard = self.records_lock.lock().await;
        let deleted = self.reconciler.delete_all(self.guild_id).await?;

        info!(count = deleted.len(), "🏅 Rank roles deleted");

        Ok(deleted)
    }
}

/// Run a pass every `period` until the task is aborted. Ticks that fire while
/// a pass is still running are dropped rather than queued.
pub fn start_sync_loop(engine: Arc<SyncEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = period.as_secs(), "🔄 Rank sync started");

        loop {
            ticker.tick().await;
            engine.run_pass().await;
        }
    })
}

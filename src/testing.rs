//! In-memory fakes for the engine's collaborators.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use poise::serenity_prelude::{GuildId, RoleId, UserId};

use crate::clock::Sleeper;
use crate::discord::notifier::NotificationSink;
use crate::discord::roles::{GuildRoleApi, NewRole, RoleApiError, RoleRef};
use crate::rank::RankChange;
use crate::store::{AccountRecord, AccountStore, StoreError, StoreResult};
use crate::valorant::{ApiError, ApiResult, RankSource, RawRankResponse, ValorantAccount};

#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<UserId, AccountRecord>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn with(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.member_id, r)).collect()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn record(&self, member: UserId) -> Option<AccountRecord> {
        self.records.lock().unwrap().get(&member).cloned()
    }

    fn write_error() -> StoreError {
        StoreError::Io(std::io::Error::other("disk full"))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_all(&self) -> StoreResult<Vec<AccountRecord>> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn get_one(&self, member_id: UserId) -> StoreResult<Option<AccountRecord>> {
        Ok(self.record(member_id))
    }

    async fn upsert(&self, record: &AccountRecord) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.member_id, record.clone());
        Ok(())
    }

    async fn delete(&self, member_id: UserId) -> StoreResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::write_error());
        }
        Ok(self.records.lock().unwrap().remove(&member_id).is_some())
    }
}

#[derive(Debug)]
enum Scripted {
    Body(RawRankResponse),
    RateLimited,
}

/// Rank source answering from a per-account script. Unknown accounts get a 404.
#[derive(Debug, Default)]
pub struct FakeRankSource {
    answers: Mutex<HashMap<String, Scripted>>,
    calls: AtomicUsize,
    hold: tokio::sync::Mutex<()>,
}

impl FakeRankSource {
    pub fn answer(&self, account: &ValorantAccount, body: &str) {
        self.answers.lock().unwrap().insert(
            account.riot_id(),
            Scripted::Body(RawRankResponse::from_body(body.to_string())),
        );
    }

    pub fn rate_limit(&self, account: &ValorantAccount) {
        self.answers
            .lock()
            .unwrap()
            .insert(account.riot_id(), Scripted::RateLimited);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Fetches block while the returned guard is alive.
    pub async fn hold(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.hold.lock().await
    }
}

#[async_trait]
impl RankSource for FakeRankSource {
    async fn fetch_rank(&self, account: &ValorantAccount) -> ApiResult<RawRankResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        drop(self.hold.lock().await);

        match self.answers.lock().unwrap().get(&account.riot_id()) {
            Some(Scripted::Body(body)) => Ok(body.clone()),
            Some(Scripted::RateLimited) => Err(ApiError::RateLimited { attempts: 4 }),
            None => Err(ApiError::Status(reqwest::StatusCode::NOT_FOUND)),
        }
    }
}

#[derive(Debug, Default)]
struct RoleState {
    roles: Vec<RoleRef>,
    members: HashMap<UserId, Vec<RoleId>>,
    created: Vec<NewRole>,
    next_id: u64,
}

impl RoleState {
    fn insert(&mut self, name: &str) -> RoleRef {
        self.next_id += 1;
        let role = RoleRef {
            id: RoleId::new(1000 + self.next_id),
            name: name.to_string(),
        };
        self.roles.push(role.clone());
        role
    }
}

/// Guild role API keeping roles and memberships in memory.
#[derive(Debug, Default)]
pub struct FakeRoles {
    state: Mutex<RoleState>,
    mutations: AtomicUsize,
    deny_creation: AtomicBool,
    race_on: Mutex<HashSet<String>>,
    missing_members: Mutex<HashSet<UserId>>,
    protected: Mutex<HashSet<String>>,
    role_cap: Mutex<Option<usize>>,
}

impl FakeRoles {
    pub fn seed_role(&self, name: &str) -> RoleId {
        self.state.lock().unwrap().insert(name).id
    }

    pub fn give(&self, member: UserId, role: RoleId) {
        self.state
            .lock()
            .unwrap()
            .members
            .entry(member)
            .or_default()
            .push(role);
    }

    pub fn member_role_names(&self, member: UserId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .members
            .get(&member)
            .into_iter()
            .flatten()
            .filter_map(|id| state.roles.iter().find(|r| r.id == *id))
            .map(|r| r.name.clone())
            .collect()
    }

    pub fn role_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn created_roles(&self) -> Vec<NewRole> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Refuse every role creation as if the bot lacked the permission.
    pub fn deny_creation(&self) {
        self.deny_creation.store(true, Ordering::SeqCst);
    }

    /// Simulate someone else creating `name` right before our own request.
    pub fn fail_next_create_as_existing(&self, name: &str) {
        self.race_on.lock().unwrap().insert(name.to_string());
    }

    /// Refuse taking `name` off members, as for a role above the bot's own.
    pub fn deny_removal(&self, name: &str) {
        self.protected.lock().unwrap().insert(name.to_string());
    }

    /// Refuse creations once the server holds `max` roles.
    pub fn cap_roles(&self, max: usize) {
        *self.role_cap.lock().unwrap() = Some(max);
    }

    pub fn remove_member(&self, member: UserId) {
        self.missing_members.lock().unwrap().insert(member);
    }

    fn check_member(&self, member: UserId) -> Result<(), RoleApiError> {
        if self.missing_members.lock().unwrap().contains(&member) {
            Err(RoleApiError::MemberNotFound)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GuildRoleApi for FakeRoles {
    async fn list_roles(&self, _guild: GuildId) -> Result<Vec<RoleRef>, RoleApiError> {
        Ok(self.state.lock().unwrap().roles.clone())
    }

    async fn create_role(&self, _guild: GuildId, role: &NewRole) -> Result<RoleRef, RoleApiError> {
        if self.deny_creation.load(Ordering::SeqCst) {
            return Err(RoleApiError::Permission);
        }

        let mut state = self.state.lock().unwrap();
        if self
            .role_cap
            .lock()
            .unwrap()
            .is_some_and(|max| state.roles.len() >= max)
        {
            return Err(RoleApiError::LimitReached);
        }
        if self.race_on.lock().unwrap().remove(&role.name) {
            state.insert(&role.name);
            return Err(RoleApiError::AlreadyExists);
        }

        self.mutations.fetch_add(1, Ordering::SeqCst);
        state.created.push(role.clone());
        Ok(state.insert(&role.name))
    }

    async fn member_roles(
        &self,
        _guild: GuildId,
        member: UserId,
    ) -> Result<Vec<RoleId>, RoleApiError> {
        self.check_member(member)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .members
            .get(&member)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_role(
        &self,
        _guild: GuildId,
        member: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), RoleApiError> {
        self.check_member(member)?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let held = state.members.entry(member).or_default();
        if !held.contains(&role) {
            held.push(role);
        }
        Ok(())
    }

    async fn remove_role(
        &self,
        _guild: GuildId,
        member: UserId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), RoleApiError> {
        self.check_member(member)?;
        let mut state = self.state.lock().unwrap();
        let protected = self.protected.lock().unwrap();
        if state
            .roles
            .iter()
            .any(|r| r.id == role && protected.contains(&r.name))
        {
            return Err(RoleApiError::Permission);
        }

        self.mutations.fetch_add(1, Ordering::SeqCst);
        if let Some(held) = state.members.get_mut(&member) {
            held.retain(|r| *r != role);
        }
        Ok(())
    }

    async fn delete_role(
        &self,
        _guild: GuildId,
        role: RoleId,
        _reason: &str,
    ) -> Result<(), RoleApiError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.roles.retain(|r| r.id != role);
        for held in state.members.values_mut() {
            held.retain(|r| *r != role);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(UserId, RankChange)>>,
}

impl RecordingSink {
    pub fn sent(&self) -> Vec<(UserId, RankChange)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, record: &AccountRecord, change: &RankChange) {
        self.sent
            .lock()
            .unwrap()
            .push((record.member_id, change.clone()));
    }
}

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude::{GuildId, RoleId, UserId};
use tracing::{debug, info, instrument, warn};

use crate::clock::Sleeper;
use crate::discord::roles::{GuildRoleApi, NewRole, RoleApiError, RoleRef};
use crate::rank::{Rank, RankTier, RoleName};

/// What a reconciliation changed on the member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDelta {
    pub added: Option<RoleRef>,
    pub removed: Vec<RoleRef>,
    /// The target role had to be created first.
    pub created: bool,
}

impl RoleDelta {
    pub fn is_noop(&self) -> bool {
        self.added.is_none() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsureSummary {
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

/// Keeps a member's rank-category roles in line with their rank.
#[derive(Clone)]
pub struct RoleReconciler {
    api: Arc<dyn GuildRoleApi>,
    sleeper: Arc<dyn Sleeper>,
    mutation_delay: Duration,
}

/// Spaces out successive role mutations of a single operation.
struct Pacer<'a> {
    sleeper: &'a dyn Sleeper,
    delay: Duration,
    mutated: bool,
}

impl Pacer<'_> {
    async fn before_mutation(&mut self) {
        if self.mutated {
            self.sleeper.sleep(self.delay).await;
        }
        self.mutated = true;
    }
}

impl RoleReconciler {
    pub const DEFAULT_MUTATION_DELAY: Duration = Duration::from_millis(100);

    pub fn new(
        api: Arc<dyn GuildRoleApi>,
        sleeper: Arc<dyn Sleeper>,
        mutation_delay: Duration,
    ) -> Self {
        Self {
            api,
            sleeper,
            mutation_delay,
        }
    }

    fn pacer(&self) -> Pacer<'_> {
        Pacer {
            sleeper: self.sleeper.as_ref(),
            delay: self.mutation_delay,
            mutated: false,
        }
    }

    /// Make `member` hold exactly the role matching `rank` in the rank category.
    ///
    /// Idempotent: once applied, calling it again with the same rank performs
    /// no mutation.
    #[instrument(skip(self, rank), fields(%guild, %member, role = %rank.role_name()))]
    pub async fn reconcile(
        &self,
        guild: GuildId,
        member: UserId,
        rank: &Rank,
    ) -> Result<RoleDelta, RoleApiError> {
        let mut pacer = self.pacer();
        let roles = self.api.list_roles(guild).await?;

        let (target, created) = self
            .ensure_role(guild, &roles, rank.tier, &rank.role_name(), &mut pacer)
            .await?;

        let held = self.api.member_roles(guild, member).await?;

        let removed = self
            .remove_rank_roles(guild, member, &roles, &held, Some(target.id), &mut pacer)
            .await?;

        let added = if held.contains(&target.id) {
            None
        } else {
            pacer.before_mutation().await;
            self.api
                .add_role(guild, member, target.id, "Rank sync")
                .await?;
            debug!(role = %target.name, "🏅 Added rank role");
            Some(target)
        };

        Ok(RoleDelta {
            added,
            removed,
            created,
        })
    }

    /// Remove every rank-category role from `member`.
    #[instrument(skip(self), fields(%guild, %member))]
    pub async fn strip(&self, guild: GuildId, member: UserId) -> Result<Vec<RoleRef>, RoleApiError> {
        let mut pacer = self.pacer();
        let roles = self.api.list_roles(guild).await?;
        let held = self.api.member_roles(guild, member).await?;

        self.remove_rank_roles(guild, member, &roles, &held, None, &mut pacer)
            .await
    }

    /// Create every missing role of the rank-category namespace.
    pub async fn ensure_all(&self, guild: GuildId) -> Result<EnsureSummary, RoleApiError> {
        let mut pacer = self.pacer();
        let roles = self.api.list_roles(guild).await?;
        let mut summary = EnsureSummary::default();

        for name in RankTier::all_role_names() {
            let Some(role) = RoleName::parse(&name) else {
                continue;
            };

            match self
                .ensure_role(guild, &roles, role.tier, &name, &mut pacer)
                .await
            {
                Ok((_, true)) => summary.created += 1,
                Ok((_, false)) => summary.existing += 1,
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, role = %name, "🏅 ⚠️ Could not create rank role");
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            created = summary.created,
            existing = summary.existing,
            failed = summary.failed,
            "🏅 Rank roles ensured"
        );

        Ok(summary)
    }

    /// Delete every rank-category role from the server. Roles the bot may not
    /// delete are left in place.
    pub async fn delete_all(&self, guild: GuildId) -> Result<Vec<RoleRef>, RoleApiError> {
        let mut pacer = self.pacer();
        let roles = self.api.list_roles(guild).await?;
        let mut deleted = Vec::new();

        for role in roles.into_iter().filter(|r| RoleName::is_rank_role(&r.name)) {
            pacer.before_mutation().await;
            match self.api.delete_role(guild, role.id, "Rank roles reset").await {
                Ok(()) => {
                    debug!(role = %role.name, "🏅 Deleted rank role");
                    deleted.push(role);
                }
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, role = %role.name, "🏅 ⚠️ Could not delete rank role");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(deleted)
    }

    /// Find the role by name, creating it when absent.
    ///
    /// Another reconciliation may create the same role concurrently, so a
    /// failed creation is followed by a fresh lookup before giving up.
    async fn ensure_role(
        &self,
        guild: GuildId,
        roles: &[RoleRef],
        tier: RankTier,
        name: &str,
        pacer: &mut Pacer<'_>,
    ) -> Result<(RoleRef, bool), RoleApiError> {
        if let Some(role) = roles.iter().find(|r| r.name == name) {
            return Ok((role.clone(), false));
        }

        let new_role = NewRole {
            name: name.to_string(),
            color: tier.color(),
            hoist: true,
            mentionable: false,
        };

        pacer.before_mutation().await;
        match self.api.create_role(guild, &new_role).await {
            Ok(role) => {
                info!(role = %role.name, id = %role.id, "🏅 ✅ Created rank role");
                Ok((role, true))
            }
            Err(e) => {
                let refreshed = self.api.list_roles(guild).await?;
                match refreshed.into_iter().find(|r| r.name == name) {
                    Some(role) => {
                        debug!(role = %role.name, "🏅 Rank role appeared concurrently");
                        Ok((role, false))
                    }
                    None => Err(e),
                }
            }
        }
    }

    async fn remove_rank_roles(
        &self,
        guild: GuildId,
        member: UserId,
        roles: &[RoleRef],
        held: &[RoleId],
        keep: Option<RoleId>,
        pacer: &mut Pacer<'_>,
    ) -> Result<Vec<RoleRef>, RoleApiError> {
        let mut removed = Vec::new();

        for role in roles.iter().filter(|r| {
            held.contains(&r.id) && Some(r.id) != keep && RoleName::is_rank_role(&r.name)
        }) {
            pacer.before_mutation().await;
            match self
                .api
                .remove_role(guild, member, role.id, "Rank update")
                .await
            {
                Ok(()) => {
                    debug!(role = %role.name, "🏅 Removed old rank role");
                    removed.push(role.clone());
                }
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, role = %role.name, "🏅 ⚠️ Could not remove rank role");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(removed)
    }
}

//! The slice of the Discord role API the rank reconciler needs.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{Colour, EditRole, GuildId, Http, RoleId, UserId};
use serenity::http::HttpError;
use thiserror::Error;

/// Discord JSON error codes we react to.
const MISSING_PERMISSIONS: isize = 50013;
const MAX_ROLES_REACHED: isize = 30005;
const UNKNOWN_MEMBER: isize = 10007;

#[derive(Debug, Error)]
pub enum RoleApiError {
    #[error("missing permission to manage roles")]
    Permission,

    #[error("the server reached its maximum number of roles")]
    LimitReached,

    #[error("a role with this name already exists")]
    AlreadyExists,

    #[error("member is not in the server")]
    MemberNotFound,

    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),
}

impl RoleApiError {
    /// Refusals that only concern role creation or mutation and must not stop a batch.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::Permission | Self::LimitReached)
    }


    fn from_discord_code(code: isize, message: &str) -> Option<Self> {
        match code {
            MISSING_PERMISSIONS => Some(Self::Permission),
            MAX_ROLES_REACHED => Some(Self::LimitReached),
            UNKNOWN_MEMBER => Some(Self::MemberNotFound),
            _ if message.contains("already exists") => Some(Self::AlreadyExists),
            _ => None,
        }
    }
}

impl From<serenity::Error> for RoleApiError {
    fn from(err: serenity::Error) -> Self {
        if let serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) = &err {
            if let Some(mapped) =
                Self::from_discord_code(response.error.code, &response.error.message)
            {
                return mapped;
            }
        }
        Self::Discord(Box::new(err))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: RoleId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub mentionable: bool,
}

#[async_trait]
pub trait GuildRoleApi: Send + Sync {
    async fn list_roles(&self, guild: GuildId) -> Result<Vec<RoleRef>, RoleApiError>;

    async fn create_role(&self, guild: GuildId, role: &NewRole) -> Result<RoleRef, RoleApiError>;

    async fn member_roles(&self, guild: GuildId, member: UserId)
    -> Result<Vec<RoleId>, RoleApiError>;

    async fn add_role(
        &self,
        guild: GuildId,
        member: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError>;

    async fn remove_role(
        &self,
        guild: GuildId,
        member: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError>;

    async fn delete_role(
        &self,
        guild: GuildId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError>;
}

/// [`GuildRoleApi`] backed by the serenity HTTP client.
#[derive(Debug, Clone)]
pub struct SerenityRoles {
    http: Arc<Http>,
}

impl SerenityRoles {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GuildRoleApi for SerenityRoles {
    async fn list_roles(&self, guild: GuildId) -> Result<Vec<RoleRef>, RoleApiError> {
        let roles = self.http.get_guild_roles(guild).await?;

        Ok(roles
            .into_iter()
            .map(|role| RoleRef {
                id: role.id,
                name: role.name,
            })
            .collect())
    }

    async fn create_role(&self, guild: GuildId, role: &NewRole) -> Result<RoleRef, RoleApiError> {
        let builder = EditRole::new()
            .name(&role.name)
            .colour(Colour::new(role.color))
            .hoist(role.hoist)
            .mentionable(role.mentionable)
            .audit_log_reason("Rank role");

        let created = guild.create_role(self.http.as_ref(), builder).await?;

        Ok(RoleRef {
            id: created.id,
            name: created.name,
        })
    }

    async fn member_roles(
        &self,
        guild: GuildId,
        member: UserId,
    ) -> Result<Vec<RoleId>, RoleApiError> {
        Ok(self.http.get_member(guild, member).await?.roles)
    }

    async fn add_role(
        &self,
        guild: GuildId,
        member: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError> {
        self.http
            .add_member_role(guild, member, role, Some(reason))
            .await?;
        Ok(())
    }

    async fn remove_role(
        &self,
        guild: GuildId,
        member: UserId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError> {
        self.http
            .remove_member_role(guild, member, role, Some(reason))
            .await?;
        Ok(())
    }

    async fn delete_role(
        &self,
        guild: GuildId,
        role: RoleId,
        reason: &str,
    ) -> Result<(), RoleApiError> {
        self.http.delete_role(guild, role, Some(reason)).await?;
        Ok(())
    }
}

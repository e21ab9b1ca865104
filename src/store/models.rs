use chrono::{DateTime, Utc};
use poise::serenity_prelude::UserId;
use serde::{Deserialize, Serialize};

use crate::rank::{ChangeKind, Rank};
use crate::valorant::ValorantAccount;

/// A member's registration and the last rank the sync engine saw for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub member_id: UserId,
    #[serde(flatten)]
    pub account: ValorantAccount,
    pub current_rank: Option<Rank>,
    pub last_updated: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub notifications: NotificationPrefs,
}

impl AccountRecord {
    pub fn new(member_id: UserId, account: ValorantAccount) -> Self {
        Self {
            member_id,
            account,
            current_rank: None,
            last_updated: None,
            registered_at: Utc::now(),
            notifications: NotificationPrefs::default(),
        }
    }

    pub fn riot_id(&self) -> String {
        self.account.riot_id()
    }

    /// Record a successful observation.
    pub fn observe(&mut self, rank: Rank, at: DateTime<Utc>) {
        self.current_rank = Some(rank);
        self.last_updated = Some(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPrefs {
    /// Also send rank changes to the member's DMs.
    pub dm: bool,
    pub rank_up: bool,
    pub rank_down: bool,
}

impl NotificationPrefs {
    pub fn allows(&self, kind: ChangeKind) -> bool {
        if kind.is_promotion() {
            self.rank_up
        } else {
            self.rank_down
        }
    }
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            dm: true,
            rank_up: true,
            rank_down: true,
        }
    }
}

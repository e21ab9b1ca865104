//! Delivery of rank-change announcements.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, ChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage, Http,
    UserId,
};
use tracing::{debug, error, warn};

use crate::rank::{ChangeKind, RankChange};
use crate::store::AccountRecord;

/// Receives every classified rank change. Delivery failures stay inside the sink.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, record: &AccountRecord, change: &RankChange);
}

/// A way to put a message in front of people.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, channel_id: ChannelId, msg: CreateMessage)
    -> serenity::Result<()>;

    async fn send_dm(&self, user_id: UserId, msg: CreateMessage) -> serenity::Result<()>;
}

#[async_trait]
impl MessageSender for Arc<Http> {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        msg: CreateMessage,
    ) -> serenity::Result<()> {
        channel_id.send_message(self, msg).await.map(|_| ())
    }

    async fn send_dm(&self, user_id: UserId, msg: CreateMessage) -> serenity::Result<()> {
        let channel = user_id.create_dm_channel(self).await?;
        channel.send_message(self, msg).await.map(|_| ())
    }
}

pub type DiscordNotifier = Notifier<Arc<Http>>;

/// [`NotificationSink`] posting to the alert channel and, when the member
/// allows it, to their DMs.
#[derive(Debug, Clone)]
pub struct Notifier<S> {
    sender: S,
    alert_channel: Option<ChannelId>,
}

impl<S> Notifier<S> {
    pub fn new(sender: S, alert_channel: Option<ChannelId>) -> Self {
        Self {
            sender,
            alert_channel,
        }
    }
}

#[async_trait]
impl<S: MessageSender> NotificationSink for Notifier<S> {
    async fn notify(&self, record: &AccountRecord, change: &RankChange) {
        let prefs = record.notifications;
        if !prefs.allows(change.kind) {
            debug!(member = %record.member_id, kind = %change.kind, "🔔 Change muted by member");
            return;
        }

        match self.alert_channel {
            Some(channel_id) => {
                let msg = CreateMessage::new()
                    .content(format!("<@{}>", record.member_id))
                    .embed(change_embed(record, change));
                if let Err(e) = self.sender.send_message(channel_id, msg).await {
                    error!("🔔 Failed to post rank change: {}", e);
                }
            }
            None => warn!("🔔 No alert channel configured, skipping announcement"),
        }

        if prefs.dm {
            let msg = CreateMessage::new().embed(change_embed(record, change));
            if let Err(e) = self.sender.send_dm(record.member_id, msg).await {
                warn!(member = %record.member_id, "🔔 Could not DM rank change: {}", e);
            }
        }
    }
}

fn change_colour(kind: ChangeKind) -> Colour {
    if kind.is_promotion() {
        Colour::DARK_GREEN
    } else {
        Colour::RED
    }
}

fn change_title(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::RankUp => "Rank up!",
        ChangeKind::DivisionUp => "Division up",
        ChangeKind::RankDown => "Rank down",
        ChangeKind::DivisionDown => "Division down",
    }
}

pub fn change_embed(record: &AccountRecord, change: &RankChange) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("{} {}", change.kind.emoji(), change_title(change.kind)))
        .description(format!(
            "**{}**: {} → **{}**",
            record.riot_id(),
            change.previous_label,
            change.new_label
        ))
        .colour(change_colour(change.kind))
        .footer(CreateEmbedFooter::new(format!(
            "Region: {}",
            record.account.region
        )))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::NotificationPrefs;
    use crate::valorant::{Platform, Region, ValorantAccount};

    #[derive(Default)]
    struct DummySender {
        channel: Mutex<Vec<ChannelId>>,
        dms: Mutex<Vec<UserId>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageSender for DummySender {
        async fn send_message(
            &self,
            channel_id: ChannelId,
            _msg: CreateMessage,
        ) -> serenity::Result<()> {
            if self.fail {
                return Err(serenity::Error::Other("fail"));
            }
            self.channel.lock().unwrap().push(channel_id);
            Ok(())
        }

        async fn send_dm(&self, user_id: UserId, _msg: CreateMessage) -> serenity::Result<()> {
            if self.fail {
                return Err(serenity::Error::Other("fail"));
            }
            self.dms.lock().unwrap().push(user_id);
            Ok(())
        }
    }

    fn record(prefs: NotificationPrefs) -> AccountRecord {
        let mut record = AccountRecord::new(
            UserId::new(5),
            ValorantAccount {
                username: "Name".into(),
                tag: "Tag".into(),
                region: Region::Ap,
                platform: Platform::Pc,
            },
        );
        record.notifications = prefs;
        record
    }

    fn change(kind: ChangeKind) -> RankChange {
        RankChange {
            kind,
            previous_label: "Gold 3".into(),
            new_label: "Platinum 1".into(),
        }
    }

    #[tokio::test]
    async fn posts_to_channel_and_dm() {
        let notifier = Notifier::new(DummySender::default(), Some(ChannelId::new(9)));

        notifier
            .notify(&record(NotificationPrefs::default()), &change(ChangeKind::RankUp))
            .await;

        assert_eq!(*notifier.sender.channel.lock().unwrap(), vec![ChannelId::new(9)]);
        assert_eq!(*notifier.sender.dms.lock().unwrap(), vec![UserId::new(5)]);
    }

    #[tokio::test]
    async fn respects_member_preferences() {
        let notifier = Notifier::new(DummySender::default(), Some(ChannelId::new(9)));
        let prefs = NotificationPrefs {
            dm: false,
            rank_up: true,
            rank_down: false,
        };

        notifier
            .notify(&record(prefs), &change(ChangeKind::DivisionDown))
            .await;
        notifier
            .notify(&record(prefs), &change(ChangeKind::DivisionUp))
            .await;

        assert_eq!(notifier.sender.channel.lock().unwrap().len(), 1);
        assert!(notifier.sender.dms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn without_channel_only_dms() {
        let notifier = Notifier::new(DummySender::default(), None);

        notifier
            .notify(&record(NotificationPrefs::default()), &change(ChangeKind::RankDown))
            .await;

        assert!(notifier.sender.channel.lock().unwrap().is_empty());
        assert_eq!(notifier.sender.dms.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delivery_failures_are_swallowed() {
        let notifier = Notifier::new(
            DummySender {
                fail: true,
                ..Default::default()
            },
            Some(ChannelId::new(1)),
        );

        notifier
            .notify(&record(NotificationPrefs::default()), &change(ChangeKind::RankUp))
            .await;
    }
}

use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use crate::discord::bot::Context;
use crate::error::AppError;
use crate::sync::Registration;
use crate::valorant::{Platform, Region, ValorantAccount};

pub(super) fn account_from_args(
    username: &str,
    tag: &str,
    region: Region,
    platform: Option<Platform>,
) -> ValorantAccount {
    ValorantAccount {
        username: username.trim().to_string(),
        tag: tag.trim().trim_start_matches('#').to_string(),
        region,
        platform: platform.unwrap_or_default(),
    }
}

pub(super) fn registration_embed(registration: &Registration, member: &str) -> serenity::CreateEmbed {
    let record = &registration.record;

    let rank = record
        .current_rank
        .as_ref()
        .map(|r| r.to_string())
        .unwrap_or_else(|| "Unknown".into());

    let embed = serenity::CreateEmbed::new()
        .title("Account Registered")
        .description(format!(
            "**{}** on **{}** is now linked to {}",
            record.riot_id(),
            record.account.region.display_name(),
            member
        ))
        .color(0x00ff00)
        .field("Rank", rank, true)
        .field("Platform", record.account.platform.to_string(), true);

    match &registration.role_error {
        Some(e) => embed.field("Role", format!("Not applied yet: {}", e), false),
        None => embed,
    }
}

/// Link your Valorant account to get a rank role
#[poise::command(slash_command, guild_only)]
#[instrument(
    skip(ctx),
    fields(
        user_id = %ctx.author().id,
        riot_id = %format!("{}#{}", username, tag),
        region = %region
    )
)]
pub async fn register(
    ctx: Context<'_>,
    #[description = "Riot name (before the #)"] username: String,
    #[description = "Tag (after the #)"] tag: String,
    #[description = "Server region"] region: Region,
    #[description = "Platform, PC by default"] platform: Option<Platform>,
) -> Result<(), AppError> {
    let account = account_from_args(&username, &tag, region, platform);

    // Validation hits the ranking API
    ctx.defer().await?;

    let registration = ctx
        .data()
        .engine
        .register(ctx.author().id, account)
        .await?;

    let embed = registration_embed(&registration, &ctx.author().name);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!("Account registered from command");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_are_trimmed_and_tag_hash_dropped() {
        let account = account_from_args("  Tyu-ru ", " #1234", Region::Ap, None);

        assert_eq!(account.username, "Tyu-ru");
        assert_eq!(account.tag, "1234");
        assert_eq!(account.platform, Platform::default());
    }
}

use poise::serenity_prelude as serenity;

use crate::discord::bot::Context;
use crate::error::AppError;

/// Show the last synced rank of a member
#[poise::command(slash_command, guild_only)]
pub async fn rank(
    ctx: Context<'_>,
    #[description = "Member to look up, yourself by default"] member: Option<serenity::User>,
) -> Result<(), AppError> {
    let user = member.as_ref().unwrap_or_else(|| ctx.author());

    let Some(record) = ctx.data().engine.store().get_one(user.id).await? else {
        ctx.say(format!(
            "**{}** has no Valorant account registered.\nUse `/register` to add one.",
            user.name
        ))
        .await?;
        return Ok(());
    };

    let (rank, colour) = match &record.current_rank {
        Some(rank) => (rank.to_string(), rank.tier.color()),
        None => ("Not synced yet".to_string(), 0x0099ff),
    };

    let updated = record
        .last_updated
        .map(|t| format!("<t:{}:R>", t.timestamp()))
        .unwrap_or_else(|| "never".into());

    let embed = serenity::CreateEmbed::new()
        .title(record.riot_id())
        .description(rank)
        .color(colour)
        .field("Region", record.account.region.display_name(), true)
        .field("Last sync", updated, true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

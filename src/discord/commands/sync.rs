use poise::serenity_prelude as serenity;
use tracing::instrument;

use crate::discord::bot::Context;
use crate::error::AppError;

const MAX_LISTED_FAILURES: usize = 10;

/// Run a rank sync pass now
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES",
    default_member_permissions = "MANAGE_ROLES"
)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn sync(ctx: Context<'_>) -> Result<(), AppError> {
    ctx.defer().await?;

    let Some(summary) = ctx.data().engine.run_pass().await else {
        ctx.say("A sync pass is already running.").await?;
        return Ok(());
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("Rank Sync")
        .description(summary.to_string())
        .color(if summary.errors.is_empty() {
            0x00ff00
        } else {
            0xffa500
        });

    if !summary.errors.is_empty() {
        let failures = summary
            .errors
            .iter()
            .take(MAX_LISTED_FAILURES)
            .map(|f| format!("- <@{}> **{}**: {}", f.member_id, f.riot_id, f.error))
            .collect::<Vec<_>>()
            .join("\n");
        embed = embed.field("Failures", failures, false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use crate::discord::bot::Context;
use crate::error::AppError;

/// Delete every rank role from the server
#[poise::command(
    slash_command,
    guild_only,
    ephemeral,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn deleterank(
    ctx: Context<'_>,
    #[description = "This cannot be undone, set to True to proceed"] confirm: bool,
) -> Result<(), AppError> {
    if !confirm {
        ctx.say("Nothing deleted. Run again with `confirm: True` to remove every rank role.")
            .await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    let deleted = ctx.data().engine.delete_rank_roles().await?;

    if deleted.is_empty() {
        ctx.say("No rank roles found to delete.").await?;
        return Ok(());
    }

    let names = deleted
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let embed = serenity::CreateEmbed::new()
        .title("Rank Roles Deleted")
        .description(format!("{} roles removed", deleted.len()))
        .color(0xff0000)
        .field("Roles", names, false)
        .footer(serenity::CreateEmbedFooter::new(
            "Registered accounts are kept, the next sync recreates their roles",
        ));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!(count = deleted.len(), "Rank roles deleted from command");

    Ok(())
}

use tracing::instrument;

use crate::discord::bot::Context;
use crate::error::AppError;

/// Unlink your Valorant account and remove your rank role
#[poise::command(slash_command, guild_only, ephemeral)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn unregister(ctx: Context<'_>) -> Result<(), AppError> {
    ctx.defer_ephemeral().await?;

    let existed = ctx.data().engine.unregister(ctx.author().id).await?;

    if existed {
        ctx.say("Your Valorant account was unlinked and your rank role removed.")
            .await?;
    } else {
        ctx.say("You had no Valorant account registered.").await?;
    }

    Ok(())
}

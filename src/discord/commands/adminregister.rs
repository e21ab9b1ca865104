use poise::serenity_prelude as serenity;
use tracing::{info, instrument};

use super::register::{account_from_args, registration_embed};
use crate::discord::bot::Context;
use crate::error::AppError;
use crate::valorant::{Platform, Region};

/// Link a Valorant account to another member (admins only)
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
#[instrument(
    skip(ctx, member),
    fields(
        user_id = %ctx.author().id,
        target_id = %member.id,
        riot_id = %format!("{}#{}", username, tag),
        region = %region
    )
)]
pub async fn adminregister(
    ctx: Context<'_>,
    #[description = "Member to register"] member: serenity::User,
    #[description = "Riot name (before the #)"] username: String,
    #[description = "Tag (after the #)"] tag: String,
    #[description = "Server region"] region: Region,
    #[description = "Platform, PC by default"] platform: Option<Platform>,
) -> Result<(), AppError> {
    let account = account_from_args(&username, &tag, region, platform);

    ctx.defer().await?;

    let registration = ctx.data().engine.register(member.id, account).await?;

    let embed = registration_embed(&registration, &member.name)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Registered by {}",
            ctx.author().name
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    info!("Account registered for another member");

    Ok(())
}

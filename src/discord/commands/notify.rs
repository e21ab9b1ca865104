use tracing::instrument;

use crate::discord::bot::Context;
use crate::error::AppError;

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

/// Choose which rank changes you are told about
#[poise::command(slash_command, guild_only, ephemeral)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn notify(
    ctx: Context<'_>,
    #[description = "Also send changes to your DMs"] dm: Option<bool>,
    #[description = "Announce promotions"] rank_up: Option<bool>,
    #[description = "Announce demotions"] rank_down: Option<bool>,
) -> Result<(), AppError> {
    let engine = &ctx.data().engine;
    let member = ctx.author().id;

    let mut prefs = engine
        .store()
        .get_one(member)
        .await?
        .ok_or(AppError::NotRegistered)?
        .notifications;

    prefs.dm = dm.unwrap_or(prefs.dm);
    prefs.rank_up = rank_up.unwrap_or(prefs.rank_up);
    prefs.rank_down = rank_down.unwrap_or(prefs.rank_down);

    let record = engine.set_notifications(member, prefs).await?;
    let prefs = record.notifications;

    ctx.say(format!(
        "Notifications: DM **{}**, rank up **{}**, rank down **{}**",
        on_off(prefs.dm),
        on_off(prefs.rank_up),
        on_off(prefs.rank_down)
    ))
    .await?;

    Ok(())
}

use poise::serenity_prelude as serenity;
use tracing::instrument;

use crate::discord::bot::Context;
use crate::error::AppError;

/// Embed descriptions are capped by Discord.
const MAX_DESCRIPTION_CHARS: usize = 4000;

/// Show recent matches of your registered account
#[poise::command(slash_command, guild_only)]
#[instrument(skip(ctx), fields(user_id = %ctx.author().id))]
pub async fn history(ctx: Context<'_>) -> Result<(), AppError> {
    let record = ctx
        .data()
        .engine
        .store()
        .get_one(ctx.author().id)
        .await?
        .ok_or(AppError::NotRegistered)?;

    ctx.defer().await?;

    let text = ctx
        .data()
        .api
        .get_match_history(&record.account, &ctx.data().config.match_history_timezone)
        .await?;

    let description = if text.trim().is_empty() {
        "No recent matches.".to_string()
    } else {
        truncate(text.trim(), MAX_DESCRIPTION_CHARS)
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Match history of {}", record.riot_id()))
        .description(description)
        .color(0x0099ff);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    }
}

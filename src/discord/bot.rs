use std::sync::Arc;

use poise::serenity_prelude::Http;
use tracing::{error, info, warn};

use crate::clock::TokioSleeper;
use crate::config::Config;
use crate::error::AppError;
use crate::store::AccountStore;
use crate::sync::{RoleReconciler, SyncEngine, start_sync_loop};
use crate::valorant::ValorantClient;

use super::commands;
use super::notifier::DiscordNotifier;
use super::roles::SerenityRoles;

/// Shared data accessible in all commands
pub struct Data {
    pub engine: Arc<SyncEngine>,
    pub api: ValorantClient,
    pub config: Arc<Config>,
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("engine", &"<SyncEngine>")
            .field("api", &self.api)
            .field("guild_id", &self.config.guild_id)
            .finish()
    }
}

pub type Context<'a> = poise::Context<'a, Data, AppError>;

fn build_engine(
    http: Arc<Http>,
    config: &Config,
    store: Arc<dyn AccountStore>,
    api: &ValorantClient,
) -> SyncEngine {
    let reconciler = RoleReconciler::new(
        Arc::new(SerenityRoles::new(http.clone())),
        Arc::new(TokioSleeper),
        config.role_mutation_delay,
    );
    let notifier = DiscordNotifier::new(http, config.alert_channel_id);

    SyncEngine::new(
        store,
        Arc::new(api.clone()),
        reconciler,
        Arc::new(notifier),
        config.guild_id,
    )
}

pub fn create_framework(
    config: Config,
    store: Arc<dyn AccountStore>,
    api: ValorantClient,
) -> poise::Framework<Data, AppError> {
    poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::register(),
                commands::adminregister(),
                commands::unregister(),
                commands::rank(),
                commands::history(),
                commands::sync(),
                commands::notify(),
                commands::deleterank(),
            ],
            on_error: |error| {
                Box::pin(async move {
                    handle_error(error).await;
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    config.guild_id,
                )
                .await?;

                let engine = Arc::new(build_engine(ctx.http.clone(), &config, store, &api));

                if let Err(e) = engine.ensure_rank_roles().await {
                    warn!(error = %e, "🏅 ⚠️ Could not prepare rank roles");
                }

                start_sync_loop(engine.clone(), config.sync_interval);

                info!(
                    bot_name = %ready.user.name,
                    guild_id = %config.guild_id,
                    "🎮 Bot is ready"
                );

                Ok(Data {
                    engine,
                    api,
                    config: Arc::new(config),
                })
            })
        })
        .build()
}

async fn handle_error(error: poise::FrameworkError<'_, Data, AppError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command_name = ctx.command().name.as_str();
            error!(
                error = ?error,
                command = command_name,
                user_id = %ctx.author().id,
                "🎮 ❌ Command execution failed"
            );
            let _ = ctx.say(user_message(&error)).await;
        }
        poise::FrameworkError::ArgumentParse { error, ctx, .. } => {
            warn!(
                error = %error,
                command = ctx.command().name.as_str(),
                "🎮 ⚠️ Invalid command argument"
            );
            let _ = ctx.say(format!("Invalid argument: {}", error)).await;
        }
        poise::FrameworkError::MissingBotPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            warn!(
                permissions = %missing_permissions,
                command = ctx.command().name.as_str(),
                "🎮 ⚠️ Bot missing permissions"
            );
            let _ = ctx
                .say(format!("Missing permissions: {}", missing_permissions))
                .await;
        }
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            if let Some(perms) = missing_permissions {
                warn!(
                    permissions = %perms,
                    user_id = %ctx.author().id,
                    command = ctx.command().name.as_str(),
                    "🎮 ⚠️ User missing permissions"
                );
                let _ = ctx
                    .say(format!("You need these permissions: {}", perms))
                    .await;
            }
        }
        other => {
            error!(error = ?other, "🎮 ❌ Unhandled framework error");
        }
    }
}

/// What the member sees when a command fails.
fn user_message(error: &AppError) -> String {
    use crate::valorant::ApiError;

    match error {
        AppError::Api(ApiError::RateLimited { .. }) => {
            "The ranking service is busy, please try again in a minute.".into()
        }
        AppError::Api(ApiError::Status(status)) if status.as_u16() == 404 => {
            "That account could not be found. Check the name, tag and region.".into()
        }
        AppError::Parse(_) => "The ranking service returned no usable rank for that account.".into(),
        other => format!("Error: {}", other),
    }
}

use poise::serenity_prelude::{ClientBuilder, GatewayIntents};
use tracing::{error, info};

mod clock;
mod config;
mod discord;
mod error;
mod logging;
mod rank;
mod store;
mod sync;
#[cfg(test)]
mod testing;
mod valorant;

use config::Config;
use error::AppError;
use valorant::ValorantClient;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "💥 Fatal error");
        eprintln!("fatal: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    logging::init()?;

    info!(guild_id = %config.guild_id, "🚀 Starting valsync");

    let store = store::open(&config).await?;

    let api = ValorantClient::new(
        config.api_base_url.clone(),
        config.api_timeout,
        config.api_rate_limit_per_minute,
        config.api_retry,
    )?;
    tokio::spawn(api.metrics().log_loop());

    let token = config.discord_token.clone();
    let intents = GatewayIntents::non_privileged() | GatewayIntents::GUILD_MEMBERS;
    let framework = discord::create_framework(config, store, api);

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    info!("🎮 Connecting to Discord");
    client.start().await?;

    Ok(())
}

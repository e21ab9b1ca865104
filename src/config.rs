use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use poise::serenity_prelude::{ChannelId, GuildId};

use crate::error::AppError;
use crate::valorant::RetryPolicy;

/// Where registrations are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Json { path: PathBuf },
    Sqlite { url: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub guild_id: GuildId,
    pub alert_channel_id: Option<ChannelId>,
    pub api_base_url: String,
    pub store_backend: StoreBackend,
    pub sync_interval: Duration,
    pub api_retry: RetryPolicy,
    pub api_timeout: Duration,
    pub api_rate_limit_per_minute: NonZeroU32,
    pub role_mutation_delay: Duration,
    pub match_history_timezone: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        const DEFAULT_API_BASE_URL: &str = "https://vaccie.pythonanywhere.com";
        const DEFAULT_ACCOUNTS_FILE: &str = "accounts.json";
        const DEFAULT_DATABASE_URL: &str = "sqlite:valsync.db";
        const DEFAULT_SYNC_INTERVAL_SECS: u64 = 120;
        const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
        const DEFAULT_API_RATE_LIMIT_PER_MINUTE: u32 = 30;
        const DEFAULT_ROLE_MUTATION_DELAY_MS: u64 = 100;
        const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AppError::Config(format!("{key} must be set")))
        };

        let discord_token = required("DISCORD_TOKEN")?;

        let guild_id = parse_id(&required("GUILD_ID")?, "GUILD_ID").map(GuildId::new)?;

        let alert_channel_id = lookup("ALERT_CHANNEL_ID")
            .filter(|v| !v.trim().is_empty())
            .map(|v| parse_id(&v, "ALERT_CHANNEL_ID").map(ChannelId::new))
            .transpose()?;

        let api_base_url =
            lookup("VALORANT_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let store_backend = match lookup("STORE_BACKEND").as_deref().unwrap_or("json") {
            "json" => StoreBackend::Json {
                path: lookup("ACCOUNTS_FILE")
                    .unwrap_or_else(|| DEFAULT_ACCOUNTS_FILE.into())
                    .into(),
            },
            "sqlite" => StoreBackend::Sqlite {
                url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            },
            other => {
                return Err(AppError::Config(format!(
                    "STORE_BACKEND must be json or sqlite, got {other}"
                )));
            }
        };

        let number = |key: &str, default: u64| parse_or(lookup(key), default);

        let sync_interval =
            Duration::from_secs(number("SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS).max(1));

        let api_retry = RetryPolicy {
            max_retries: parse_or(lookup("API_MAX_RETRIES"), RetryPolicy::DEFAULT_MAX_RETRIES),
            base_delay: lookup("API_BACKOFF_BASE_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(RetryPolicy::DEFAULT_BASE_DELAY),
        };

        let api_timeout =
            Duration::from_secs(number("API_TIMEOUT_SECS", DEFAULT_API_TIMEOUT_SECS).max(1));

        let api_rate_limit_per_minute = lookup("API_RATE_LIMIT_PER_MINUTE")
            .and_then(|v| v.parse().ok())
            .and_then(NonZeroU32::new)
            .unwrap_or_else(|| {
                NonZeroU32::new(DEFAULT_API_RATE_LIMIT_PER_MINUTE).unwrap_or(NonZeroU32::MIN)
            });

        let role_mutation_delay = Duration::from_millis(number(
            "ROLE_MUTATION_DELAY_MS",
            DEFAULT_ROLE_MUTATION_DELAY_MS,
        ));

        let match_history_timezone =
            lookup("MATCH_HISTORY_TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.into());

        Ok(Self {
            discord_token,
            guild_id,
            alert_channel_id,
            api_base_url,
            store_backend,
            sync_interval,
            api_retry,
            api_timeout,
            api_rate_limit_per_minute,
            role_mutation_delay,
            match_history_timezone,
        })
    }
}

fn parse_id(value: &str, key: &str) -> Result<u64, AppError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| AppError::Config(format!("{key} must be a Discord snowflake")))
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [("DISCORD_TOKEN", "token"), ("GUILD_ID", "1234")];

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = config(&REQUIRED).unwrap();

        assert_eq!(config.guild_id, GuildId::new(1234));
        assert_eq!(config.alert_channel_id, None);
        assert_eq!(config.api_base_url, "https://vaccie.pythonanywhere.com");
        assert_eq!(
            config.store_backend,
            StoreBackend::Json {
                path: "accounts.json".into()
            }
        );
        assert_eq!(config.sync_interval, Duration::from_secs(120));
        assert_eq!(config.api_retry, RetryPolicy::default());
        assert_eq!(config.api_timeout, Duration::from_secs(10));
        assert_eq!(config.api_rate_limit_per_minute.get(), 30);
        assert_eq!(config.role_mutation_delay, Duration::from_millis(100));
        assert_eq!(config.match_history_timezone, "Asia/Tokyo");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = config(&[("GUILD_ID", "1")]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn guild_id_must_be_a_snowflake() {
        assert!(config(&[("DISCORD_TOKEN", "t"), ("GUILD_ID", "abc")]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "t"), ("GUILD_ID", "0")]).is_err());
    }

    #[test]
    fn sqlite_backend_and_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("STORE_BACKEND", "sqlite"),
            ("DATABASE_URL", "sqlite:test.db"),
            ("ALERT_CHANNEL_ID", "55"),
            ("API_MAX_RETRIES", "5"),
            ("API_BACKOFF_BASE_MS", "250"),
            ("API_RATE_LIMIT_PER_MINUTE", "0"),
            ("SYNC_INTERVAL_SECS", "not a number"),
        ]);

        let config = config(&vars).unwrap();

        assert_eq!(
            config.store_backend,
            StoreBackend::Sqlite {
                url: "sqlite:test.db".into()
            }
        );
        assert_eq!(config.alert_channel_id, Some(ChannelId::new(55)));
        assert_eq!(config.api_retry.max_retries, 5);
        assert_eq!(config.api_retry.base_delay, Duration::from_millis(250));
        assert_eq!(config.api_rate_limit_per_minute.get(), 30);
        assert_eq!(config.sync_interval, Duration::from_secs(120));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STORE_BACKEND", "mongo"));

        assert!(matches!(config(&vars), Err(AppError::Config(_))));
    }

    #[test]
    fn zero_durations_are_raised_to_one_second() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("API_TIMEOUT_SECS", "0"));
        vars.push(("SYNC_INTERVAL_SECS", "0"));

        let config = config(&vars).unwrap();

        assert_eq!(config.api_timeout, Duration::from_secs(1));
        assert_eq!(config.sync_interval, Duration::from_secs(1));
    }
}

use thiserror::Error;

use crate::discord::roles::RoleApiError;
use crate::rank::ParseError;
use crate::store::StoreError;
use crate::valorant::ApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Valorant API error: {0}")]
    Api(#[from] ApiError),

    #[error("Could not read rank: {0}")]
    Parse(#[from] ParseError),

    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),

    #[error("Role error: {0}")]
    Role(#[from] RoleApiError),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No Valorant account is registered for this member")]
    NotRegistered,
}

impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::Discord(Box::new(err))
    }
}

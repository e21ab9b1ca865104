use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::region::{Platform, Region};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Still rate limited once every retry was spent.
    #[error("rate limited by the ranking API after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    #[error("ranking API answered with status {0}")]
    Status(StatusCode),

    #[error("ranking API request timed out")]
    Timeout,

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the failure came from upstream throttling rather than a hard error.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }
}

/// Identity of a registered account on the game service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValorantAccount {
    pub username: String,
    pub tag: String,
    pub region: Region,
    #[serde(default)]
    pub platform: Platform,
}

impl ValorantAccount {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.username, self.tag)
    }
}

/// Body of a successful `mmr` call, before normalization.
///
/// The API answers either with a sentence such as `"Gold 2, RR: 45 (+18)"` or
/// with a JSON object, depending on the deployment.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRankResponse {
    Text(String),
    Structured(serde_json::Value),
}

impl RawRankResponse {
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value @ serde_json::Value::Object(_)) => Self::Structured(value),
            Ok(serde_json::Value::String(text)) => Self::Text(text),
            _ => Self::Text(body),
        }
    }
}

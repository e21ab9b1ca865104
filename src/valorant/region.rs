use std::fmt;
use std::str::FromStr;

use poise::ChoiceParameter;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Shard routing values accepted by the ranking API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ChoiceParameter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[name = "AP - Asia Pacific"]
    Ap,
    #[name = "BR - Brazil"]
    Br,
    #[name = "EU - Europe"]
    Eu,
    #[name = "KR - Korea"]
    Kr,
    #[name = "LATAM - Latin America"]
    Latam,
    #[name = "NA - North America"]
    Na,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ap => "ap",
            Self::Br => "br",
            Self::Eu => "eu",
            Self::Kr => "kr",
            Self::Latam => "latam",
            Self::Na => "na",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Ap => "Asia Pacific",
            Self::Br => "Brazil",
            Self::Eu => "Europe",
            Self::Kr => "Korea",
            Self::Latam => "Latin America",
            Self::Na => "North America",
        }
    }
}

impl FromStr for Region {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ap" | "asia" => Ok(Self::Ap),
            "br" => Ok(Self::Br),
            "eu" => Ok(Self::Eu),
            "kr" => Ok(Self::Kr),
            "latam" => Ok(Self::Latam),
            "na" => Ok(Self::Na),
            _ => Err(AppError::InvalidRegion(s.to_string())),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Which client the account plays on. Console accounts use a separate ladder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ChoiceParameter, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    #[name = "PC"]
    Pc,
    #[name = "Console"]
    Console,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pc => "pc",
            Self::Console => "console",
        }
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pc" => Ok(Self::Pc),
            "console" => Ok(Self::Console),
            _ => Err(AppError::InvalidPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

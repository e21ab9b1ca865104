//! Competitive rank model and the role namespace derived from it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod change;
mod parser;

pub use change::{ChangeKind, RankChange, classify};
pub use parser::parse;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("the ranking API reported a failure: {0}")]
    UpstreamFailure(String),

    #[error("unrecognized rank response: {0}")]
    Unrecognized(String),

    #[error("unknown tier: {0}")]
    UnknownTier(String),

    #[error("{tier} requires a division between 1 and 3")]
    MissingDivision { tier: RankTier },

    #[error("invalid division {division} for {tier}")]
    InvalidDivision { tier: RankTier, division: String },
}

/// Ordered from lowest to highest; the derived `Ord` is the ladder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RankTier {
    Unranked,
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Ascendant,
    Immortal,
    Radiant,
}

impl RankTier {
    pub const ALL: [RankTier; 10] = [
        Self::Unranked,
        Self::Iron,
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
        Self::Ascendant,
        Self::Immortal,
        Self::Radiant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unranked => "Unranked",
            Self::Iron => "Iron",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
            Self::Ascendant => "Ascendant",
            Self::Immortal => "Immortal",
            Self::Radiant => "Radiant",
        }
    }

    /// Unranked and Radiant have a single, implicit division.
    pub fn has_divisions(&self) -> bool {
        !matches!(self, Self::Unranked | Self::Radiant)
    }

    /// Display color of the tier's roles.
    pub fn color(&self) -> u32 {
        match self {
            Self::Unranked => 0x808080,
            Self::Iron => 0x696969,
            Self::Bronze => 0xCD7F32,
            Self::Silver => 0xC0C0C0,
            Self::Gold => 0xFFD700,
            Self::Platinum => 0x66D1C7,
            Self::Diamond => 0x6F85FF,
            Self::Ascendant => 0xA6E05A,
            Self::Immortal => 0xC4005E,
            Self::Radiant => 0xFFE26A,
        }
    }

    /// Every role name of the rank-category namespace, lowest first.
    pub fn all_role_names() -> Vec<String> {
        Self::ALL
            .iter()
            .flat_map(|tier| {
                let divisions: &[u8] = if tier.has_divisions() { &[1, 2, 3] } else { &[1] };
                divisions
                    .iter()
                    .map(move |d| format!("{}{}", tier.as_str(), d))
            })
            .collect()
    }
}

impl FromStr for RankTier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            // the API spells it differently depending on the route
            "unranked" | "unrated" | "norank" => Ok(Self::Unranked),
            other => Self::ALL
                .into_iter()
                .find(|tier| tier.as_str().eq_ignore_ascii_case(other))
                .ok_or_else(|| ParseError::UnknownTier(trimmed.to_string())),
        }
    }
}

impl fmt::Display for RankTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Division(u8);

impl Division {
    pub fn new(value: u8) -> Option<Self> {
        (1..=3).contains(&value).then_some(Self(value))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Division {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("division out of range: {value}"))
    }
}

impl From<Division> for u8 {
    fn from(value: Division) -> Self {
        value.0
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A normalized rank: tier, division (absent for Unranked and Radiant) and RR score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub tier: RankTier,
    pub division: Option<Division>,
    #[serde(default)]
    pub score: u32,
}

impl Rank {
    /// Build a rank, validating the division against the tier.
    /// A division given for a division-less tier is dropped.
    pub fn new(tier: RankTier, division: Option<u8>, score: u32) -> Result<Self, ParseError> {
        let division = if tier.has_divisions() {
            let value = division.ok_or(ParseError::MissingDivision { tier })?;
            Some(Division::new(value).ok_or(ParseError::InvalidDivision {
                tier,
                division: value.to_string(),
            })?)
        } else {
            None
        };

        Ok(Self {
            tier,
            division,
            score,
        })
    }

    pub fn unranked() -> Self {
        Self {
            tier: RankTier::Unranked,
            division: None,
            score: 0,
        }
    }

    /// Same tier and division, ignoring the score.
    pub fn same_position(&self, other: &Rank) -> bool {
        self.tier == other.tier && self.division == other.division
    }

    /// Human readable label such as `Gold 3` or `Radiant`.
    pub fn label(&self) -> String {
        match self.division {
            Some(division) => format!("{} {}", self.tier, division),
            None => self.tier.to_string(),
        }
    }

    /// Name of the rank-category role for this rank, such as `Gold3` or `Radiant1`.
    pub fn role_name(&self) -> String {
        let division = self.division.map(|d| d.get()).unwrap_or(1);
        format!("{}{}", self.tier, division)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, RR: {}", self.label(), self.score)
    }
}

/// A role name recognized as part of the rank-category namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleName {
    pub tier: RankTier,
    pub division: Option<Division>,
}

impl RoleName {
    /// Recognize `Gold3`, `Radiant1`, `Unranked1`... Anything else is not a rank role.
    pub fn parse(name: &str) -> Option<Self> {
        let split = name.len().checked_sub(1)?;
        if !name.is_char_boundary(split) {
            return None;
        }
        let (tier_part, digit) = name.split_at(split);
        let digit: u8 = digit.parse().ok()?;
        let tier = RankTier::ALL
            .into_iter()
            .find(|tier| tier.as_str() == tier_part)?;

        if tier.has_divisions() {
            Some(Self {
                tier,
                division: Some(Division::new(digit)?),
            })
        } else {
            (digit == 1).then_some(Self {
                tier,
                division: None,
            })
        }
    }

    pub fn is_rank_role(name: &str) -> bool {
        Self::parse(name).is_some()
    }
}

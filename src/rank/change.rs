use std::cmp::Ordering;
use std::fmt;

use super::Rank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    RankUp,
    RankDown,
    DivisionUp,
    DivisionDown,
}

impl ChangeKind {
    pub fn is_promotion(&self) -> bool {
        matches!(self, Self::RankUp | Self::DivisionUp)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::RankUp => "🎉",
            Self::DivisionUp => "⬆️",
            Self::RankDown => "📉",
            Self::DivisionDown => "⬇️",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RankUp => "RANK_UP",
            Self::RankDown => "RANK_DOWN",
            Self::DivisionUp => "DIVISION_UP",
            Self::DivisionDown => "DIVISION_DOWN",
        })
    }
}

/// A notifiable move between two observed ranks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankChange {
    pub kind: ChangeKind,
    pub previous_label: String,
    pub new_label: String,
}

/// Compare the last recorded rank with the freshly observed one.
///
/// The first observation only seeds history, and score-only movement stays
/// silent: only tier or division moves produce a change.
pub fn classify(previous: Option<&Rank>, current: &Rank) -> Option<RankChange> {
    let previous = previous?;

    let kind = match current.tier.cmp(&previous.tier) {
        Ordering::Greater => ChangeKind::RankUp,
        Ordering::Less => ChangeKind::RankDown,
        Ordering::Equal => match current.division.cmp(&previous.division) {
            Ordering::Greater => ChangeKind::DivisionUp,
            Ordering::Less => ChangeKind::DivisionDown,
            Ordering::Equal => return None,
        },
    };

    Some(RankChange {
        kind,
        previous_label: previous.label(),
        new_label: current.label(),
    })
}

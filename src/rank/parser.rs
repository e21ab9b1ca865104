use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{ParseError, Rank, RankTier};
use crate::valorant::RawRankResponse;

/// Phrases the API puts in a 200 body when it could not resolve the account.
const FAILURE_PHRASES: [&str; 4] = [
    "could not be retrieved",
    "を取得できませんでした",
    "not found",
    "failed to",
];

const TIER_FIELDS: [&str; 4] = ["rank", "name", "currentTierPatched", "tier"];
const DIVISION_FIELDS: [&str; 2] = ["division", "level"];
const SCORE_FIELDS: [&str; 4] = ["rr", "rp", "ranking_in_tier", "rankingInTier"];

static TIER_DIVISION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z]+)(?:\s+(\d+))?").expect("tier pattern is valid")
});

static SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RR:?\s*(\d+)").expect("score pattern is valid"));

/// Normalize a raw `mmr` response into a [`Rank`].
pub fn parse(raw: &RawRankResponse) -> Result<Rank, ParseError> {
    match raw {
        RawRankResponse::Text(text) => parse_text(text),
        RawRankResponse::Structured(Value::Object(fields)) => parse_fields(fields),
        RawRankResponse::Structured(other) => Err(ParseError::Unrecognized(other.to_string())),
    }
}

/// `"Bronze 1, RR: 28 (-30)"`, `"Radiant, RR: 512"`, `"Unranked"`...
fn parse_text(text: &str) -> Result<Rank, ParseError> {
    let (tier, division) = tier_and_division(text)?;
    let score = SCORE
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0);

    Rank::new(tier, division, score)
}

fn tier_and_division(text: &str) -> Result<(RankTier, Option<u8>), ParseError> {
    let lowered = text.to_lowercase();
    if FAILURE_PHRASES.iter().any(|p| lowered.contains(p)) {
        return Err(ParseError::UpstreamFailure(text.trim().to_string()));
    }

    let captures = TIER_DIVISION
        .captures(text)
        .ok_or_else(|| ParseError::Unrecognized(text.trim().to_string()))?;

    let tier: RankTier = captures[1].parse()?;
    let division = captures
        .get(2)
        .map(|m| parse_division(tier, m.as_str()))
        .transpose()?;

    Ok((tier, division))
}

fn parse_fields(fields: &Map<String, Value>) -> Result<Rank, ParseError> {
    if let Some(Value::String(error)) = fields.get("error") {
        return Err(ParseError::UpstreamFailure(error.clone()));
    }

    let tier_text = first_string(fields, &TIER_FIELDS).unwrap_or_else(|| "Unranked".into());
    let score = first_number(fields, &SCORE_FIELDS).unwrap_or(0);

    // Some deployments send the patched name ("Gold 2") in the tier field.
    let (tier, embedded_division) = tier_and_division(&tier_text)?;

    let division = match first_string(fields, &DIVISION_FIELDS) {
        Some(text) if !text.is_empty() => Some(parse_division(tier, &text)?),
        _ => embedded_division,
    };

    Rank::new(tier, division, score)
}

fn parse_division(tier: RankTier, text: &str) -> Result<u8, ParseError> {
    text.trim()
        .parse()
        .map_err(|_| ParseError::InvalidDivision {
            tier,
            division: text.to_string(),
        })
}

fn first_string(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match fields.get(*name)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_number(fields: &Map<String, Value>, names: &[&str]) -> Option<u32> {
    names.iter().find_map(|name| match fields.get(*name)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rank::Division;

    fn text(s: &str) -> RawRankResponse {
        RawRankResponse::Text(s.to_string())
    }

    #[test]
    fn parses_text_with_division_and_score() {
        let rank = parse(&text("Bronze 2, RR: 45")).unwrap();

        assert_eq!(rank.tier, RankTier::Bronze);
        assert_eq!(rank.division, Division::new(2));
        assert_eq!(rank.score, 45);
        assert_eq!(rank.role_name(), "Bronze2");
    }

    #[test]
    fn ignores_trailing_decorations() {
        let rank = parse(&text("Immortal 1, RR: 2 (-21)  (🛡️ 2)")).unwrap();

        assert_eq!(rank.tier, RankTier::Immortal);
        assert_eq!(rank.division, Division::new(1));
        assert_eq!(rank.score, 2);
    }

    #[test]
    fn division_less_tiers_parse_without_error() {
        let radiant = parse(&text("Radiant, RR: 512")).unwrap();
        assert_eq!(radiant.tier, RankTier::Radiant);
        assert_eq!(radiant.division, None);
        assert_eq!(radiant.score, 512);

        let unranked = parse(&text("Unranked")).unwrap();
        assert_eq!(unranked, Rank::unranked());
    }

    #[test]
    fn failure_phrases_are_rejected() {
        let res = parse(&text(
            "Rank information could not be retrieved. Check the name and tag.",
        ));
        assert!(matches!(res, Err(ParseError::UpstreamFailure(_))));

        let res = parse(&text("ランク情報を取得できませんでした。"));
        assert!(matches!(res, Err(ParseError::UpstreamFailure(_))));
    }

    #[test]
    fn garbage_text_is_unrecognized() {
        assert!(matches!(
            parse(&text("<html>502</html>")),
            Err(ParseError::Unrecognized(_))
        ));
        assert!(matches!(
            parse(&text("Wood 2, RR: 10")),
            Err(ParseError::UnknownTier(_))
        ));
        assert!(matches!(
            parse(&text("Gold 7, RR: 10")),
            Err(ParseError::InvalidDivision { .. })
        ));
    }

    #[test]
    fn parses_structured_fields_with_aliases() {
        let raw = RawRankResponse::Structured(json!({"rank": "Gold", "division": 3, "rr": 80}));
        let rank = parse(&raw).unwrap();
        assert_eq!(rank.label(), "Gold 3");
        assert_eq!(rank.score, 80);

        let raw = RawRankResponse::Structured(json!({"name": "Silver", "level": "1", "rp": "12"}));
        let rank = parse(&raw).unwrap();
        assert_eq!(rank.label(), "Silver 1");
        assert_eq!(rank.score, 12);
    }

    #[test]
    fn structured_tier_may_embed_the_division() {
        let raw = RawRankResponse::Structured(json!({"currentTierPatched": "Diamond 2", "ranking_in_tier": 33}));
        let rank = parse(&raw).unwrap();

        assert_eq!(rank.role_name(), "Diamond2");
        assert_eq!(rank.score, 33);
    }

    #[test]
    fn structured_without_tier_defaults_to_unranked() {
        let raw = RawRankResponse::Structured(json!({"rr": 0}));
        assert_eq!(parse(&raw).unwrap(), Rank::unranked());
    }

    #[test]
    fn structured_error_field_is_a_failure() {
        let raw = RawRankResponse::Structured(json!({"error": "player not found"}));
        assert!(matches!(parse(&raw), Err(ParseError::UpstreamFailure(_))));

        let raw = RawRankResponse::Structured(json!([1, 2, 3]));
        assert!(matches!(parse(&raw), Err(ParseError::Unrecognized(_))));
    }
}

use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

use super::region::{Platform, Region};

/// A Match-v5 identifier such as `EUW1_7349112729`.
///
/// The prefix names the platform the game was played on, which is also what
/// decides the regional host to query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchId {
    raw: String,
    platform: Platform,
}

impl MatchId {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn region(&self) -> Region {
        self.platform.to_region()
    }
}

impl FromStr for MatchId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("malformed match id `{s}`"));

        let (prefix, number) = s.split_once('_').ok_or_else(invalid)?;
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let platform = prefix.parse::<Platform>().map_err(|_| invalid())?;

        Ok(Self {
            raw: format!("{}_{number}", prefix.to_uppercase()),
            platform,
        })
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_platform_prefix() {
        let id: MatchId = "EUW1_7349112729".parse().unwrap();

        assert_eq!(id.platform(), Platform::EUW1);
        assert_eq!(id.region(), Region::Europe);
        assert_eq!(id.as_str(), "EUW1_7349112729");
    }

    #[test]
    fn normalizes_prefix_case() {
        let id: MatchId = "na1_42".parse().unwrap();
        assert_eq!(id.to_string(), "NA1_42");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "EUW1", "EUW1_", "EUW1_12a", "XX9_123", "_123"] {
            assert!(
                matches!(raw.parse::<MatchId>(), Err(AppError::Validation(_))),
                "{raw} should be rejected"
            );
        }
    }
}

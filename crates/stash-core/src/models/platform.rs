//! Remote platform identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A remote service whose saved items are mirrored locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    Reddit,
}

impl Platform {
    /// Every supported platform, in display order
    pub const ALL: [Self; 2] = [Self::Twitter, Self::Reddit];

    /// Stable lowercase name, also used as the stored column value
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "twitter" | "x" => Ok(Self::Twitter),
            "reddit" => Ok(Self::Reddit),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown platform '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_aliases_and_case() {
        assert_eq!("Twitter".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!(" x ".parse::<Platform>().unwrap(), Platform::Twitter);
        assert_eq!("REDDIT".parse::<Platform>().unwrap(), Platform::Reddit);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!("mastodon".parse::<Platform>().is_err());
    }

    #[test]
    fn display_matches_stored_value() {
        for platform in Platform::ALL {
            assert_eq!(platform.to_string(), platform.as_str());
        }
    }
}

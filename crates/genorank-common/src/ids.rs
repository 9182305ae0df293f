//! Canonical gene identifier.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entrez-style numeric gene identifier. Parsed once at the data boundary;
/// every downstream stage works on this type only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneId(u64);

impl GeneId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for GeneId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for GeneId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(GeneId)
    }
}

impl fmt::Display for GeneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(" 84100 ".parse::<GeneId>().unwrap(), GeneId::new(84100));
    }

    #[test]
    fn test_parse_rejects_symbols_and_negatives() {
        assert!("ARL6".parse::<GeneId>().is_err());
        assert!("-5".parse::<GeneId>().is_err());
        assert!("".parse::<GeneId>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&GeneId::new(585)).unwrap();
        assert_eq!(json, "585");
    }
}

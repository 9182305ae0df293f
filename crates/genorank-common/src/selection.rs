//! Closed enumerations selecting which reference data a request runs against.
//!
//! Names are matched exactly (case sensitive), the same spelling used in the
//! reference file names.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenorankError;

fn unexpected(param: &str, value: &str, options: &[&str]) -> GenorankError {
    GenorankError::Configuration(format!(
        "Unexpected {param}: {value:?}, available options are: {}",
        options.join(", ")
    ))
}

// ── Network ─────────────────────────────────────────────────────────────────

/// Interaction network. `Custom` networks are only usable when the reference
/// store holds their node order plus the companion feature and GSC files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NetworkType {
    BioGrid,
    String,
    StringExp,
    GiantTn,
    Custom(std::string::String),
}

impl NetworkType {
    pub const BUILTIN: [NetworkType; 4] = [
        NetworkType::BioGrid,
        NetworkType::String,
        NetworkType::StringExp,
        NetworkType::GiantTn,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NetworkType::BioGrid   => "BioGRID",
            NetworkType::String    => "STRING",
            NetworkType::StringExp => "STRING-EXP",
            NetworkType::GiantTn   => "GIANT-TN",
            NetworkType::Custom(name) => name.as_str(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, NetworkType::Custom(_))
    }
}

impl FromStr for NetworkType {
    type Err = GenorankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BioGRID"    => Ok(NetworkType::BioGrid),
            "STRING"     => Ok(NetworkType::String),
            "STRING-EXP" => Ok(NetworkType::StringExp),
            "GIANT-TN"   => Ok(NetworkType::GiantTn),
            _ => {
                // Custom names end up in file names: keep them to one path component.
                let bad = s.is_empty()
                    || s.contains(['/', '\\'])
                    || s.contains("..")
                    || s.chars().any(char::is_whitespace);
                if bad {
                    Err(unexpected("network", s, &["BioGRID", "STRING", "STRING-EXP", "GIANT-TN"]))
                } else {
                    Ok(NetworkType::Custom(s.to_string()))
                }
            }
        }
    }
}

impl TryFrom<std::string::String> for NetworkType {
    type Error = GenorankError;

    fn try_from(value: std::string::String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NetworkType> for std::string::String {
    fn from(value: NetworkType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Feature type ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FeatureType {
    Embedding,
    Adjacency,
    Influence,
}

impl FeatureType {
    pub const ALL: [FeatureType; 3] = [FeatureType::Embedding, FeatureType::Adjacency, FeatureType::Influence];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureType::Embedding => "Embedding",
            FeatureType::Adjacency => "Adjacency",
            FeatureType::Influence => "Influence",
        }
    }
}

impl FromStr for FeatureType {
    type Err = GenorankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureType::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| unexpected("feature", s, &FeatureType::ALL.map(|f| f.as_str())))
    }
}

impl TryFrom<String> for FeatureType {
    type Error = GenorankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FeatureType> for String {
    fn from(value: FeatureType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Gene set collection ─────────────────────────────────────────────────────

/// Gene set collection, used both for negative sampling and as a similarity
/// target set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GscName {
    Go,
    DisGeNet,
}

impl GscName {
    pub const ALL: [GscName; 2] = [GscName::Go, GscName::DisGeNet];

    pub fn as_str(&self) -> &'static str {
        match self {
            GscName::Go       => "GO",
            GscName::DisGeNet => "DisGeNet",
        }
    }
}

impl FromStr for GscName {
    type Err = GenorankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GscName::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| unexpected("GSC", s, &GscName::ALL.map(|g| g.as_str())))
    }
}

impl TryFrom<String> for GscName {
    type Error = GenorankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GscName> for String {
    fn from(value: GscName) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for GscName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Identifier source type ──────────────────────────────────────────────────

/// Foreign identifier namespaces that can be converted to Entrez.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IdSourceType {
    Ensg,
    Symbol,
    Ensp,
    Enst,
}

impl IdSourceType {
    /// Lookup priority used when a request does not configure one.
    pub const DEFAULT_PRIORITY: [IdSourceType; 4] =
        [IdSourceType::Ensg, IdSourceType::Symbol, IdSourceType::Ensp, IdSourceType::Enst];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdSourceType::Ensg   => "ENSG",
            IdSourceType::Symbol => "Symbol",
            IdSourceType::Ensp   => "ENSP",
            IdSourceType::Enst   => "ENST",
        }
    }
}

impl FromStr for IdSourceType {
    type Err = GenorankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdSourceType::DEFAULT_PRIORITY
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| unexpected("ID type", s, &IdSourceType::DEFAULT_PRIORITY.map(|t| t.as_str())))
    }
}

impl TryFrom<String> for IdSourceType {
    type Error = GenorankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IdSourceType> for String {
    fn from(value: IdSourceType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for IdSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Selection ───────────────────────────────────────────────────────────────

/// The (network, feature type, GSC) combination a model is trained on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub net_type: NetworkType,
    pub features: FeatureType,
    pub gsc: GscName,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            net_type: NetworkType::BioGrid,
            features: FeatureType::Embedding,
            gsc: GscName::Go,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.net_type, self.features, self.gsc)
    }
}

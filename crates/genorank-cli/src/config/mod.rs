//! Configuration loading for genorank.
//! Reads genorank.toml from the current directory, the path in GENORANK_CONFIG,
//! or the path given with `--config`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use genorank_common::{FeatureType, GscName, NetworkType, PipelineSettings, Selection};
use serde::{Deserialize, Serialize};

use crate::input::Separator;

pub const DEFAULT_CONFIG_FILE: &str = "genorank.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the reference data files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    #[serde(default = "default_net_type")]
    pub net_type: NetworkType,
    #[serde(default = "default_features")]
    pub features: FeatureType,
    #[serde(default = "default_gsc")]
    pub gsc: GscName,
    #[serde(default)]
    pub separator: Separator,

    #[serde(default)]
    pub pipeline: PipelineSettings,
}

fn default_data_dir()   -> PathBuf { genorank_refdata::default_data_dir() }
fn default_output_dir() -> PathBuf { PathBuf::from("genorank-results") }
fn default_log_filter() -> String { "genorank=info,warn".to_string() }
fn default_net_type()   -> NetworkType { NetworkType::BioGrid }
fn default_features()   -> FeatureType { FeatureType::Embedding }
fn default_gsc()        -> GscName { GscName::Go }

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            log_filter: default_log_filter(),
            net_type: default_net_type(),
            features: default_features(),
            gsc: default_gsc(),
            separator: Separator::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl Config {
    /// Load from `path`, or from genorank.toml when no path is given.
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !path.exists() {
            if explicit {
                anyhow::bail!(
                    "Config file not found: {}\n\
                     Copy genorank.example.toml to genorank.toml and edit it.",
                    path.display()
                );
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Default (network, features, GSC) for runs that do not override it.
    pub fn selection(&self) -> Selection {
        Selection {
            net_type: self.net_type.clone(),
            features: self.features,
            gsc: self.gsc,
        }
    }
}

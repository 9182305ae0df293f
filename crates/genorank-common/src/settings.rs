//! Tunable pipeline parameters.
//!
//! Every field has a default so that a partial `[pipeline]` table (or none at
//! all) in `genorank.toml` yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GenorankError, Result};
use crate::selection::{GscName, IdSourceType, NetworkType};

/// Complete set of per-run pipeline parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Terms whose hypergeometric p-value falls below this are excluded
    /// from the negative pool.
    #[serde(default = "default_p_threshold")]
    pub enrichment_p_threshold: f64,

    /// Cross-validation is skipped below this many positives.
    #[serde(default = "default_min_num_pos")]
    pub min_num_pos: usize,

    #[serde(default = "default_num_folds")]
    pub num_folds: usize,

    /// Fold score reported when cross-validation is skipped.
    #[serde(default = "default_null_val")]
    pub null_val: f64,

    /// Seed for the fold shuffle. `None` draws from OS entropy.
    #[serde(default = "default_cv_seed")]
    pub cv_seed: Option<u64>,

    #[serde(default)]
    pub logreg: LogRegSettings,

    #[serde(default = "default_subgraph_top_n")]
    pub subgraph_top_n: usize,

    #[serde(default = "default_similarity_targets")]
    pub similarity_target_sets: Vec<GscName>,

    #[serde(default = "default_validation_networks")]
    pub validation_networks: Vec<NetworkType>,

    #[serde(default = "default_id_priority")]
    pub id_source_priority: Vec<IdSourceType>,
}

fn default_p_threshold() -> f64 { 0.05 }
fn default_min_num_pos() -> usize { 15 }
fn default_num_folds() -> usize { 3 }
fn default_null_val() -> f64 { -10.0 }
fn default_cv_seed() -> Option<u64> { Some(0) }
fn default_subgraph_top_n() -> usize { 50 }
fn default_similarity_targets() -> Vec<GscName> { GscName::ALL.to_vec() }
fn default_validation_networks() -> Vec<NetworkType> { NetworkType::BUILTIN.to_vec() }
fn default_id_priority() -> Vec<IdSourceType> { IdSourceType::DEFAULT_PRIORITY.to_vec() }

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            enrichment_p_threshold: default_p_threshold(),
            min_num_pos: default_min_num_pos(),
            num_folds: default_num_folds(),
            null_val: default_null_val(),
            cv_seed: default_cv_seed(),
            logreg: LogRegSettings::default(),
            subgraph_top_n: default_subgraph_top_n(),
            similarity_target_sets: default_similarity_targets(),
            validation_networks: default_validation_networks(),
            id_source_priority: default_id_priority(),
        }
    }
}

impl PipelineSettings {
    /// Reject values no run could use.
    pub fn validate(&self) -> Result<()> {
        if !(self.enrichment_p_threshold > 0.0 && self.enrichment_p_threshold <= 1.0) {
            return Err(GenorankError::Configuration(format!(
                "enrichment_p_threshold must be in (0, 1], got {}",
                self.enrichment_p_threshold
            )));
        }
        if self.num_folds < 2 {
            return Err(GenorankError::Configuration(format!(
                "num_folds must be at least 2, got {}",
                self.num_folds
            )));
        }
        if self.min_num_pos < self.num_folds {
            return Err(GenorankError::Configuration(format!(
                "min_num_pos ({}) must be at least num_folds ({})",
                self.min_num_pos, self.num_folds
            )));
        }
        if !self.null_val.is_finite() {
            return Err(GenorankError::Configuration("null_val must be finite".into()));
        }
        if self.subgraph_top_n == 0 {
            return Err(GenorankError::Configuration("subgraph_top_n must be positive".into()));
        }
        if self.id_source_priority.is_empty() {
            return Err(GenorankError::Configuration(
                "id_source_priority must list at least one ID type".into(),
            ));
        }
        self.logreg.validate()
    }
}

// ── Logistic regression ──────────────────────────────────────────────────────

/// L2-regularised logistic regression solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRegSettings {
    /// Inverse regularisation strength.
    #[serde(default = "default_c")]
    pub c: f64,

    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Convergence when the largest gradient component falls below this.
    #[serde(default = "default_tol")]
    pub tol: f64,

    /// L-BFGS correction pairs kept.
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_c() -> f64 { 1.0 }
fn default_max_iter() -> usize { 10_000 }
fn default_tol() -> f64 { 1e-4 }
fn default_history() -> usize { 10 }

impl Default for LogRegSettings {
    fn default() -> Self {
        Self {
            c: default_c(),
            max_iter: default_max_iter(),
            tol: default_tol(),
            history: default_history(),
        }
    }
}

impl LogRegSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(GenorankError::Configuration(format!("logreg.c must be positive, got {}", self.c)));
        }
        if self.max_iter == 0 || self.history == 0 {
            return Err(GenorankError::Configuration(
                "logreg.max_iter and logreg.history must be positive".into(),
            ));
        }
        if !(self.tol > 0.0) {
            return Err(GenorankError::Configuration(format!("logreg.tol must be positive, got {}", self.tol)));
        }
        Ok(())
    }
}

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenorankError {
    /// Unsupported network/feature/GSC combination, or an incomplete custom network.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Reference data file missing: {}", path.display())]
    ReferenceDataMissing { path: PathBuf },

    #[error("Invalid reference data: {0}")]
    ReferenceDataInvalid(String),

    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Positive and negative label sets must be disjoint.
    #[error("{0} genes are labelled both positive and negative")]
    LabelOverlap(usize),

    /// No input gene landed in the network, or every candidate negative was excluded.
    #[error("No {class} genes to train on in network {net}")]
    EmptyTrainingClass { net: String, class: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GenorankError {
    /// Errors that abort a request before or during reference data access.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            GenorankError::Configuration(_) | GenorankError::ReferenceDataMissing { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GenorankError>;

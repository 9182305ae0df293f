//! genorank-common: shared identifiers, reference-data values, settings and
//! errors used across all genorank crates.

pub mod error;
pub mod ids;
pub mod selection;
pub mod refdata;
pub mod settings;

// Re-export commonly used types
pub use error::{GenorankError, Result};
pub use ids::GeneId;
pub use refdata::{
    ConversionMap, CorrectionMatrix, Edge, FeatureMatrix, GeneAnnotations, GeneSet,
    GeneSetCollection, NetworkGenes, PretrainedWeights, TermWeights, UNMAPPED_PLACEHOLDER,
};
pub use selection::{FeatureType, GscName, IdSourceType, NetworkType, Selection};
pub use settings::{LogRegSettings, PipelineSettings};

//! genorank-ranker: gene prioritisation against a reference network.
//!
//! Stages, in data-flow order: identifier resolution, network membership
//! validation, negative sampling, model training with cross-validation,
//! term similarity, and subgraph extraction. `pipeline::run_pipeline`
//! chains them for one request.

pub mod reference_provider;
pub mod resolve;
pub mod validate;
pub mod negatives;
pub mod normalise;
pub mod logreg;
pub mod evaluate;
pub mod classify;
pub mod similarity;
pub mod subgraph;
pub mod pipeline;

pub use pipeline::{prepare_inputs, run_pipeline, InputStage, RankingJob, RankingResult, RunMetadata};
pub use reference_provider::{MockReferenceProvider, ReferenceDataProvider, ReferenceStoreAdapter};

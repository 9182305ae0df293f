//! Local-filesystem reference data for genorank.
//!
//! Reads the conversion maps, network node orders and edge lists, feature
//! matrices, gene set collections, pretrained weight libraries and
//! correction matrices from one directory. Each file is parsed at most once
//! per [`ReferenceStore`] and shared read-only afterwards.
//!
//! # Example
//!
//! ```rust,no_run
//! use genorank_common::{FeatureType, NetworkType};
//! use genorank_refdata::ReferenceStore;
//!
//! fn main() -> genorank_common::Result<()> {
//!     let store = ReferenceStore::open(genorank_refdata::default_data_dir())?;
//!     let features = store.feature_matrix(&NetworkType::BioGrid, FeatureType::Embedding)?;
//!     println!("{} genes x {} features", features.data().nrows(), features.n_features());
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

mod cache;
pub mod layout;
mod parse;
mod store;

pub use store::ReferenceStore;

/// `<platform data dir>/genorank`, or `./genorank-data` when the platform
/// has no data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("genorank"))
        .unwrap_or_else(|| PathBuf::from("genorank-data"))
}

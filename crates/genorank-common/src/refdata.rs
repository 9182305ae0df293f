//! Read-only reference data values shared across requests.
//! Each value checks its own structural invariants on construction, so a
//! loaded value can be trusted by every pipeline stage.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{GenorankError, Result};
use crate::ids::GeneId;
use crate::selection::{GscName, IdSourceType, NetworkType};

/// Placeholder for genes without a symbol or name.
pub const UNMAPPED_PLACEHOLDER: &str = "N/A";

// ── Network ───────────────────────────────────────────────────────────────────

/// Ordered gene universe of a network. The order defines row alignment with
/// the feature matrix and every per-gene vector derived from it.
#[derive(Debug, Clone)]
pub struct NetworkGenes {
    net_type: NetworkType,
    genes: Vec<GeneId>,
    index: HashMap<GeneId, usize>,
}

impl NetworkGenes {
    pub fn new(net_type: NetworkType, genes: Vec<GeneId>) -> Result<Self> {
        let mut index = HashMap::with_capacity(genes.len());
        for (pos, gene) in genes.iter().enumerate() {
            if index.insert(*gene, pos).is_some() {
                return Err(GenorankError::ReferenceDataInvalid(format!(
                    "gene {gene} appears twice in the {net_type} node order"
                )));
            }
        }
        Ok(Self { net_type, genes, index })
    }

    pub fn net_type(&self) -> &NetworkType {
        &self.net_type
    }

    pub fn genes(&self) -> &[GeneId] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn position(&self, gene: GeneId) -> Option<usize> {
        self.index.get(&gene).copied()
    }

    pub fn contains(&self, gene: GeneId) -> bool {
        self.index.contains_key(&gene)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: GeneId,
    pub target: GeneId,
    /// Unweighted networks (BioGRID) carry no weight column.
    pub weight: Option<f64>,
}

// ── Feature matrix ────────────────────────────────────────────────────────────

/// Dense per-gene features, paired with the gene order its rows follow.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    genes: Arc<NetworkGenes>,
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Fails unless there is exactly one row per network gene.
    pub fn new(genes: Arc<NetworkGenes>, data: Array2<f64>) -> Result<Self> {
        if data.nrows() != genes.len() {
            return Err(GenorankError::ReferenceDataInvalid(format!(
                "feature matrix for {} has {} rows but the node order has {} genes",
                genes.net_type(),
                data.nrows(),
                genes.len()
            )));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(GenorankError::ReferenceDataInvalid(format!(
                "feature matrix for {} contains non-finite values",
                genes.net_type()
            )));
        }
        Ok(Self { genes, data })
    }

    pub fn genes(&self) -> &Arc<NetworkGenes> {
        &self.genes
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }
}

// ── Gene set collection ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct GeneSet {
    pub id: String,
    pub name: String,
    pub genes: BTreeSet<GeneId>,
}

/// Curated good sets of a GSC restricted to one network, plus the background
/// universe for that network.
#[derive(Debug, Clone)]
pub struct GeneSetCollection {
    pub gsc: GscName,
    pub net_type: NetworkType,
    /// Sorted by term id.
    pub good_sets: Vec<GeneSet>,
    pub universe: BTreeSet<GeneId>,
}

// ── Pretrained weights ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TermWeights {
    pub name: String,
    pub weights: Vec<f64>,
    pub positive_genes: Vec<GeneId>,
}

/// One pretrained model weight vector per term of a target set.
#[derive(Debug, Clone)]
pub struct PretrainedWeights {
    pub target_set: GscName,
    terms: HashMap<String, TermWeights>,
}

impl PretrainedWeights {
    pub fn new(target_set: GscName, terms: HashMap<String, TermWeights>) -> Self {
        Self { target_set, terms }
    }

    pub fn get(&self, term_id: &str) -> Option<&TermWeights> {
        self.terms.get(term_id)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ── Correction matrix ─────────────────────────────────────────────────────────

/// Similarities between a fixed panel of historical queries (rows) and the
/// terms of a target set (columns, in `term_order`).
#[derive(Debug, Clone)]
pub struct CorrectionMatrix {
    term_order: Vec<String>,
    matrix: Array2<f64>,
}

impl CorrectionMatrix {
    pub fn new(term_order: Vec<String>, matrix: Array2<f64>) -> Result<Self> {
        if matrix.ncols() != term_order.len() {
            return Err(GenorankError::ReferenceDataInvalid(format!(
                "correction matrix has {} columns but the term order lists {} terms",
                matrix.ncols(),
                term_order.len()
            )));
        }
        Ok(Self { term_order, matrix })
    }

    pub fn term_order(&self) -> &[String] {
        &self.term_order
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }
}

// ── Identifier conversion and annotation ──────────────────────────────────────

/// Foreign identifier → one or more Entrez IDs. Keys are stored upper-cased;
/// multi-mappings are kept in file order.
#[derive(Debug, Clone)]
pub struct ConversionMap {
    pub source: IdSourceType,
    map: HashMap<String, Vec<GeneId>>,
}

impl ConversionMap {
    pub fn new(source: IdSourceType, entries: impl IntoIterator<Item = (String, Vec<GeneId>)>) -> Self {
        let mut map: HashMap<String, Vec<GeneId>> = HashMap::new();
        for (key, ids) in entries {
            let slot = map.entry(key.to_uppercase()).or_default();
            for id in ids {
                if !slot.contains(&id) {
                    slot.push(id);
                }
            }
        }
        Self { source, map }
    }

    /// `key` must already be upper-cased.
    pub fn get(&self, key: &str) -> Option<&[GeneId]> {
        self.map.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Entrez → symbols and full names.
#[derive(Debug, Clone, Default)]
pub struct GeneAnnotations {
    symbols: HashMap<GeneId, Vec<String>>,
    names: HashMap<GeneId, Vec<String>>,
}

impl GeneAnnotations {
    pub fn new(symbols: HashMap<GeneId, Vec<String>>, names: HashMap<GeneId, Vec<String>>) -> Self {
        Self { symbols, names }
    }

    /// All symbols joined with `/`, or the placeholder.
    pub fn symbol(&self, gene: GeneId) -> String {
        join_or_placeholder(self.symbols.get(&gene))
    }

    pub fn name(&self, gene: GeneId) -> String {
        join_or_placeholder(self.names.get(&gene))
    }
}

fn join_or_placeholder(values: Option<&Vec<String>>) -> String {
    match values {
        Some(v) if !v.is_empty() => v.join("/"),
        _ => UNMAPPED_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn genes(ids: &[u64]) -> Vec<GeneId> {
        ids.iter().copied().map(GeneId::new).collect()
    }

    #[test]
    fn test_network_genes_positions() {
        let net = NetworkGenes::new(NetworkType::BioGrid, genes(&[30, 10, 20])).unwrap();
        assert_eq!(net.position(GeneId::new(10)), Some(1));
        assert!(!net.contains(GeneId::new(40)));
    }

    #[test]
    fn test_network_genes_rejects_duplicates() {
        let err = NetworkGenes::new(NetworkType::BioGrid, genes(&[1, 2, 1])).unwrap_err();
        assert!(matches!(err, GenorankError::ReferenceDataInvalid(_)));
    }

    #[test]
    fn test_feature_matrix_row_alignment_enforced() {
        let net = Arc::new(NetworkGenes::new(NetworkType::BioGrid, genes(&[1, 2, 3])).unwrap());
        assert!(FeatureMatrix::new(net.clone(), array![[1.0], [2.0], [3.0]]).is_ok());
        assert!(FeatureMatrix::new(net.clone(), array![[1.0], [2.0]]).is_err());
        assert!(FeatureMatrix::new(net, array![[1.0], [f64::NAN], [3.0]]).is_err());
    }

    #[test]
    fn test_correction_matrix_column_check() {
        let order = vec!["GO:1".to_string(), "GO:2".to_string()];
        assert!(CorrectionMatrix::new(order.clone(), array![[0.1, 0.2]]).is_ok());
        assert!(CorrectionMatrix::new(order, array![[0.1, 0.2, 0.3]]).is_err());
    }

    #[test]
    fn test_conversion_keys_upper_cased_and_merged() {
        let map = ConversionMap::new(
            IdSourceType::Symbol,
            vec![
                ("arl6".to_string(), genes(&[84100])),
                ("ARL6".to_string(), genes(&[84100, 7])),
            ],
        );
        assert_eq!(map.get("ARL6"), Some(genes(&[84100, 7]).as_slice()));
        assert_eq!(map.get("arl6"), None);
    }

    #[test]
    fn test_annotation_placeholder_and_multimapping() {
        let mut symbols = HashMap::new();
        symbols.insert(GeneId::new(1), vec!["A".to_string(), "B".to_string()]);
        let ann = GeneAnnotations::new(symbols, HashMap::new());
        assert_eq!(ann.symbol(GeneId::new(1)), "A/B");
        assert_eq!(ann.symbol(GeneId::new(2)), UNMAPPED_PLACEHOLDER);
        assert_eq!(ann.name(GeneId::new(1)), UNMAPPED_PLACEHOLDER);
    }
}

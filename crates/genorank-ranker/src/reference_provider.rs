//! Trait for reference data access.
//!
//! The pipeline only sees typed getters; where the data lives (local
//! directory, remote object store, in-memory fixtures) is decided by the
//! implementation injected at construction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use genorank_common::refdata::{
    ConversionMap, CorrectionMatrix, Edge, FeatureMatrix, GeneAnnotations, GeneSet,
    GeneSetCollection, NetworkGenes, PretrainedWeights, TermWeights,
};
use genorank_common::{
    FeatureType, GeneId, GenorankError, GscName, IdSourceType, NetworkType, Result, Selection,
};
use genorank_refdata::ReferenceStore;
use ndarray::Array2;

/// Read-only reference data, keyed by (network, feature type, GSC).
///
/// Implementations must be shareable across concurrent requests and must
/// never hand out mutable access to loaded values.
pub trait ReferenceDataProvider: Send + Sync {
    /// Verify that a selection can be served before any computation starts.
    fn check_selection(&self, selection: &Selection, targets: &[GscName]) -> Result<()>;

    fn conversion_map(&self, source: IdSourceType) -> Result<Arc<ConversionMap>>;

    fn annotations(&self) -> Result<Arc<GeneAnnotations>>;

    fn network_genes(&self, net: &NetworkType) -> Result<Arc<NetworkGenes>>;

    fn edges(&self, net: &NetworkType) -> Result<Arc<Vec<Edge>>>;

    fn feature_matrix(&self, net: &NetworkType, features: FeatureType) -> Result<Arc<FeatureMatrix>>;

    fn gsc(&self, gsc: GscName, net: &NetworkType) -> Result<Arc<GeneSetCollection>>;

    fn pretrained_weights(
        &self,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<PretrainedWeights>>;

    /// Correction matrix for models trained on `gsc`, against `target` terms.
    fn correction_matrix(
        &self,
        gsc: GscName,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<CorrectionMatrix>>;
}

fn missing(what: String) -> GenorankError {
    GenorankError::ReferenceDataMissing { path: what.into() }
}

fn ids(raw: &[u64]) -> Vec<GeneId> {
    raw.iter().copied().map(GeneId::new).collect()
}

// ── Mock Implementation for Testing ─────────────────────────────────────────

/// In-memory provider built with chained `.with_*` calls.
///
/// Counts conversion-map lookups so tests can assert that numeric input
/// never touches the conversion tables.
#[derive(Default)]
pub struct MockReferenceProvider {
    conversions: HashMap<IdSourceType, Vec<(String, Vec<GeneId>)>>,
    symbols: HashMap<GeneId, Vec<String>>,
    names: HashMap<GeneId, Vec<String>>,
    networks: HashMap<NetworkType, Arc<NetworkGenes>>,
    raw_networks: HashMap<NetworkType, Vec<GeneId>>,
    edges: HashMap<NetworkType, Arc<Vec<Edge>>>,
    features: HashMap<(NetworkType, FeatureType), Array2<f64>>,
    collections: HashMap<(GscName, NetworkType), Arc<GeneSetCollection>>,
    pretrained: HashMap<(GscName, NetworkType, FeatureType), Arc<PretrainedWeights>>,
    corrections: HashMap<(GscName, GscName, NetworkType, FeatureType), (Vec<String>, Array2<f64>)>,
    conversion_lookups: AtomicUsize,
}

impl MockReferenceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversion table entry: `key` (any case) → Entrez IDs.
    pub fn with_conversion(mut self, source: IdSourceType, key: &str, entrez: &[u64]) -> Self {
        self.conversions
            .entry(source)
            .or_default()
            .push((key.to_string(), ids(entrez)));
        self
    }

    pub fn with_annotation(mut self, gene: u64, symbol: &str, name: &str) -> Self {
        self.symbols.insert(GeneId::new(gene), vec![symbol.to_string()]);
        self.names.insert(GeneId::new(gene), vec![name.to_string()]);
        self
    }

    /// Node order of `net`. Duplicate IDs surface as an error on access.
    pub fn with_network(mut self, net: NetworkType, genes: &[u64]) -> Self {
        let genes = ids(genes);
        match NetworkGenes::new(net.clone(), genes.clone()) {
            Ok(ng) => {
                self.networks.insert(net.clone(), Arc::new(ng));
            }
            Err(_) => {
                self.networks.remove(&net);
            }
        }
        self.raw_networks.insert(net, genes);
        self
    }

    pub fn with_edges(mut self, net: NetworkType, edges: &[(u64, u64)]) -> Self {
        let edges = edges
            .iter()
            .map(|&(a, b)| Edge { source: GeneId::new(a), target: GeneId::new(b), weight: None })
            .collect();
        self.edges.insert(net, Arc::new(edges));
        self
    }

    /// Rows must follow the node order given to `with_network`.
    pub fn with_features(mut self, net: NetworkType, features: FeatureType, data: Array2<f64>) -> Self {
        self.features.insert((net, features), data);
        self
    }

    /// Add a good set; every gene of the set also joins the universe.
    pub fn with_gene_set(mut self, gsc: GscName, net: NetworkType, term: &str, genes: &[u64]) -> Self {
        let key = (gsc, net.clone());
        let mut collection = self
            .collections
            .get(&key)
            .map(|c| c.as_ref().clone())
            .unwrap_or_else(|| GeneSetCollection {
                gsc,
                net_type: net,
                good_sets: Vec::new(),
                universe: Default::default(),
            });
        let set = GeneSet {
            id: term.to_string(),
            name: term.to_string(),
            genes: ids(genes).into_iter().collect(),
        };
        collection.universe.extend(set.genes.iter().copied());
        collection.good_sets.push(set);
        collection.good_sets.sort_by(|a, b| a.id.cmp(&b.id));
        self.collections.insert(key, Arc::new(collection));
        self
    }

    pub fn with_universe(mut self, gsc: GscName, net: NetworkType, genes: &[u64]) -> Self {
        let key = (gsc, net.clone());
        let mut collection = self
            .collections
            .get(&key)
            .map(|c| c.as_ref().clone())
            .unwrap_or_else(|| GeneSetCollection {
                gsc,
                net_type: net,
                good_sets: Vec::new(),
                universe: Default::default(),
            });
        collection.universe.extend(ids(genes));
        self.collections.insert(key, Arc::new(collection));
        self
    }

    pub fn with_pretrained(
        mut self,
        target: GscName,
        net: NetworkType,
        features: FeatureType,
        terms: &[(&str, Vec<f64>)],
    ) -> Self {
        let terms = terms
            .iter()
            .map(|(id, w)| {
                let tw = TermWeights { name: format!("{id} name"), weights: w.clone(), positive_genes: vec![] };
                (id.to_string(), tw)
            })
            .collect();
        self.pretrained
            .insert((target, net, features), Arc::new(PretrainedWeights::new(target, terms)));
        self
    }

    pub fn with_correction(
        mut self,
        gsc: GscName,
        target: GscName,
        net: NetworkType,
        features: FeatureType,
        order: &[&str],
        matrix: Array2<f64>,
    ) -> Self {
        let order = order.iter().map(|s| s.to_string()).collect();
        self.corrections.insert((gsc, target, net, features), (order, matrix));
        self
    }

    /// Number of `conversion_map` calls served so far.
    pub fn conversion_lookups(&self) -> usize {
        self.conversion_lookups.load(Ordering::SeqCst)
    }
}

impl ReferenceDataProvider for MockReferenceProvider {
    fn check_selection(&self, selection: &Selection, targets: &[GscName]) -> Result<()> {
        let net = &selection.net_type;
        if !self.raw_networks.contains_key(net) {
            return Err(GenorankError::Configuration(format!("Unknown network {net}")));
        }
        self.feature_matrix(net, selection.features)?;
        self.gsc(selection.gsc, net)?;
        for &target in targets {
            self.pretrained_weights(target, net, selection.features)?;
            self.correction_matrix(selection.gsc, target, net, selection.features)?;
        }
        Ok(())
    }

    fn conversion_map(&self, source: IdSourceType) -> Result<Arc<ConversionMap>> {
        self.conversion_lookups.fetch_add(1, Ordering::SeqCst);
        let entries = self.conversions.get(&source).cloned().unwrap_or_default();
        Ok(Arc::new(ConversionMap::new(source, entries)))
    }

    fn annotations(&self) -> Result<Arc<GeneAnnotations>> {
        Ok(Arc::new(GeneAnnotations::new(self.symbols.clone(), self.names.clone())))
    }

    fn network_genes(&self, net: &NetworkType) -> Result<Arc<NetworkGenes>> {
        if let Some(ng) = self.networks.get(net) {
            return Ok(Arc::clone(ng));
        }
        match self.raw_networks.get(net) {
            // Rebuild to surface the construction error.
            Some(raw) => NetworkGenes::new(net.clone(), raw.clone()).map(Arc::new),
            None => Err(missing(format!("mock network {net}"))),
        }
    }

    fn edges(&self, net: &NetworkType) -> Result<Arc<Vec<Edge>>> {
        Ok(self.edges.get(net).cloned().unwrap_or_default())
    }

    fn feature_matrix(&self, net: &NetworkType, features: FeatureType) -> Result<Arc<FeatureMatrix>> {
        let data = self
            .features
            .get(&(net.clone(), features))
            .ok_or_else(|| missing(format!("mock features {features}/{net}")))?;
        FeatureMatrix::new(self.network_genes(net)?, data.clone()).map(Arc::new)
    }

    fn gsc(&self, gsc: GscName, net: &NetworkType) -> Result<Arc<GeneSetCollection>> {
        self.collections
            .get(&(gsc, net.clone()))
            .cloned()
            .ok_or_else(|| missing(format!("mock GSC {gsc}/{net}")))
    }

    fn pretrained_weights(
        &self,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<PretrainedWeights>> {
        self.pretrained
            .get(&(target, net.clone(), features))
            .cloned()
            .ok_or_else(|| missing(format!("mock pretrained weights {target}/{net}/{features}")))
    }

    fn correction_matrix(
        &self,
        gsc: GscName,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<CorrectionMatrix>> {
        let (order, matrix) = self
            .corrections
            .get(&(gsc, target, net.clone(), features))
            .ok_or_else(|| missing(format!("mock correction matrix {gsc}/{target}/{net}/{features}")))?;
        CorrectionMatrix::new(order.clone(), matrix.clone()).map(Arc::new)
    }
}

// ── Adapter for ReferenceStore ──────────────────────────────────────────────

/// Serves reference data from a local `genorank_refdata::ReferenceStore`.
#[derive(Clone)]
pub struct ReferenceStoreAdapter {
    store: Arc<ReferenceStore>,
}

impl ReferenceStoreAdapter {
    pub fn new(store: Arc<ReferenceStore>) -> Self {
        Self { store }
    }

    /// Open a store on `data_dir` and wrap it.
    pub fn open(data_dir: impl Into<std::path::PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(ReferenceStore::open(data_dir)?)))
    }

    pub fn store(&self) -> &Arc<ReferenceStore> {
        &self.store
    }
}

impl ReferenceDataProvider for ReferenceStoreAdapter {
    fn check_selection(&self, selection: &Selection, targets: &[GscName]) -> Result<()> {
        self.store.check_selection(selection, targets)
    }

    fn conversion_map(&self, source: IdSourceType) -> Result<Arc<ConversionMap>> {
        self.store.conversion_map(source)
    }

    fn annotations(&self) -> Result<Arc<GeneAnnotations>> {
        self.store.annotations()
    }

    fn network_genes(&self, net: &NetworkType) -> Result<Arc<NetworkGenes>> {
        self.store.network_genes(net)
    }

    fn edges(&self, net: &NetworkType) -> Result<Arc<Vec<Edge>>> {
        self.store.edges(net)
    }

    fn feature_matrix(&self, net: &NetworkType, features: FeatureType) -> Result<Arc<FeatureMatrix>> {
        self.store.feature_matrix(net, features)
    }

    fn gsc(&self, gsc: GscName, net: &NetworkType) -> Result<Arc<GeneSetCollection>> {
        self.store.gsc(gsc, net)
    }

    fn pretrained_weights(
        &self,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<PretrainedWeights>> {
        self.store.pretrained_weights(target, net, features)
    }

    fn correction_matrix(
        &self,
        gsc: GscName,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<CorrectionMatrix>> {
        self.store.correction_matrix(gsc, target, net, features)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_mock_provider() {
        let provider = MockReferenceProvider::new()
            .with_conversion(IdSourceType::Symbol, "bbs1", &[582])
            .with_network(NetworkType::BioGrid, &[582, 583])
            .with_features(NetworkType::BioGrid, FeatureType::Embedding, array![[1.0], [2.0]])
            .with_gene_set(GscName::Go, NetworkType::BioGrid, "GO:1", &[582]);

        let map = provider.conversion_map(IdSourceType::Symbol).unwrap();
        assert_eq!(map.get("BBS1"), Some([GeneId::new(582)].as_slice()));
        assert_eq!(provider.conversion_lookups(), 1);

        let fm = provider.feature_matrix(&NetworkType::BioGrid, FeatureType::Embedding).unwrap();
        assert_eq!(fm.data().nrows(), 2);
        assert!(provider.feature_matrix(&NetworkType::String, FeatureType::Embedding).is_err());
        assert_eq!(provider.gsc(GscName::Go, &NetworkType::BioGrid).unwrap().universe.len(), 1);
    }

    #[test]
    fn test_mock_misaligned_features() {
        let provider = MockReferenceProvider::new()
            .with_network(NetworkType::BioGrid, &[1, 2, 3])
            .with_features(NetworkType::BioGrid, FeatureType::Embedding, array![[1.0], [2.0]]);
        let err = provider
            .feature_matrix(&NetworkType::BioGrid, FeatureType::Embedding)
            .unwrap_err();
        assert!(matches!(err, GenorankError::ReferenceDataInvalid(_)));
    }

    #[test]
    fn test_adapter_reads_store() {
        let ds = genorank_test_utils::SyntheticDataset::create().unwrap();
        let provider = ReferenceStoreAdapter::open(ds.path()).unwrap();
        let genes = provider.network_genes(&NetworkType::BioGrid).unwrap();
        assert_eq!(genes.len(), genorank_test_utils::SMALL_NET_GENES.len());
        provider
            .check_selection(&Selection::default(), &GscName::ALL)
            .unwrap();
    }
}

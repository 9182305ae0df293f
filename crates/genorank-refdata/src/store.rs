use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use genorank_common::refdata::{
    ConversionMap, CorrectionMatrix, Edge, FeatureMatrix, GeneAnnotations, GeneSetCollection,
    NetworkGenes, PretrainedWeights,
};
use genorank_common::{
    FeatureType, GenorankError, GscName, IdSourceType, NetworkType, Result, Selection,
};
use tracing::{debug, info};

use crate::cache::LoadOnce;
use crate::layout;
use crate::parse;

/// Reference data read from a local directory.
///
/// Every resource is parsed on first use and then shared as `Arc`. The store
/// is `Send + Sync`; concurrent requests can hold one `Arc<ReferenceStore>`.
pub struct ReferenceStore {
    data_dir: PathBuf,
    conversions: LoadOnce<IdSourceType, ConversionMap>,
    annotations: LoadOnce<(), GeneAnnotations>,
    networks: LoadOnce<NetworkType, NetworkGenes>,
    edges: LoadOnce<NetworkType, Vec<Edge>>,
    features: LoadOnce<(NetworkType, FeatureType), FeatureMatrix>,
    collections: LoadOnce<(GscName, NetworkType), GeneSetCollection>,
    pretrained: LoadOnce<(GscName, NetworkType, FeatureType), PretrainedWeights>,
    corrections: LoadOnce<(GscName, GscName, NetworkType, FeatureType), CorrectionMatrix>,
}

impl ReferenceStore {
    /// Open a store rooted at `data_dir`. Nothing is read yet.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        if !data_dir.is_dir() {
            return Err(GenorankError::ReferenceDataMissing { path: data_dir });
        }
        info!("Reference store at {:?}", data_dir);
        Ok(Self {
            data_dir,
            conversions: LoadOnce::new(),
            annotations: LoadOnce::new(),
            networks: LoadOnce::new(),
            edges: LoadOnce::new(),
            features: LoadOnce::new(),
            collections: LoadOnce::new(),
            pretrained: LoadOnce::new(),
            corrections: LoadOnce::new(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve `file` in the store, failing if it does not exist.
    fn existing(&self, file: &str) -> Result<PathBuf> {
        let path = self.data_dir.join(file);
        if path.is_file() {
            Ok(path)
        } else {
            Err(GenorankError::ReferenceDataMissing { path })
        }
    }

    fn parse_file<T>(&self, file: &str, parse: impl FnOnce(&Path) -> anyhow::Result<T>) -> Result<T> {
        let path = self.existing(file)?;
        debug!(file, "Loading reference file");
        parse(&path).map_err(|e| GenorankError::ReferenceDataInvalid(format!("{e:#}")))
    }

    // ── Selection checks ────────────────────────────────────────────────────

    /// Networks with a node order in this store, sorted by name.
    pub fn available_networks(&self) -> Result<Vec<NetworkType>> {
        let mut nets = Vec::new();
        let dir = std::fs::read_dir(&self.data_dir)
            .with_context(|| format!("Failed to list {:?}", self.data_dir))?;
        for entry in dir {
            let name = entry.context("Failed to read directory entry")?.file_name();
            let name = name.to_string_lossy();
            if let Some(net) = name.strip_prefix("NodeOrder_").and_then(|n| n.strip_suffix(".txt")) {
                if let Ok(net) = net.parse::<NetworkType>() {
                    nets.push(net);
                }
            }
        }
        nets.sort();
        Ok(nets)
    }

    /// Check that every file a run of `selection` needs is present, before
    /// any computation starts.
    ///
    /// A custom network without a node order, or with a missing feature or
    /// GSC companion file, is a configuration error. Any other absent file is
    /// `ReferenceDataMissing`.
    pub fn check_selection(&self, selection: &Selection, targets: &[GscName]) -> Result<()> {
        let net = &selection.net_type;
        if net.is_custom() {
            if !self.data_dir.join(layout::node_order_file(net)).is_file() {
                let known: Vec<String> = self.available_networks()?.iter().map(|n| n.to_string()).collect();
                return Err(GenorankError::Configuration(format!(
                    "Unknown network {net:?}: no {} in {:?} (available: {})",
                    layout::node_order_file(net),
                    self.data_dir,
                    known.join(", ")
                )));
            }
            for file in layout::custom_companion_files(selection) {
                if !self.data_dir.join(&file).is_file() {
                    return Err(GenorankError::Configuration(format!(
                        "Custom network {net} is missing companion file {file}"
                    )));
                }
            }
        }
        for file in layout::required_files(selection, targets) {
            self.existing(&file)?;
        }
        Ok(())
    }

    // ── Typed getters ───────────────────────────────────────────────────────

    pub fn conversion_map(&self, source: IdSourceType) -> Result<Arc<ConversionMap>> {
        self.conversions.get_or_try_load(&source, || {
            let entries = self.parse_file(&layout::conversion_file(source), parse::read_conversion)?;
            let map = ConversionMap::new(source, entries);
            info!(%source, ids = map.len(), "Loaded conversion map");
            Ok(map)
        })
    }

    pub fn annotations(&self) -> Result<Arc<GeneAnnotations>> {
        self.annotations.get_or_try_load(&(), || {
            let symbols = self.parse_file(&layout::symbol_file(), parse::read_annotation)?;
            let names = self.parse_file(&layout::name_file(), parse::read_annotation)?;
            Ok(GeneAnnotations::new(symbols, names))
        })
    }

    pub fn network_genes(&self, net: &NetworkType) -> Result<Arc<NetworkGenes>> {
        self.networks.get_or_try_load(net, || {
            let genes = self.parse_file(&layout::node_order_file(net), parse::read_id_lines)?;
            info!(net = %net, genes = genes.len(), "Loaded node order");
            NetworkGenes::new(net.clone(), genes)
        })
    }

    pub fn edges(&self, net: &NetworkType) -> Result<Arc<Vec<Edge>>> {
        self.edges.get_or_try_load(net, || {
            let edges = self.parse_file(&layout::edgelist_file(net), parse::read_edges)?;
            info!(net = %net, edges = edges.len(), "Loaded edge list");
            Ok(edges)
        })
    }

    /// Rows are checked against the node order here, at load time.
    pub fn feature_matrix(&self, net: &NetworkType, features: FeatureType) -> Result<Arc<FeatureMatrix>> {
        self.features.get_or_try_load(&(net.clone(), features), || {
            let genes = self.network_genes(net)?;
            let data = self.parse_file(&layout::features_file(features, net), parse::read_matrix_tsv)?;
            info!(net = %net, %features, dims = ?data.dim(), "Loaded feature matrix");
            FeatureMatrix::new(genes, data)
        })
    }

    pub fn gsc(&self, gsc: GscName, net: &NetworkType) -> Result<Arc<GeneSetCollection>> {
        self.collections.get_or_try_load(&(gsc, net.clone()), || {
            let good_sets = self.parse_file(&layout::good_sets_file(gsc, net), parse::read_good_sets)?;
            let universe = self
                .parse_file(&layout::universe_file(gsc, net), parse::read_id_lines)?
                .into_iter()
                .collect();
            info!(%gsc, net = %net, terms = good_sets.len(), "Loaded gene set collection");
            Ok(GeneSetCollection {
                gsc,
                net_type: net.clone(),
                good_sets,
                universe,
            })
        })
    }

    pub fn pretrained_weights(
        &self,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<PretrainedWeights>> {
        self.pretrained.get_or_try_load(&(target, net.clone(), features), || {
            let terms = self.parse_file(&layout::pretrained_file(target, net, features), parse::read_pretrained)?;
            info!(%target, net = %net, terms = terms.len(), "Loaded pretrained weights");
            Ok(PretrainedWeights::new(target, terms))
        })
    }

    pub fn correction_matrix(
        &self,
        gsc: GscName,
        target: GscName,
        net: &NetworkType,
        features: FeatureType,
    ) -> Result<Arc<CorrectionMatrix>> {
        self.corrections.get_or_try_load(&(gsc, target, net.clone(), features), || {
            let order = self.parse_file(&layout::correction_order_file(target, net), parse::read_term_order)?;
            let matrix = self.parse_file(
                &layout::correction_matrix_file(gsc, target, net, features),
                parse::read_matrix_tsv,
            )?;
            CorrectionMatrix::new(order, matrix)
        })
    }
}

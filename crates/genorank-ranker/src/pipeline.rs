//! End-to-end ranking run.
//!
//! Each stage takes the previous stage's value and returns a new one, so a
//! stage cannot run before its inputs exist. Reference data comes from a
//! shared `ReferenceDataProvider`; everything derived here belongs to the
//! single run and is dropped with its `RankingResult`.

use std::time::Instant;

use chrono::{DateTime, Utc};
use genorank_common::{PipelineSettings, Result, Selection};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::classify::{rank_genes, train_model, RankedGene, TrainedModel};
use crate::negatives::{sample_negatives, NegativeSample};
use crate::reference_provider::ReferenceDataProvider;
use crate::resolve::{resolve_identifiers, Resolution};
use crate::similarity::{score_similarity, SimilarityTable};
use crate::subgraph::{extract_subgraph, graph_view, GraphView, InducedSubgraph};
use crate::validate::{validate_membership, ValidationReport};

// ── Job ─────────────────────────────────────────────────────────────────────

/// One ranking request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingJob {
    /// Used as the job id when set.
    #[serde(default)]
    pub name: Option<String>,
    pub genes: Vec<String>,
    #[serde(default)]
    pub selection: Selection,
}

impl RankingJob {
    pub fn new(genes: Vec<String>, selection: Selection) -> Self {
        Self { name: None, genes, selection }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

// ── Stage values ────────────────────────────────────────────────────────────

/// Resolver and validator output. Runs once per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputStage {
    pub resolution: Resolution,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone)]
pub struct RankingResult {
    pub metadata: RunMetadata,
    pub selection: Selection,
    pub settings: PipelineSettings,
    pub inputs: InputStage,
    pub sample: NegativeSample,
    pub model: TrainedModel,
    pub ranked: Vec<RankedGene>,
    /// One table per configured target set, in configured order.
    pub similarity: Vec<SimilarityTable>,
    pub subgraph: InducedSubgraph,
    pub graph: GraphView,
}

/// Resolve the raw identifiers and report network membership.
pub fn prepare_inputs(
    provider: &dyn ReferenceDataProvider,
    genes: &[String],
    settings: &PipelineSettings,
) -> Result<InputStage> {
    let resolution = resolve_identifiers(provider, genes, &settings.id_source_priority)?;
    let validation = validate_membership(provider, &resolution, &settings.validation_networks)?;
    Ok(InputStage { resolution, validation })
}

/// Run every stage for `job`.
///
/// Settings and the selection are checked before any computation, so an
/// unsupported network or a missing reference file fails fast.
#[instrument(skip_all, fields(selection = %job.selection, genes = job.genes.len()))]
pub fn run_pipeline(
    provider: &dyn ReferenceDataProvider,
    job: &RankingJob,
    settings: &PipelineSettings,
) -> Result<RankingResult> {
    let started_at = Utc::now();
    let t0 = Instant::now();
    let job_id = job.name.clone().unwrap_or_else(|| Uuid::new_v4().to_string());

    settings.validate()?;
    provider.check_selection(&job.selection, &settings.similarity_target_sets)?;
    info!(job_id = %job_id, "Starting ranking pipeline");

    let selection = &job.selection;
    let net = &selection.net_type;

    // The chosen network always gets a validation column, custom ones included.
    let mut networks = settings.validation_networks.clone();
    if !networks.contains(net) {
        networks.push(net.clone());
    }
    let resolution = resolve_identifiers(provider, &job.genes, &settings.id_source_priority)?;
    let validation = validate_membership(provider, &resolution, &networks)?;
    let inputs = InputStage { resolution, validation };

    let network = provider.network_genes(net)?;
    let gsc = provider.gsc(selection.gsc, net)?;
    let sample = sample_negatives(
        &inputs.resolution.genes,
        &network,
        &gsc,
        settings.enrichment_p_threshold,
    )?;

    let features = provider.feature_matrix(net, selection.features)?;
    let model = train_model(&features, &sample, settings)?;
    let annotations = provider.annotations()?;
    let ranked = rank_genes(features.genes(), &model, &sample, &annotations);

    let mut similarity = Vec::with_capacity(settings.similarity_target_sets.len());
    for &target in &settings.similarity_target_sets {
        let library = provider.pretrained_weights(target, net, selection.features)?;
        let correction = provider.correction_matrix(selection.gsc, target, net, selection.features)?;
        similarity.push(score_similarity(model.weights.view(), &library, &correction)?);
    }

    let edges = provider.edges(net)?;
    let subgraph = extract_subgraph(&ranked, &edges, settings.subgraph_top_n);
    let graph = graph_view(&ranked, &subgraph);

    let duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        job_id = %job_id,
        ranked = ranked.len(),
        positives = sample.positives.len(),
        negatives = sample.negatives.len(),
        duration_ms,
        "Ranking pipeline complete"
    );

    Ok(RankingResult {
        metadata: RunMetadata { job_id, started_at, duration_ms },
        selection: selection.clone(),
        settings: settings.clone(),
        inputs,
        sample,
        model,
        ranked,
        similarity,
        subgraph,
        graph,
    })
}

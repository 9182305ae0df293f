//! Model training and the genome-wide ranked gene table.

use std::collections::BTreeSet;

use genorank_common::refdata::{FeatureMatrix, GeneAnnotations, NetworkGenes};
use genorank_common::{GeneId, GenorankError, PipelineSettings, Result};
use ndarray::{Array1, Array2, Axis};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::evaluate::{cross_validate, CrossValidation};
use crate::logreg::LogisticModel;
use crate::negatives::NegativeSample;
use crate::normalise::standardise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassLabel {
    #[serde(rename = "P")]
    Positive,
    #[serde(rename = "N")]
    Negative,
    #[serde(rename = "U")]
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Novelty {
    Known,
    Novel,
}

/// One row of the ranked gene table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGene {
    pub rank: usize,
    pub gene: GeneId,
    pub symbol: String,
    pub name: String,
    pub probability: f64,
    pub novelty: Novelty,
    pub class_label: ClassLabel,
}

/// Fitted model plus genome-wide predictions. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub weights: Array1<f64>,
    pub intercept: f64,
    /// One probability per network gene, in node order.
    pub probabilities: Array1<f64>,
    pub cv: CrossValidation,
    pub converged: bool,
}

/// Node positions of `genes`, ascending.
fn positions(network: &NetworkGenes, genes: &BTreeSet<GeneId>) -> Vec<usize> {
    let mut rows: Vec<usize> = genes.iter().filter_map(|g| network.position(*g)).collect();
    if rows.len() < genes.len() {
        warn!(missing = genes.len() - rows.len(), "Labelled genes missing from the node order were skipped");
    }
    rows.sort_unstable();
    rows
}

/// Standardise on every network gene, fit on the labelled rows, score all
/// rows, and cross-validate.
#[instrument(skip_all, fields(net = %features.genes().net_type()))]
pub fn train_model(features: &FeatureMatrix, sample: &NegativeSample, settings: &PipelineSettings) -> Result<TrainedModel> {
    let overlap = sample.positives.intersection(&sample.negatives).count();
    if overlap > 0 {
        return Err(GenorankError::LabelOverlap(overlap));
    }

    let network = features.genes();
    for (set, class) in [(&sample.positives, "positive"), (&sample.negatives, "negative")] {
        if set.is_empty() {
            return Err(GenorankError::EmptyTrainingClass {
                net: network.net_type().to_string(),
                class,
            });
        }
    }
    let scaled: Array2<f64> = standardise(features.data());

    let pos_rows = positions(network, &sample.positives);
    let neg_rows = positions(network, &sample.negatives);
    let rows: Vec<usize> = pos_rows.iter().chain(&neg_rows).copied().collect();
    let labels = Array1::from_iter(
        std::iter::repeat(1.0).take(pos_rows.len()).chain(std::iter::repeat(0.0).take(neg_rows.len())),
    );
    let x_train = scaled.select(Axis(0), &rows);

    let model = LogisticModel::fit(x_train.view(), labels.view(), &settings.logreg)?;
    let probabilities = model.predict_proba(scaled.view());
    if probabilities.iter().any(|p| !p.is_finite()) {
        return Err(GenorankError::NumericDegeneracy("non-finite predicted probability".into()));
    }
    let cv = cross_validate(x_train.view(), labels.view(), settings)?;

    info!(
        positives = pos_rows.len(),
        negatives = neg_rows.len(),
        iterations = model.iterations,
        cv = ?cv.fold_scores,
        "Trained model"
    );

    Ok(TrainedModel {
        weights: model.coef,
        intercept: model.intercept,
        probabilities,
        cv,
        converged: model.converged,
    })
}

/// Every network gene, sorted by probability descending. Ties keep node order.
pub fn rank_genes(
    network: &NetworkGenes,
    model: &TrainedModel,
    sample: &NegativeSample,
    annotations: &GeneAnnotations,
) -> Vec<RankedGene> {
    let probs = &model.probabilities;
    let mut order: Vec<usize> = (0..network.len()).collect();
    order.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));

    order
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let gene = network.genes()[row];
            let class_label = if sample.positives.contains(&gene) {
                ClassLabel::Positive
            } else if sample.negatives.contains(&gene) {
                ClassLabel::Negative
            } else {
                ClassLabel::Neutral
            };
            RankedGene {
                rank: i + 1,
                gene,
                symbol: annotations.symbol(gene),
                name: annotations.name(gene),
                probability: probs[row],
                novelty: if class_label == ClassLabel::Positive { Novelty::Known } else { Novelty::Novel },
                class_label,
            }
        })
        .collect()
}

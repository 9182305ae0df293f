//! Cross-validated evaluation, scored as `log2(average_precision / prior)`.

use genorank_common::{GenorankError, PipelineSettings, Result};
use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::logreg::LogisticModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossValidation {
    /// One value per fold; all equal to the null value when skipped.
    pub fold_scores: Vec<f64>,
    pub evaluated: bool,
}

impl CrossValidation {
    fn skipped(settings: &PipelineSettings) -> Self {
        Self {
            fold_scores: vec![settings.null_val; settings.num_folds],
            evaluated: false,
        }
    }
}

/// Assign each sample a fold in `0..k`, keeping class proportions.
///
/// Samples are split per class: the class sizes are dealt round-robin over
/// the folds in sorted label order, then each class's fold labels are
/// shuffled.
pub fn stratified_folds(labels: &[bool], k: usize, rng: &mut StdRng) -> Vec<usize> {
    let n_neg = labels.iter().filter(|&&l| !l).count();
    // Sorted labels: all negatives, then positives. Count per fold i the
    // classes found at positions i, i + k, i + 2k, ...
    let mut allocation = vec![[0usize; 2]; k];
    for pos in 0..labels.len() {
        let class = usize::from(pos >= n_neg);
        allocation[pos % k][class] += 1;
    }

    let mut folds = vec![0usize; labels.len()];
    for (class, want) in [(0usize, false), (1, true)] {
        let mut class_folds: Vec<usize> = (0..k)
            .flat_map(|f| std::iter::repeat(f).take(allocation[f][class]))
            .collect();
        class_folds.shuffle(rng);
        let members = labels.iter().enumerate().filter(|(_, &l)| l == want).map(|(i, _)| i);
        for (sample, fold) in members.zip(class_folds) {
            folds[sample] = fold;
        }
    }
    folds
}

/// Area under the precision-recall curve as a step function over the
/// distinct score thresholds.
pub fn average_precision(labels: &[bool], scores: &[f64]) -> Result<f64> {
    let total_pos = labels.iter().filter(|&&l| l).count();
    if total_pos == 0 {
        return Err(GenorankError::NumericDegeneracy(
            "average precision is undefined without positives".into(),
        ));
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp) = (0usize, 0usize);
    let mut prev_recall = 0.0;
    let mut ap = 0.0;
    for (i, &idx) in order.iter().enumerate() {
        if labels[idx] {
            tp += 1;
        } else {
            fp += 1;
        }
        let group_ends = order.get(i + 1).map_or(true, |&next| scores[next] != scores[idx]);
        if group_ends {
            let precision = tp as f64 / (tp + fp) as f64;
            let recall = tp as f64 / total_pos as f64;
            ap += (recall - prev_recall) * precision;
            prev_recall = recall;
        }
    }
    Ok(ap)
}

/// Stratified k-fold evaluation on the labelled rows.
///
/// Skipped (every fold gets `null_val`) when there are fewer positives than
/// `min_num_pos`, or too few negatives to put one in every fold.
#[instrument(skip_all, fields(rows = x.nrows()))]
pub fn cross_validate(x: ArrayView2<f64>, y: ArrayView1<f64>, settings: &PipelineSettings) -> Result<CrossValidation> {
    let labels: Vec<bool> = y.iter().map(|&v| v > 0.5).collect();
    let n_pos = labels.iter().filter(|&&l| l).count();
    let n_neg = labels.len() - n_pos;

    if n_pos < settings.min_num_pos {
        info!(positives = n_pos, floor = settings.min_num_pos, "Too few positives, cross-validation skipped");
        return Ok(CrossValidation::skipped(settings));
    }
    if n_neg < settings.num_folds {
        warn!(negatives = n_neg, folds = settings.num_folds, "Too few negatives, cross-validation skipped");
        return Ok(CrossValidation::skipped(settings));
    }

    let mut rng = match settings.cv_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let folds = stratified_folds(&labels, settings.num_folds, &mut rng);

    let mut fold_scores = Vec::with_capacity(settings.num_folds);
    for fold in 0..settings.num_folds {
        let (test, train): (Vec<usize>, Vec<usize>) = (0..labels.len()).partition(|&i| folds[i] == fold);

        let model = LogisticModel::fit(
            x.select(Axis(0), &train).view(),
            y.select(Axis(0), &train).view(),
            &settings.logreg,
        )?;
        let probs: Array1<f64> = model.predict_proba(x.select(Axis(0), &test).view());
        let test_labels: Vec<bool> = test.iter().map(|&i| labels[i]).collect();

        let ap = average_precision(&test_labels, &probs.to_vec())?;
        let prior = test_labels.iter().filter(|&&l| l).count() as f64 / test_labels.len() as f64;
        let score = (ap / prior).log2();
        info!(fold, test_rows = test.len(), average_precision = ap, score, "Cross-validation fold");
        fold_scores.push(score);
    }

    Ok(CrossValidation { fold_scores, evaluated: true })
}

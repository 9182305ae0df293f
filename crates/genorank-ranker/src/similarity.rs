//! Term similarity against a pretrained model library, bias-corrected with
//! a reference correction matrix.
//!
//! Raw cosine similarities are appended as a new row to the correction
//! matrix. Two z-scores are read off that row: against the row's own mean
//! and deviation (query axis), and against each term's column over the
//! augmented matrix (term axis). Both are clipped at zero and combined as
//! their Euclidean norm.

use genorank_common::refdata::{CorrectionMatrix, PretrainedWeights};
use genorank_common::{GenorankError, GscName, Result};
use ndarray::{concatenate, Array1, ArrayView1, Axis};
use serde::Serialize;
use tracing::{info, instrument};

use crate::normalise::{clipped_z, mean_std};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarTerm {
    pub rank: usize,
    pub term_id: String,
    pub name: String,
    pub cosine: f64,
    pub z_query: f64,
    pub z_term: f64,
    /// `sqrt(z_query^2 + z_term^2)`, the ranking key.
    pub similarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityTable {
    pub target: GscName,
    pub rows: Vec<SimilarTerm>,
}

/// Cosine similarity; 0 when either vector has zero norm.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let na = a.dot(&a).sqrt();
    let nb = b.dot(&b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (na * nb)
}

#[instrument(skip_all, fields(target = %library.target_set, terms = correction.term_order().len()))]
pub fn score_similarity(
    weights: ArrayView1<f64>,
    library: &PretrainedWeights,
    correction: &CorrectionMatrix,
) -> Result<SimilarityTable> {
    let order = correction.term_order();
    let mut cosines = Array1::<f64>::zeros(order.len());
    let mut names = Vec::with_capacity(order.len());
    for (j, term) in order.iter().enumerate() {
        let entry = library.get(term).ok_or_else(|| {
            GenorankError::ReferenceDataInvalid(format!(
                "term {term} is in the {} correction order but has no pretrained weights",
                library.target_set
            ))
        })?;
        if entry.weights.len() != weights.len() {
            return Err(GenorankError::ReferenceDataInvalid(format!(
                "term {term} has {} pretrained weights but the model has {}",
                entry.weights.len(),
                weights.len()
            )));
        }
        cosines[j] = cosine_similarity(ArrayView1::from(entry.weights.as_slice()), weights);
        names.push(entry.name.clone());
    }

    let augmented = concatenate(
        Axis(0),
        &[correction.matrix().view(), cosines.view().insert_axis(Axis(0))],
    )
    .map_err(|e| GenorankError::ReferenceDataInvalid(format!("correction matrix shape: {e}")))?;

    let (row_mean, row_std) = mean_std(cosines.view());
    let mut rows: Vec<SimilarTerm> = order
        .iter()
        .zip(names)
        .enumerate()
        .map(|(j, (term, name))| {
            let x = cosines[j];
            let z_query = clipped_z(x, row_mean, row_std);
            let (col_mean, col_std) = mean_std(augmented.column(j));
            let z_term = clipped_z(x, col_mean, col_std);
            SimilarTerm {
                rank: 0,
                term_id: term.clone(),
                name,
                cosine: x,
                z_query,
                z_term,
                similarity: (z_query * z_query + z_term * z_term).sqrt(),
            }
        })
        .collect();

    rows.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    info!(
        top = rows.first().map(|r| r.term_id.as_str()).unwrap_or("-"),
        "Scored term similarity"
    );
    Ok(SimilarityTable {
        target: library.target_set,
        rows,
    })
}

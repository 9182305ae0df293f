//! Negative gene selection by enrichment exclusion.
//!
//! Any good set enriched for the positives (hypergeometric survival p-value
//! below the threshold) is treated as contaminated: all of its genes are
//! barred from the negative pool. Negatives are the universe minus the
//! positives and every barred gene. No randomness is involved.

use std::collections::BTreeSet;

use genorank_common::refdata::{GeneSetCollection, NetworkGenes};
use genorank_common::{GeneId, GenorankError, Result};
use serde::Serialize;
use statrs::distribution::{DiscreteCDF, Hypergeometric};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedTerm {
    pub id: String,
    pub name: String,
    pub overlap: usize,
    pub size: usize,
    pub p_value: f64,
}

/// Labelled gene sets for one (network, GSC) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegativeSample {
    /// Resolved input genes present in the network.
    pub positives: BTreeSet<GeneId>,
    pub negatives: BTreeSet<GeneId>,
    /// Union of the members of every enriched term.
    pub excluded: BTreeSet<GeneId>,
    pub enriched_terms: Vec<EnrichedTerm>,
    /// Resolved input genes absent from the network, in input order.
    pub not_in_network: Vec<GeneId>,
}

/// P(X >= k) for X ~ Hypergeometric(population, successes, draws).
pub fn enrichment_p_value(k: u64, population: u64, successes: u64, draws: u64) -> Result<f64> {
    if k == 0 {
        return Ok(1.0);
    }
    let dist = Hypergeometric::new(population, successes, draws).map_err(|e| {
        GenorankError::NumericDegeneracy(format!(
            "hypergeometric(M={population}, n={successes}, N={draws}): {e}"
        ))
    })?;
    // sf(x) is P(X > x); shift by one to include k itself.
    Ok(dist.sf(k - 1))
}

#[instrument(skip_all, fields(net = %network.net_type(), gsc = %gsc.gsc))]
pub fn sample_negatives(
    genes: &[GeneId],
    network: &NetworkGenes,
    gsc: &GeneSetCollection,
    p_threshold: f64,
) -> Result<NegativeSample> {
    let mut positives = BTreeSet::new();
    let mut not_in_network = Vec::new();
    for &g in genes {
        if network.contains(g) {
            positives.insert(g);
        } else if !not_in_network.contains(&g) {
            not_in_network.push(g);
        }
    }

    let population = gsc.universe.len() as u64;
    // Positives outside the universe cannot be drawn from it.
    let draws = positives.len().min(gsc.universe.len()) as u64;

    let mut excluded = BTreeSet::new();
    let mut enriched_terms = Vec::new();
    for term in &gsc.good_sets {
        let overlap = term.genes.intersection(&positives).count();
        let size = term.genes.len();
        if size as u64 > population {
            return Err(GenorankError::ReferenceDataInvalid(format!(
                "term {} has {} genes but the {} universe has only {}",
                term.id, size, gsc.gsc, population
            )));
        }
        let p_value = enrichment_p_value(overlap as u64, population, size as u64, draws)?;
        if p_value < p_threshold {
            debug!(term = %term.id, overlap, size, p_value, "Enriched term excluded from negatives");
            excluded.extend(term.genes.iter().copied());
            enriched_terms.push(EnrichedTerm {
                id: term.id.clone(),
                name: term.name.clone(),
                overlap,
                size,
                p_value,
            });
        }
    }

    let mut negatives = BTreeSet::new();
    let mut dropped = 0usize;
    for &g in &gsc.universe {
        if positives.contains(&g) || excluded.contains(&g) {
            continue;
        }
        if network.contains(g) {
            negatives.insert(g);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!(dropped, "Universe genes missing from the node order were left out of the negatives");
    }

    info!(
        positives = positives.len(),
        negatives = negatives.len(),
        enriched = enriched_terms.len(),
        not_in_network = not_in_network.len(),
        "Sampled negatives"
    );

    Ok(NegativeSample {
        positives,
        negatives,
        excluded,
        enriched_terms,
        not_in_network,
    })
}

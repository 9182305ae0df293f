//! Induced subnetwork among the top-ranked genes.

use std::collections::{BTreeSet, HashMap};

use genorank_common::refdata::Edge;
use genorank_common::{GeneId, UNMAPPED_PLACEHOLDER};
use serde::Serialize;
use tracing::{info, instrument};

use crate::classify::{ClassLabel, Novelty, RankedGene};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolEdge {
    pub source: String,
    pub target: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InducedSubgraph {
    /// The top-N genes, in rank order.
    pub top_genes: Vec<GeneId>,
    pub edges: Vec<Edge>,
    /// Top genes touched by no kept edge, in rank order.
    pub isolated: Vec<GeneId>,
    pub symbol_edges: Vec<SymbolEdge>,
    pub isolated_symbols: Vec<String>,
}

/// Keep the edges whose two endpoints are both among the first `top_n` rows
/// of `ranked`.
#[instrument(skip_all, fields(top_n, edges = edges.len()))]
pub fn extract_subgraph(ranked: &[RankedGene], edges: &[Edge], top_n: usize) -> InducedSubgraph {
    let top = &ranked[..top_n.min(ranked.len())];
    let symbols: HashMap<GeneId, &str> = top.iter().map(|r| (r.gene, r.symbol.as_str())).collect();
    let symbol_of = |g: &GeneId| symbols.get(g).copied().unwrap_or(UNMAPPED_PLACEHOLDER).to_string();

    let kept: Vec<Edge> = edges
        .iter()
        .filter(|e| symbols.contains_key(&e.source) && symbols.contains_key(&e.target))
        .copied()
        .collect();

    let touched: BTreeSet<GeneId> = kept.iter().flat_map(|e| [e.source, e.target]).collect();
    let top_genes: Vec<GeneId> = top.iter().map(|r| r.gene).collect();
    let isolated: Vec<GeneId> = top_genes.iter().copied().filter(|g| !touched.contains(g)).collect();

    let symbol_edges = kept
        .iter()
        .map(|e| SymbolEdge {
            source: symbol_of(&e.source),
            target: symbol_of(&e.target),
            weight: e.weight,
        })
        .collect();
    let isolated_symbols = isolated.iter().map(symbol_of).collect();

    info!(kept = kept.len(), isolated = isolated.len(), "Extracted induced subgraph");
    InducedSubgraph {
        top_genes,
        edges: kept,
        isolated,
        symbol_edges,
        isolated_symbols,
    }
}

// ── Graph view ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: GeneId,
    pub symbol: String,
    pub name: String,
    pub rank: usize,
    pub probability: f64,
    pub class_label: ClassLabel,
    pub novelty: Novelty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphLink {
    pub source: GeneId,
    pub target: GeneId,
    pub weight: f64,
}

/// Nodes and links for rendering. Unweighted edges get weight 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

pub fn graph_view(ranked: &[RankedGene], subgraph: &InducedSubgraph) -> GraphView {
    let nodes = ranked
        .iter()
        .take(subgraph.top_genes.len())
        .map(|r| GraphNode {
            id: r.gene,
            symbol: r.symbol.clone(),
            name: r.name.clone(),
            rank: r.rank,
            probability: r.probability,
            class_label: r.class_label,
            novelty: r.novelty,
        })
        .collect();
    let links = subgraph
        .edges
        .iter()
        .map(|e| GraphLink {
            source: e.source,
            target: e.target,
            weight: e.weight.unwrap_or(1.0),
        })
        .collect();
    GraphView { nodes, links }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(rank: usize, gene: u64, symbol: &str) -> RankedGene {
        RankedGene {
            rank,
            gene: GeneId::new(gene),
            symbol: symbol.to_string(),
            name: UNMAPPED_PLACEHOLDER.to_string(),
            probability: 1.0 / rank as f64,
            novelty: Novelty::Novel,
            class_label: ClassLabel::Neutral,
        }
    }

    fn edge(a: u64, b: u64, w: Option<f64>) -> Edge {
        Edge { source: GeneId::new(a), target: GeneId::new(b), weight: w }
    }

    #[test]
    fn test_induced_edges_and_isolated() {
        let ranked = vec![row(1, 10, "A"), row(2, 20, "B"), row(3, 30, "C"), row(4, 40, "D")];
        let edges = vec![edge(10, 20, None), edge(20, 40, None), edge(30, 99, None)];
        let sg = extract_subgraph(&ranked, &edges, 3);

        assert_eq!(sg.edges, vec![edge(10, 20, None)]);
        assert_eq!(sg.isolated, vec![GeneId::new(30)]);
        assert_eq!(sg.isolated_symbols, vec!["C".to_string()]);
        assert_eq!(sg.symbol_edges[0].source, "A");

        let top: BTreeSet<GeneId> = sg.top_genes.iter().copied().collect();
        for e in &sg.edges {
            assert!(top.contains(&e.source) && top.contains(&e.target));
            assert!(!sg.isolated.contains(&e.source) && !sg.isolated.contains(&e.target));
        }
    }

    #[test]
    fn test_top_n_larger_than_table() {
        let ranked = vec![row(1, 10, "A"), row(2, 20, "B")];
        let sg = extract_subgraph(&ranked, &[edge(10, 20, Some(0.4))], 50);
        assert_eq!(sg.top_genes.len(), 2);
        assert!(sg.isolated.is_empty());
    }

    #[test]
    fn test_graph_view_default_weight() {
        let ranked = vec![row(1, 10, "A"), row(2, 20, "B"), row(3, 30, "C")];
        let sg = extract_subgraph(&ranked, &[edge(10, 20, None), edge(20, 30, Some(0.25))], 3);
        let view = graph_view(&ranked, &sg);
        assert_eq!(view.nodes.len(), 3);
        assert_eq!(view.links[0].weight, 1.0);
        assert_eq!(view.links[1].weight, 0.25);
    }
}

//! Parsers for the individual reference file formats.
//!
//! Gene IDs are parsed into `GeneId` here, once; nothing downstream sees the
//! textual form again.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use genorank_common::refdata::{Edge, GeneSet, TermWeights};
use genorank_common::GeneId;
use ndarray::Array2;
use serde::Deserialize;

/// IDs appear as strings in some files and as numbers in others.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Text(String),
}

impl RawId {
    fn parse(&self) -> Result<GeneId> {
        match self {
            RawId::Num(n) => Ok(GeneId::new(*n)),
            RawId::Text(s) => s.parse().with_context(|| format!("Invalid gene ID {s:?}")),
        }
    }
}

fn parse_ids(raw: &[RawId]) -> Result<Vec<GeneId>> {
    raw.iter().map(RawId::parse).collect()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON in {:?}", path))
}

/// One gene ID per line; blank lines are skipped.
pub fn read_id_lines(path: &Path) -> Result<Vec<GeneId>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.parse::<GeneId>()
                .with_context(|| format!("{:?} line {}: invalid gene ID {:?}", path, i + 1, line))
        })
        .collect()
}

/// One term ID per line.
pub fn read_term_order(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Headerless tab-separated numeric matrix.
pub fn read_matrix_tsv(path: &Path) -> Result<Array2<f64>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut values = Vec::new();
    let mut ncols = None;
    let mut nrows = 0;
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{:?} row {}", path, i + 1))?;
        match ncols {
            None => ncols = Some(record.len()),
            Some(n) if n != record.len() => {
                bail!("{:?} row {} has {} columns, expected {}", path, i + 1, record.len(), n)
            }
            Some(_) => {}
        }
        for field in record.iter() {
            let v: f64 = field
                .trim()
                .parse()
                .with_context(|| format!("{:?} row {}: invalid number {:?}", path, i + 1, field))?;
            values.push(v);
        }
        nrows += 1;
    }

    Array2::from_shape_vec((nrows, ncols.unwrap_or(0)), values)
        .with_context(|| format!("{:?} is not a rectangular matrix", path))
}

/// Tab-separated `source target [weight]`.
pub fn read_edges(path: &Path) -> Result<Vec<Edge>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut edges = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{:?} row {}", path, i + 1))?;
        let field = |idx: usize| record.get(idx).map(str::trim).filter(|s| !s.is_empty());
        let (Some(source), Some(target)) = (field(0), field(1)) else {
            bail!("{:?} row {}: expected at least two columns", path, i + 1);
        };
        let weight = match field(2) {
            Some(w) => Some(
                w.parse::<f64>()
                    .with_context(|| format!("{:?} row {}: invalid weight {:?}", path, i + 1, w))?,
            ),
            None => None,
        };
        edges.push(Edge {
            source: source.parse().with_context(|| format!("{:?} row {}: invalid gene ID", path, i + 1))?,
            target: target.parse().with_context(|| format!("{:?} row {}: invalid gene ID", path, i + 1))?,
            weight,
        });
    }
    Ok(edges)
}

/// `{"FOREIGN_ID": ["entrez", ...]}`
pub fn read_conversion(path: &Path) -> Result<Vec<(String, Vec<GeneId>)>> {
    let raw: HashMap<String, Vec<RawId>> = read_json(path)?;
    raw.into_iter()
        .map(|(key, ids)| Ok((key, parse_ids(&ids)?)))
        .collect()
}

/// `{"entrez": ["value", ...]}`, used for both symbols and names.
pub fn read_annotation(path: &Path) -> Result<HashMap<GeneId, Vec<String>>> {
    let raw: HashMap<String, Vec<String>> = read_json(path)?;
    raw.into_iter()
        .map(|(key, values)| {
            let id: GeneId = key.parse().with_context(|| format!("Invalid gene ID key {key:?} in {:?}", path))?;
            Ok((id, values))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawGeneSet {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Genes")]
    genes: Vec<RawId>,
}

/// `{"TERM": {"Name": .., "Genes": [..]}}`, returned sorted by term ID.
pub fn read_good_sets(path: &Path) -> Result<Vec<GeneSet>> {
    let raw: HashMap<String, RawGeneSet> = read_json(path)?;
    let mut sets = raw
        .into_iter()
        .map(|(id, set)| {
            let genes: BTreeSet<GeneId> = parse_ids(&set.genes)
                .with_context(|| format!("Term {id} in {:?}", path))?
                .into_iter()
                .collect();
            Ok(GeneSet { id, name: set.name, genes })
        })
        .collect::<Result<Vec<_>>>()?;
    sets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sets)
}

#[derive(Debug, Deserialize)]
struct RawTermWeights {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Weights")]
    weights: Vec<f64>,
    #[serde(rename = "PosGenes", default)]
    pos_genes: Vec<RawId>,
}

/// `{"TERM": {"Name", "Weights", "PosGenes"}}`
pub fn read_pretrained(path: &Path) -> Result<HashMap<String, TermWeights>> {
    let raw: HashMap<String, RawTermWeights> = read_json(path)?;
    let mut dims = None;
    let mut terms = HashMap::with_capacity(raw.len());
    for (id, term) in raw {
        match dims {
            None => dims = Some(term.weights.len()),
            Some(d) if d != term.weights.len() => {
                bail!("Term {id} in {:?} has {} weights, expected {}", path, term.weights.len(), d)
            }
            Some(_) => {}
        }
        let positive_genes = parse_ids(&term.pos_genes).with_context(|| format!("Term {id} in {:?}", path))?;
        terms.insert(
            id,
            TermWeights {
                name: term.name,
                weights: term.weights,
                positive_genes,
            },
        );
    }
    Ok(terms)
}

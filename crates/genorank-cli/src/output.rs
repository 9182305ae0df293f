//! Result files. Every file of a job is prefixed with `{job}--`.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use genorank_common::{PipelineSettings, Selection};
use genorank_ranker::classify::{ClassLabel, Novelty, RankedGene};
use genorank_ranker::evaluate::CrossValidation;
use genorank_ranker::similarity::SimilarityTable;
use genorank_ranker::subgraph::InducedSubgraph;
use genorank_ranker::validate::{ValidationReport, ValidationSubset};
use genorank_ranker::RankingResult;
use serde::Serialize;
use tracing::{debug, info};

pub const CV_HEADER: &str = "CVs (log2p)";

/// Collects the paths of files written for one job.
pub struct JobWriter {
    dir: PathBuf,
    job: String,
    written: Vec<PathBuf>,
}

impl JobWriter {
    pub fn new(dir: &Path, job: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self { dir: dir.to_path_buf(), job: job.to_string(), written: Vec::new() })
    }

    pub fn into_written(self) -> Vec<PathBuf> {
        self.written
    }

    fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}--{}", self.job, suffix))
    }

    fn tsv(&mut self, suffix: &str) -> anyhow::Result<csv::Writer<File>> {
        let path = self.path(suffix);
        let writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        debug!(path = %path.display(), "Writing");
        self.written.push(path);
        Ok(writer)
    }

    fn lines(&mut self, suffix: &str, lines: &[String]) -> anyhow::Result<()> {
        let path = self.path(suffix);
        let mut body = lines.join("\n");
        body.push('\n');
        std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        self.written.push(path);
        Ok(())
    }

    // ── Ranked table and evaluation ─────────────────────────────────────────

    pub fn predictions(&mut self, ranked: &[RankedGene]) -> anyhow::Result<()> {
        let mut w = self.tsv("predictions.tsv")?;
        w.write_record(["Entrez", "Symbol", "Name", "Probability", "Known/Novel", "Class-Label", "Rank"])?;
        for r in ranked {
            let novelty = match r.novelty {
                Novelty::Known => "Known",
                Novelty::Novel => "Novel",
            };
            let label = match r.class_label {
                ClassLabel::Positive => "P",
                ClassLabel::Negative => "N",
                ClassLabel::Neutral => "U",
            };
            w.write_record([
                r.gene.to_string(),
                r.symbol.clone(),
                r.name.clone(),
                r.probability.to_string(),
                novelty.to_string(),
                label.to_string(),
                r.rank.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn cv_values(&mut self, cv: &CrossValidation) -> anyhow::Result<()> {
        let mut lines = vec![CV_HEADER.to_string()];
        lines.extend(cv.fold_scores.iter().map(f64::to_string));
        self.lines("CVvalues.txt", &lines)
    }

    pub fn similarity(&mut self, table: &SimilarityTable) -> anyhow::Result<()> {
        let mut w = self.tsv(&format!("similarity-{}.tsv", table.target))?;
        w.write_record(["ID", "Name", "Cosine", "Z-Query", "Z-Term", "Similarity", "Rank"])?;
        for row in &table.rows {
            w.write_record([
                row.term_id.clone(),
                row.name.clone(),
                row.cosine.to_string(),
                row.z_query.to_string(),
                row.z_term.to_string(),
                row.similarity.to_string(),
                row.rank.to_string(),
            ])?;
        }
        w.flush()?;
        Ok(())
    }

    // ── Subgraph ────────────────────────────────────────────────────────────

    pub fn subgraph(&mut self, sg: &InducedSubgraph) -> anyhow::Result<()> {
        let weight = |w: Option<f64>| w.map(|v| v.to_string()).unwrap_or_default();

        let mut w = self.tsv("edges.tsv")?;
        w.write_record(["Node1", "Node2", "Weight"])?;
        for e in &sg.edges {
            w.write_record([e.source.to_string(), e.target.to_string(), weight(e.weight)])?;
        }
        w.flush()?;

        let mut w = self.tsv("edges-symbol.tsv")?;
        w.write_record(["Node1", "Node2", "Weight"])?;
        for e in &sg.symbol_edges {
            w.write_record([e.source.clone(), e.target.clone(), weight(e.weight)])?;
        }
        w.flush()?;

        let isolated: Vec<String> = sg.isolated.iter().map(|g| g.to_string()).collect();
        self.lines("isolated-genes.txt", &isolated)?;
        self.lines("isolated-genes-symbol.txt", &sg.isolated_symbols)
    }

    pub fn json<T: Serialize>(&mut self, suffix: &str, value: &T) -> anyhow::Result<()> {
        let path = self.path(suffix);
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(file, value)?;
        self.written.push(path);
        Ok(())
    }

    // ── Validation ──────────────────────────────────────────────────────────

    pub fn validation(&mut self, report: &ValidationReport) -> anyhow::Result<()> {
        let mut w = self.tsv("validation-summary.tsv")?;
        w.write_record(["Network", "NetworkGenes", "PositiveGenes"])?;
        for s in &report.summaries {
            w.write_record([s.network.to_string(), s.network_genes.to_string(), s.positive_genes.to_string()])?;
        }
        w.flush()?;

        let mut w = self.tsv("validation.tsv")?;
        let mut header = vec!["Original ID".to_string(), "Entrez ID".to_string()];
        header.extend(report.summaries.iter().map(|s| format!("In {}?", s.network)));
        w.write_record(&header)?;
        for row in &report.rows {
            let mut record = vec![row.record.original_id.clone(), row.record.mapped_to()];
            record.extend(row.in_network.iter().map(|&b| yes_no(b).to_string()));
            w.write_record(&record)?;
        }
        w.flush()?;
        Ok(())
    }

    /// Audit rows for the network the model is trained on.
    pub fn network_validation(&mut self, subset: &ValidationSubset) -> anyhow::Result<()> {
        let mut w = self.tsv("network-validation.tsv")?;
        w.write_record(["Original ID", "Entrez ID", "In Network"])?;
        for (record, in_net) in &subset.rows {
            w.write_record([record.original_id.clone(), record.mapped_to(), yes_no(*in_net).to_string()])?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn run_config(&mut self, dump: &RunConfig) -> anyhow::Result<()> {
        let path = self.dir.join(format!("{}--config.yaml", self.job));
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_yaml::to_writer(file, dump)?;
        self.written.push(path);
        Ok(())
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "Y" } else { "N" }
}

/// Effective parameters of one run, as written to `config.yaml`.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub job_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub data_dir: PathBuf,
    pub selection: Selection,
    pub input_count: usize,
    pub positives_in_network: usize,
    pub negatives: usize,
    pub model_converged: bool,
    pub settings: PipelineSettings,
}

/// Write every artifact of a finished run.
pub fn write_ranking(dir: &Path, data_dir: &Path, result: &RankingResult) -> anyhow::Result<Vec<PathBuf>> {
    let job = &result.metadata.job_id;
    let mut w = JobWriter::new(dir, job)?;

    w.predictions(&result.ranked)?;
    w.cv_values(&result.model.cv)?;
    for table in &result.similarity {
        w.similarity(table)?;
    }
    w.subgraph(&result.subgraph)?;
    w.json("graph.json", &result.graph)?;
    w.validation(&result.inputs.validation)?;
    if let Some(subset) = result.inputs.validation.subset(&result.selection.net_type) {
        w.network_validation(&subset)?;
    }
    w.run_config(&RunConfig {
        job_id: job.clone(),
        started_at: result.metadata.started_at,
        duration_ms: result.metadata.duration_ms,
        data_dir: data_dir.to_path_buf(),
        selection: result.selection.clone(),
        input_count: result.inputs.validation.input_count,
        positives_in_network: result.sample.positives.len(),
        negatives: result.sample.negatives.len(),
        model_converged: result.model.converged,
        settings: result.settings.clone(),
    })?;

    let written = w.into_written();
    info!(job = %job, files = written.len(), dir = %dir.display(), "Results written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genorank_common::GeneId;
    use genorank_common::refdata::Edge;
    use genorank_ranker::subgraph::SymbolEdge;

    #[test]
    fn test_cv_values_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = JobWriter::new(dir.path(), "job1").unwrap();
        w.cv_values(&CrossValidation { fold_scores: vec![-10.0, -10.0, -10.0], evaluated: false }).unwrap();
        let body = std::fs::read_to_string(dir.path().join("job1--CVvalues.txt")).unwrap();
        assert_eq!(body, "CVs (log2p)\n-10\n-10\n-10\n");
    }

    #[test]
    fn test_edge_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = JobWriter::new(dir.path(), "j").unwrap();
        let sg = InducedSubgraph {
            top_genes: vec![GeneId::new(1), GeneId::new(2), GeneId::new(3)],
            edges: vec![Edge { source: GeneId::new(1), target: GeneId::new(2), weight: None }],
            isolated: vec![GeneId::new(3)],
            symbol_edges: vec![SymbolEdge { source: "A".into(), target: "B".into(), weight: None }],
            isolated_symbols: vec!["C".into()],
        };
        w.subgraph(&sg).unwrap();
        assert_eq!(w.into_written().len(), 4);
        let edges = std::fs::read_to_string(dir.path().join("j--edges-symbol.tsv")).unwrap();
        assert_eq!(edges, "Node1\tNode2\tWeight\nA\tB\t\n");
        let isolated = std::fs::read_to_string(dir.path().join("j--isolated-genes.txt")).unwrap();
        assert_eq!(isolated, "3\n");
    }
}

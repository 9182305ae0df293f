//! Subcommand bodies, kept out of `main` so tests can drive them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use genorank_ranker::{prepare_inputs, run_pipeline, InputStage, RankingJob, RankingResult, ReferenceStoreAdapter};
use tracing::info;

use crate::batch::{run_batch, BatchFile, BatchOutcome};
use crate::config::Config;
use crate::input::{read_gene_list, Separator};
use crate::output::{write_ranking, JobWriter};

/// Inline genes followed by the contents of `file`, if any.
pub fn collect_genes(inline: &[String], file: Option<&Path>, separator: Separator) -> anyhow::Result<Vec<String>> {
    let mut genes: Vec<String> = inline.iter().map(|g| g.trim().to_string()).filter(|g| !g.is_empty()).collect();
    if let Some(path) = file {
        genes.extend(read_gene_list(path, separator)?);
    }
    if genes.is_empty() {
        anyhow::bail!("No input genes: pass --genes or --input");
    }
    Ok(genes)
}

pub fn open_provider(config: &Config) -> anyhow::Result<Arc<ReferenceStoreAdapter>> {
    let adapter = ReferenceStoreAdapter::open(&config.data_dir)
        .with_context(|| format!("Failed to open reference data at {}", config.data_dir.display()))?;
    info!(data_dir = %config.data_dir.display(), "Reference store opened");
    Ok(Arc::new(adapter))
}

/// Resolve and validate only; writes the validation tables.
pub fn validate(
    config: &Config,
    provider: &ReferenceStoreAdapter,
    genes: &[String],
    job: &str,
    output_dir: &Path,
) -> anyhow::Result<(InputStage, Vec<PathBuf>)> {
    config.pipeline.validate()?;
    let stage = prepare_inputs(provider, genes, &config.pipeline)?;
    let mut w = JobWriter::new(output_dir, job)?;
    w.validation(&stage.validation)?;
    Ok((stage, w.into_written()))
}

pub fn run(
    config: &Config,
    provider: &ReferenceStoreAdapter,
    job: &RankingJob,
    output_dir: &Path,
) -> anyhow::Result<(RankingResult, Vec<PathBuf>)> {
    let result = run_pipeline(provider, job, &config.pipeline)?;
    let files = write_ranking(output_dir, &config.data_dir, &result)?;
    Ok((result, files))
}

pub async fn batch(
    config: &Config,
    provider: Arc<ReferenceStoreAdapter>,
    batch_file: &Path,
    output_dir: &Path,
) -> anyhow::Result<Vec<BatchOutcome>> {
    let base_dir = batch_file.parent().unwrap_or_else(|| Path::new("."));
    let jobs = BatchFile::load(batch_file)?.into_jobs(&config.selection(), config.separator, base_dir)?;
    if jobs.is_empty() {
        anyhow::bail!("Batch file {} defines no jobs", batch_file.display());
    }
    Ok(run_batch(
        provider,
        jobs,
        config.pipeline.clone(),
        output_dir.to_path_buf(),
        config.data_dir.clone(),
    )
    .await)
}

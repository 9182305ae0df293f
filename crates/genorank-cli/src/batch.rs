//! Batch mode: several ranking jobs from one TOML file, run concurrently
//! against a shared reference store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use genorank_common::{FeatureType, GscName, NetworkType, PipelineSettings, Selection};
use genorank_ranker::{run_pipeline, RankingJob, ReferenceDataProvider};
use serde::Deserialize;
use tracing::{error, info};

use crate::input::{read_gene_list, Separator};
use crate::output::write_ranking;

/// One `[[jobs]]` entry. Unset selection fields fall back to the config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchEntry {
    pub name: Option<String>,
    #[serde(default)]
    pub genes: Vec<String>,
    /// Read in addition to `genes`; relative paths resolve against the
    /// batch file's directory.
    pub gene_file: Option<PathBuf>,
    pub separator: Option<Separator>,
    pub net_type: Option<NetworkType>,
    pub features: Option<FeatureType>,
    pub gsc: Option<GscName>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub jobs: Vec<BatchEntry>,
}

impl BatchFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid batch file {}", path.display()))
    }

    /// Turn entries into jobs. `base_dir` anchors relative gene files.
    pub fn into_jobs(self, defaults: &Selection, separator: Separator, base_dir: &Path) -> anyhow::Result<Vec<RankingJob>> {
        self.jobs
            .into_iter()
            .map(|entry| {
                let mut genes = entry.genes;
                if let Some(file) = &entry.gene_file {
                    let file = if file.is_relative() { base_dir.join(file) } else { file.clone() };
                    genes.extend(read_gene_list(&file, entry.separator.unwrap_or(separator))?);
                }
                Ok(RankingJob {
                    name: entry.name,
                    genes,
                    selection: Selection {
                        net_type: entry.net_type.unwrap_or_else(|| defaults.net_type.clone()),
                        features: entry.features.unwrap_or(defaults.features),
                        gsc: entry.gsc.unwrap_or(defaults.gsc),
                    },
                })
            })
            .collect()
    }
}

/// Result of one batch job. A failed job does not stop the others.
#[derive(Debug)]
pub struct BatchOutcome {
    pub job: String,
    pub outcome: Result<Vec<PathBuf>, String>,
}

/// Run every job on the blocking pool; outcomes come back in job order.
pub async fn run_batch(
    provider: Arc<dyn ReferenceDataProvider>,
    jobs: Vec<RankingJob>,
    settings: PipelineSettings,
    output_dir: PathBuf,
    data_dir: PathBuf,
) -> Vec<BatchOutcome> {
    info!(jobs = jobs.len(), "Starting batch");
    let settings = Arc::new(settings);

    let handles: Vec<_> = jobs
        .into_iter()
        .enumerate()
        .map(|(i, job)| {
            let label = job.name.clone().unwrap_or_else(|| format!("job-{}", i + 1));
            let provider = Arc::clone(&provider);
            let settings = Arc::clone(&settings);
            let output_dir = output_dir.clone();
            let data_dir = data_dir.clone();
            let handle = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<PathBuf>> {
                let result = run_pipeline(provider.as_ref(), &job, &settings)?;
                write_ranking(&output_dir, &data_dir, &result)
            });
            (label, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (job, handle) in handles {
        let outcome = match handle.await {
            Ok(Ok(files)) => Ok(files),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(e) => Err(format!("task failed: {e}")),
        };
        if let Err(msg) = &outcome {
            error!(job = %job, error = %msg, "Batch job failed");
        }
        outcomes.push(BatchOutcome { job, outcome });
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_inherit_defaults() {
        let file: BatchFile = toml::from_str(
            r#"
            [[jobs]]
            name = "bbs"
            genes = ["ARL6", "BBS1"]

            [[jobs]]
            genes = ["582"]
            net_type = "STRING"
            gsc = "DisGeNet"
            "#,
        )
        .unwrap();
        let jobs = file.into_jobs(&Selection::default(), Separator::Comma, Path::new(".")).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name.as_deref(), Some("bbs"));
        assert_eq!(jobs[0].selection, Selection::default());
        assert_eq!(jobs[1].selection.net_type, NetworkType::String);
        assert_eq!(jobs[1].selection.gsc, GscName::DisGeNet);
        assert_eq!(jobs[1].selection.features, FeatureType::Embedding);
    }

    #[test]
    fn test_gene_file_relative_to_batch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("genes.txt"), "BBS2\nARL6\n").unwrap();
        let file: BatchFile = toml::from_str(
            r#"
            [[jobs]]
            genes = ["BBS1"]
            gene_file = "genes.txt"
            separator = "newline"
            "#,
        )
        .unwrap();
        let jobs = file.into_jobs(&Selection::default(), Separator::Comma, dir.path()).unwrap();
        assert_eq!(jobs[0].genes, vec!["BBS1", "BBS2", "ARL6"]);
    }
}

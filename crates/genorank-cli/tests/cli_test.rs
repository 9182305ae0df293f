//! Subcommands end to end over the synthetic reference dataset.

use std::path::Path;

use genorank_cli::commands;
use genorank_cli::config::Config;
use genorank_cli::input::Separator;
use genorank_cli::output::CV_HEADER;
use genorank_common::Selection;
use genorank_ranker::RankingJob;
use genorank_test_utils::{large_query, SyntheticDataset, BBS_QUERY, LARGE_NET};
use pretty_assertions::assert_eq;

fn config(ds: &SyntheticDataset, out: &Path) -> Config {
    Config {
        data_dir: ds.path().to_path_buf(),
        output_dir: out.to_path_buf(),
        ..Config::default()
    }
}

fn bbs() -> Vec<String> {
    BBS_QUERY.iter().map(|s| s.to_string()).collect()
}

fn file_names(files: &[std::path::PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_run_writes_all_artifacts() {
    let ds = SyntheticDataset::create().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = config(&ds, out.path());
    let provider = commands::open_provider(&config).unwrap();

    let job = RankingJob::new(bbs(), Selection::default()).with_name("bbs");
    let (result, files) = commands::run(&config, &provider, &job, out.path()).unwrap();
    assert_eq!(result.ranked.len(), 10);

    let names = file_names(&files);
    for expected in [
        "bbs--predictions.tsv",
        "bbs--CVvalues.txt",
        "bbs--similarity-GO.tsv",
        "bbs--similarity-DisGeNet.tsv",
        "bbs--edges.tsv",
        "bbs--edges-symbol.tsv",
        "bbs--isolated-genes.txt",
        "bbs--isolated-genes-symbol.txt",
        "bbs--graph.json",
        "bbs--validation-summary.tsv",
        "bbs--validation.tsv",
        "bbs--network-validation.tsv",
        "bbs--config.yaml",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected} in {names:?}");
    }
    assert!(files.iter().all(|f| f.exists()));

    let predictions = std::fs::read_to_string(out.path().join("bbs--predictions.tsv")).unwrap();
    let mut lines = predictions.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Entrez\tSymbol\tName\tProbability\tKnown/Novel\tClass-Label\tRank"
    );
    assert_eq!(lines.count(), 10);

    let cv = std::fs::read_to_string(out.path().join("bbs--CVvalues.txt")).unwrap();
    assert_eq!(cv.lines().collect::<Vec<_>>(), vec![CV_HEADER, "-10", "-10", "-10"]);

    let dumped: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(out.path().join("bbs--config.yaml")).unwrap()).unwrap();
    assert_eq!(dumped["job_id"].as_str(), Some("bbs"));
    assert_eq!(dumped["selection"]["net_type"].as_str(), Some("BioGRID"));
    assert_eq!(dumped["settings"]["min_num_pos"].as_u64(), Some(15));
}

#[test]
fn test_validate_reports_unmapped() {
    let ds = SyntheticDataset::create().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = config(&ds, out.path());
    let provider = commands::open_provider(&config).unwrap();

    let genes = vec!["ARL6".to_string(), "NOTAGENE".to_string(), "bbsx".to_string()];
    let (stage, files) = commands::validate(&config, &provider, &genes, "check", out.path()).unwrap();
    assert_eq!(stage.validation.input_count, 3);
    assert_eq!(stage.resolution.unmapped().count(), 1);
    assert_eq!(files.len(), 2);

    let table = std::fs::read_to_string(out.path().join("check--validation.tsv")).unwrap();
    let rows: Vec<&str> = table.lines().collect();
    assert_eq!(rows[0], "Original ID\tEntrez ID\tIn BioGRID?\tIn STRING?\tIn STRING-EXP?\tIn GIANT-TN?");
    assert_eq!(rows[1], "ARL6\t84100\tY\tY\tN\tY");
    assert_eq!(rows[2], "NOTAGENE\tCould Not be mapped to Entrez\tN\tN\tN\tN");
    assert_eq!(rows[3], "bbsx\t582/7157\tY\tY\tY\tY");
}

#[test]
fn test_gene_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genes.txt");
    std::fs::write(&path, "'BBS1', 'BBS2'").unwrap();
    let genes = commands::collect_genes(&["ARL6".to_string()], Some(&path), Separator::Comma).unwrap();
    assert_eq!(genes, vec!["ARL6", "BBS1", "BBS2"]);
    assert!(commands::collect_genes(&[], None, Separator::Comma).is_err());
}

#[test]
fn test_missing_data_dir() {
    let out = tempfile::tempdir().unwrap();
    let config = Config {
        data_dir: out.path().join("absent"),
        ..Config::default()
    };
    assert!(commands::open_provider(&config).is_err());
}

#[tokio::test]
async fn test_batch_runs_jobs_independently() {
    let ds = SyntheticDataset::create().unwrap();
    let out = tempfile::tempdir().unwrap();
    let config = config(&ds, out.path());
    let provider = commands::open_provider(&config).unwrap();

    let synth_genes = large_query()
        .iter()
        .map(|g| format!("\"{g}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let batch_path = out.path().join("jobs.toml");
    std::fs::write(
        &batch_path,
        format!(
            r#"
            [[jobs]]
            name = "bbs"
            genes = ["ARL6", "BBS1", "BBS2"]

            [[jobs]]
            name = "synth"
            net_type = "{LARGE_NET}"
            genes = [{synth_genes}]

            [[jobs]]
            name = "broken"
            net_type = "NoSuchNet"
            genes = ["ARL6"]
            "#
        ),
    )
    .unwrap();

    let outcomes = commands::batch(&config, provider, &batch_path, out.path()).await.unwrap();
    assert_eq!(
        outcomes.iter().map(|o| o.job.as_str()).collect::<Vec<_>>(),
        vec!["bbs", "synth", "broken"]
    );
    assert!(outcomes[0].outcome.is_ok());
    assert!(outcomes[1].outcome.is_ok());
    assert!(outcomes[2].outcome.is_err());
    assert!(out.path().join("synth--predictions.tsv").exists());
    assert!(out.path().join("synth--network-validation.tsv").exists());

    let cv = std::fs::read_to_string(out.path().join("synth--CVvalues.txt")).unwrap();
    assert!(cv.lines().skip(1).all(|v| v.parse::<f64>().unwrap() > 0.0));
}

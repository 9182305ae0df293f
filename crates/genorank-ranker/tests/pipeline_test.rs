//! Full runs over the synthetic reference dataset.

use std::collections::BTreeSet;
use std::sync::Arc;

use genorank_common::{FeatureType, GeneId, GenorankError, GscName, NetworkType, PipelineSettings, Selection};
use genorank_ranker::classify::ClassLabel;
use genorank_ranker::resolve::ResolutionStatus;
use genorank_ranker::{run_pipeline, MockReferenceProvider, RankingJob, ReferenceDataProvider, ReferenceStoreAdapter};
use genorank_test_utils::{
    is_large_positive, large_query, SyntheticDataset, BBS_QUERY, LARGE_NET, LARGE_NET_SIZE, SMALL_ENRICHED_NON_QUERY,
    UNANNOTATED_GENE,
};
use pretty_assertions::assert_eq;

fn provider(ds: &SyntheticDataset) -> ReferenceStoreAdapter {
    ReferenceStoreAdapter::open(ds.path()).unwrap()
}

fn bbs_job() -> RankingJob {
    RankingJob::new(BBS_QUERY.iter().map(|s| s.to_string()).collect(), Selection::default())
}

fn synth_selection() -> Selection {
    Selection {
        net_type: LARGE_NET.parse().unwrap(),
        features: FeatureType::Embedding,
        gsc: GscName::Go,
    }
}

#[test]
fn test_bbs_scenario() {
    let ds = SyntheticDataset::create().unwrap();
    let result = run_pipeline(&provider(&ds), &bbs_job(), &PipelineSettings::default()).unwrap();

    assert_eq!(result.ranked.len(), 10);
    let count = |label| result.ranked.iter().filter(|r| r.class_label == label).count();
    assert_eq!(count(ClassLabel::Positive), 3);
    assert!(count(ClassLabel::Negative) >= 1);
    assert_eq!(count(ClassLabel::Positive) + count(ClassLabel::Negative) + count(ClassLabel::Neutral), 10);

    for id in SMALL_ENRICHED_NON_QUERY {
        let row = result.ranked.iter().find(|r| r.gene == GeneId::new(id)).unwrap();
        assert_eq!(row.class_label, ClassLabel::Neutral);
    }

    assert_eq!(result.model.cv.fold_scores, vec![-10.0; 3]);
    assert!(!result.model.cv.evaluated);
    assert!(result.ranked.windows(2).all(|w| w[0].probability >= w[1].probability));
    assert_eq!(result.ranked.iter().map(|r| r.rank).collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_bbs_validation_summary() {
    let ds = SyntheticDataset::create().unwrap();
    let result = run_pipeline(&provider(&ds), &bbs_job(), &PipelineSettings::default()).unwrap();
    let summary: Vec<(String, usize, usize)> = result
        .inputs
        .validation
        .summaries
        .iter()
        .map(|s| (s.network.to_string(), s.network_genes, s.positive_genes))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("BioGRID".to_string(), 10, 3),
            ("STRING".to_string(), 6, 2),
            ("STRING-EXP".to_string(), 3, 2),
            ("GIANT-TN".to_string(), 11, 3),
        ]
    );
    assert_eq!(result.inputs.validation.input_count, 3);
    assert!(result
        .inputs
        .resolution
        .records
        .iter()
        .all(|r| matches!(r.status, ResolutionStatus::Converted(_))));
}

#[test]
fn test_negatives_disjoint_from_positives_and_exclusions() {
    let ds = SyntheticDataset::create().unwrap();
    let p = provider(&ds);
    for (job, settings) in [
        (bbs_job(), PipelineSettings::default()),
        (RankingJob::new(large_query(), synth_selection()), PipelineSettings::default()),
    ] {
        let result = run_pipeline(&p, &job, &settings).unwrap();
        let s = &result.sample;
        assert!(s.negatives.is_disjoint(&s.positives));
        assert!(s.negatives.is_disjoint(&s.excluded));
        assert!(!s.enriched_terms.is_empty());
    }
}

#[test]
fn test_custom_network_evaluates_cv_deterministically() {
    let ds = SyntheticDataset::create().unwrap();
    let p = provider(&ds);
    let job = RankingJob::new(large_query(), synth_selection());
    let settings = PipelineSettings::default();

    let a = run_pipeline(&p, &job, &settings).unwrap();
    let b = run_pipeline(&p, &job, &settings).unwrap();

    assert_eq!(a.ranked.len(), LARGE_NET_SIZE);
    assert!(a.model.cv.evaluated);
    assert_eq!(a.model.cv.fold_scores.len(), 3);
    for score in &a.model.cv.fold_scores {
        assert!(score.is_finite() && *score > 0.0, "fold score {score}");
    }
    assert_eq!(a.model.cv.fold_scores, b.model.cv.fold_scores);
    assert_eq!(a.model.weights, b.model.weights);

    // The shifted cluster should dominate the top of the table.
    let top_positives = a.ranked.iter().take(20).filter(|r| is_large_positive(r.gene.get())).count();
    assert!(top_positives >= 15, "only {top_positives} positives in the top 20");

    let unannotated = a.ranked.iter().find(|r| r.gene == GeneId::new(UNANNOTATED_GENE)).unwrap();
    assert_eq!(unannotated.symbol, genorank_common::UNMAPPED_PLACEHOLDER);
}

#[test]
fn test_custom_network_gets_validation_subset() {
    let ds = SyntheticDataset::create().unwrap();
    let selection = synth_selection();
    let result = run_pipeline(&provider(&ds), &RankingJob::new(large_query(), selection.clone()), &PipelineSettings::default())
        .unwrap();

    let networks: Vec<String> = result.inputs.validation.summaries.iter().map(|s| s.network.to_string()).collect();
    assert_eq!(networks, vec!["BioGRID", "STRING", "STRING-EXP", "GIANT-TN", LARGE_NET]);

    let subset = result.inputs.validation.subset(&selection.net_type).unwrap();
    assert_eq!(subset.positive_genes, genorank_test_utils::LARGE_POSITIVES);
    assert_eq!(subset.positive_genes, result.sample.positives.len());
    assert_eq!(subset.rows.len(), result.inputs.validation.rows.len());
}

#[test]
fn test_similarity_tables() {
    let ds = SyntheticDataset::create().unwrap();
    let result = run_pipeline(&provider(&ds), &bbs_job(), &PipelineSettings::default()).unwrap();
    assert_eq!(
        result.similarity.iter().map(|t| t.target).collect::<Vec<_>>(),
        vec![GscName::Go, GscName::DisGeNet]
    );
    for table in &result.similarity {
        assert_eq!(table.rows.len(), 3);
        for row in &table.rows {
            assert!(row.z_query >= 0.0 && row.z_term >= 0.0);
            assert!(row.similarity >= row.z_query.max(row.z_term));
            assert!(!row.name.is_empty());
        }
        assert!(table.rows.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }
}

#[test]
fn test_subgraph_invariants() {
    let ds = SyntheticDataset::create().unwrap();
    let settings = PipelineSettings { subgraph_top_n: 12, ..PipelineSettings::default() };
    let result = run_pipeline(&provider(&ds), &RankingJob::new(large_query(), synth_selection()), &settings).unwrap();

    let sg = &result.subgraph;
    let top: BTreeSet<GeneId> = result.ranked.iter().take(12).map(|r| r.gene).collect();
    assert_eq!(sg.top_genes.iter().copied().collect::<BTreeSet<_>>(), top);

    let endpoints: BTreeSet<GeneId> = sg.edges.iter().flat_map(|e| [e.source, e.target]).collect();
    assert!(endpoints.is_subset(&top));
    let isolated: BTreeSet<GeneId> = sg.isolated.iter().copied().collect();
    assert_eq!(isolated, top.difference(&endpoints).copied().collect::<BTreeSet<_>>());
    assert_eq!(sg.symbol_edges.len(), sg.edges.len());
    assert_eq!(sg.isolated_symbols.len(), sg.isolated.len());

    assert_eq!(result.graph.nodes.len(), 12);
    assert_eq!(result.graph.links.len(), sg.edges.len());
    let json = serde_json::to_value(&result.graph).unwrap();
    assert!(json["nodes"].is_array());
}

#[test]
fn test_numeric_ids_resolve_directly() {
    let p = MockReferenceProvider::new();
    let inputs = vec!["582".to_string(), " 7157 ".to_string()];
    let res = genorank_ranker::resolve::resolve_identifiers(&p, &inputs, &PipelineSettings::default().id_source_priority)
        .unwrap();
    assert_eq!(res.genes, vec![GeneId::new(582), GeneId::new(7157)]);
    assert!(res.records.iter().all(|r| r.status == ResolutionStatus::Direct));
    assert_eq!(p.conversion_lookups(), 0);
}

#[test]
fn test_unknown_custom_network_rejected() {
    let ds = SyntheticDataset::create().unwrap();
    let selection = Selection { net_type: "NoSuchNet".parse().unwrap(), ..Selection::default() };
    let err = run_pipeline(&provider(&ds), &RankingJob::new(vec!["ARL6".into()], selection), &PipelineSettings::default())
        .unwrap_err();
    assert!(matches!(err, GenorankError::Configuration(_)), "{err}");
}

#[test]
fn test_query_outside_network_reports_network() {
    let ds = SyntheticDataset::create().unwrap();
    let job = RankingJob::new(vec!["NOTAGENE".into()], Selection::default());
    let err = run_pipeline(&provider(&ds), &job, &PipelineSettings::default()).unwrap_err();
    assert!(matches!(err, GenorankError::EmptyTrainingClass { class: "positive", .. }), "{err}");
    assert!(err.to_string().contains("BioGRID"));
}

#[test]
fn test_custom_network_missing_companion() {
    let ds = SyntheticDataset::create().unwrap();
    ds.remove("Data_Embedding_SynthNet.tsv").unwrap();
    let err = run_pipeline(&provider(&ds), &RankingJob::new(large_query(), synth_selection()), &PipelineSettings::default())
        .unwrap_err();
    assert!(matches!(err, GenorankError::Configuration(_)), "{err}");
}

#[test]
fn test_missing_reference_file() {
    let ds = SyntheticDataset::create().unwrap();
    ds.remove("CorrectionMatrix_GO_DisGeNet_BioGRID_Embedding.tsv").unwrap();
    let err = run_pipeline(&provider(&ds), &bbs_job(), &PipelineSettings::default()).unwrap_err();
    assert!(matches!(err, GenorankError::ReferenceDataMissing { .. }), "{err}");
}

#[test]
fn test_concurrent_runs_share_provider() {
    let ds = SyntheticDataset::create().unwrap();
    let p: Arc<dyn ReferenceDataProvider> = Arc::new(provider(&ds));
    let jobs = vec![
        bbs_job().with_name("bbs"),
        RankingJob::new(large_query(), synth_selection()).with_name("synth"),
    ];

    let handles: Vec<_> = jobs
        .into_iter()
        .map(|job| {
            let p = Arc::clone(&p);
            std::thread::spawn(move || run_pipeline(p.as_ref(), &job, &PipelineSettings::default()))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap().unwrap()).collect();

    assert_eq!(results[0].metadata.job_id, "bbs");
    assert_eq!(results[0].ranked.len(), 10);
    assert_eq!(results[1].ranked.len(), LARGE_NET_SIZE);
    assert_eq!(results[1].selection.net_type, NetworkType::Custom(LARGE_NET.to_string()));
}

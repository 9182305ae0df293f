//! Synthetic reference data written to a temporary directory in the layout
//! the genorank local store reads.
//!
//! Two networks are produced:
//! - `BioGRID`: ten genes around the Bardet-Biedl cluster (ARL6, BBS1, BBS2, ...),
//!   unweighted, with GO and DisGeNet collections and similarity data.
//! - `SynthNet`: a custom 60-gene weighted network whose first twenty genes
//!   form a separable positive cluster, large enough for cross-validation.
//!
//! `STRING`, `STRING-EXP` and `GIANT-TN` only get a node order, which is all
//! membership validation needs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

/// Query used by the Bardet-Biedl scenario.
pub const BBS_QUERY: [&str; 3] = ["ARL6", "BBS1", "BBS2"];

/// Entrez IDs of the `BioGRID` network, in node order.
pub const SMALL_NET_GENES: [u64; 10] = [84100, 582, 583, 585, 8195, 60, 2597, 7157, 1956, 4609];

/// Members of the enriched cilium-assembly term that are not in the query.
pub const SMALL_ENRICHED_NON_QUERY: [u64; 1] = [585];

pub const LARGE_NET: &str = "SynthNet";
pub const LARGE_NET_SIZE: usize = 60;
pub const LARGE_FIRST_ID: u64 = 1001;
pub const LARGE_POSITIVES: usize = 20;

/// Gene in `SynthNet` with no symbol or name annotation.
pub const UNANNOTATED_GENE: u64 = 1060;

const SMALL_SYMBOLS: [(&str, &str); 10] = [
    ("ARL6", "ADP ribosylation factor like GTPase 6"),
    ("BBS1", "Bardet-Biedl syndrome 1"),
    ("BBS2", "Bardet-Biedl syndrome 2"),
    ("BBS4", "Bardet-Biedl syndrome 4"),
    ("MKKS", "MKKS centrosomal shuttling protein"),
    ("ACTB", "actin beta"),
    ("GAPDH", "glyceraldehyde-3-phosphate dehydrogenase"),
    ("TP53", "tumor protein p53"),
    ("EGFR", "epidermal growth factor receptor"),
    ("MYC", "MYC proto-oncogene"),
];

const SMALL_FEATURES: [[f64; 4]; 10] = [
    [2.0, 1.5, 0.1, 0.3],
    [1.8, 1.7, 0.0, 0.2],
    [2.1, 1.4, 0.2, 0.1],
    [1.6, 1.2, 0.3, 0.4],
    [0.9, 0.8, 0.5, 0.6],
    [-1.0, -0.8, 1.2, 0.9],
    [-1.2, -1.0, 1.0, 1.1],
    [-0.5, -0.3, 0.4, -0.7],
    [-0.8, -0.9, 0.6, -0.2],
    [-0.6, -0.4, -0.3, 0.8],
];

const SMALL_EDGES: [(u64, u64); 9] = [
    (84100, 582),
    (582, 583),
    (583, 585),
    (585, 8195),
    (8195, 60),
    (60, 2597),
    (7157, 1956),
    (1956, 4609),
    (4609, 7157),
];

const LARGE_DIMS: usize = 6;
const PANEL_ROWS: usize = 6;

/// Owns the temporary directory; files are removed on drop.
pub struct SyntheticDataset {
    dir: TempDir,
}

impl SyntheticDataset {
    pub fn create() -> Result<Self> {
        let dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let ds = Self { dir };
        ds.write_conversions()?;
        ds.write_small_network()?;
        ds.write_large_network()?;
        ds.write_validation_only_networks()?;
        Ok(ds)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete one reference file, to exercise missing-data paths.
    pub fn remove(&self, file_name: &str) -> Result<()> {
        fs::remove_file(self.path().join(file_name)).with_context(|| format!("Failed to remove {file_name}"))
    }

    // ── Identifier conversion ───────────────────────────────────────────────

    fn write_conversions(&self) -> Result<()> {
        let mut symbol_to_entrez = Map::new();
        let mut entrez_to_symbol = Map::new();
        let mut entrez_to_name = Map::new();

        for (id, (symbol, name)) in SMALL_NET_GENES.iter().zip(SMALL_SYMBOLS) {
            symbol_to_entrez.insert(symbol.to_string(), json!([id.to_string()]));
            entrez_to_symbol.insert(id.to_string(), json!([symbol]));
            entrez_to_name.insert(id.to_string(), json!([name]));
        }
        for id in large_ids() {
            if id == UNANNOTATED_GENE {
                continue;
            }
            let symbol = large_symbol(id);
            symbol_to_entrez.insert(symbol.clone(), json!([id.to_string()]));
            entrez_to_symbol.insert(id.to_string(), json!([symbol]));
            entrez_to_name.insert(id.to_string(), json!([format!("synthetic gene {}", id - LARGE_FIRST_ID + 1)]));
        }
        // One symbol with two Entrez targets.
        symbol_to_entrez.insert("BBSX".into(), json!(["582", "7157"]));

        self.write_json("IDconversion_Homo-sapiens_Symbol-to-Entrez.json", &Value::Object(symbol_to_entrez))?;
        self.write_json("IDconversion_Homo-sapiens_Entrez-to-Symbol.json", &Value::Object(entrez_to_symbol))?;
        self.write_json("IDconversion_Homo-sapiens_Entrez-to-Name.json", &Value::Object(entrez_to_name))?;
        self.write_json(
            "IDconversion_Homo-sapiens_ENSG-to-Entrez.json",
            &json!({
                "ENSG00000113966": ["84100"],
                "ENSG00000174483": ["582"],
                "ENSG00000141510": ["7157"],
            }),
        )?;
        self.write_json(
            "IDconversion_Homo-sapiens_ENSP-to-Entrez.json",
            &json!({ "ENSP00000269305": ["7157"] }),
        )?;
        self.write_json(
            "IDconversion_Homo-sapiens_ENST-to-Entrez.json",
            &json!({ "ENST00000269305": ["7157"] }),
        )?;
        Ok(())
    }

    // ── BioGRID (10 genes) ──────────────────────────────────────────────────

    fn write_small_network(&self) -> Result<()> {
        let net = "BioGRID";
        self.write_node_order(net, &SMALL_NET_GENES)?;

        let edges: Vec<String> = SMALL_EDGES.iter().map(|(a, b)| format!("{a}\t{b}")).collect();
        self.write_lines(&format!("Edgelist_{net}.edg"), &edges)?;

        let rows: Vec<Vec<f64>> = SMALL_FEATURES.iter().map(|r| r.to_vec()).collect();
        self.write_tsv(&format!("Data_Embedding_{net}.tsv"), &rows)?;

        let go = vec![
            ("GO:0060271", "cilium assembly", vec![84100, 582, 583, 585]),
            ("GO:0006096", "glycolytic process", vec![2597, 60]),
            ("GO:0006915", "apoptotic process", vec![7157, 4609, 1956]),
        ];
        let disgenet = vec![
            ("C0752166", "Bardet-Biedl Syndrome", vec![84100, 582, 583, 585, 8195]),
            ("C0006142", "Malignant neoplasm of breast", vec![7157, 1956, 4609]),
            ("C0011849", "Diabetes Mellitus", vec![60, 2597, 7157]),
        ];
        self.write_gsc("GO", net, &go, &SMALL_NET_GENES)?;
        self.write_gsc("DisGeNet", net, &disgenet, &SMALL_NET_GENES)?;

        let go_weights = [
            [1.0, 0.9, -0.2, -0.1],
            [-0.7, -0.6, 0.9, 0.8],
            [-0.3, -0.2, 0.3, -0.6],
        ];
        let disgenet_weights = [
            [0.9, 1.0, -0.1, 0.0],
            [-0.4, -0.5, 0.2, -0.3],
            [-0.6, -0.4, 0.8, 0.9],
        ];
        self.write_pretrained("GO", net, &go, &go_weights.map(|w| w.to_vec()))?;
        self.write_pretrained("DisGeNet", net, &disgenet, &disgenet_weights.map(|w| w.to_vec()))?;

        let mut rng = StdRng::seed_from_u64(7);
        self.write_correction(net, &go, &disgenet, &mut rng)
    }

    // ── SynthNet (60 genes, custom) ─────────────────────────────────────────

    fn write_large_network(&self) -> Result<()> {
        let net = LARGE_NET;
        let ids = large_ids();
        self.write_node_order(net, &ids)?;

        let mut rng = StdRng::seed_from_u64(42);

        // Chain with gaps every fourth gene, plus a few weighted chords.
        let mut edges = Vec::new();
        for pair in ids.windows(2) {
            if pair[0] % 4 != 0 {
                edges.push(format!("{}\t{}\t{:.3}", pair[0], pair[1], rng.gen_range(0.5..1.0)));
            }
        }
        for (a, b) in [(1001, 1011), (1003, 1017), (1025, 1050), (1033, 1058)] {
            edges.push(format!("{a}\t{b}\t{:.3}", rng.gen_range(0.5..1.0)));
        }
        self.write_lines(&format!("Edgelist_{net}.edg"), &edges)?;

        let rows: Vec<Vec<f64>> = ids
            .iter()
            .map(|id| {
                let shift = if is_large_positive(*id) { 1.5 } else { 0.0 };
                (0..LARGE_DIMS)
                    .map(|d| rng.gen_range(-1.0..1.0) + if d < 3 { shift } else { 0.0 })
                    .collect()
            })
            .collect();
        self.write_tsv(&format!("Data_Embedding_{net}.tsv"), &rows)?;

        let span = |from: u64, to: u64| (from..=to).collect::<Vec<u64>>();
        let go = vec![
            ("GO:1000001", "synthetic process A", [span(1001, 1010), span(1041, 1043)].concat()),
            ("GO:1000002", "synthetic process B", span(1021, 1030)),
            ("GO:1000003", "synthetic process C", [span(1031, 1040), vec![1015]].concat()),
        ];
        let disgenet = vec![
            ("D0000001", "synthetic disorder 1", [span(1001, 1005), span(1050, 1052)].concat()),
            ("D0000002", "synthetic disorder 2", span(1044, 1049)),
        ];
        self.write_gsc("GO", net, &go, &ids)?;
        self.write_gsc("DisGeNet", net, &disgenet, &ids)?;

        let random_weights = |n: usize, rng: &mut StdRng| -> Vec<Vec<f64>> {
            (0..n).map(|_| (0..LARGE_DIMS).map(|_| rng.gen_range(-1.0..1.0)).collect()).collect()
        };
        let go_weights = random_weights(go.len(), &mut rng);
        let disgenet_weights = random_weights(disgenet.len(), &mut rng);
        self.write_pretrained("GO", net, &go, &go_weights)?;
        self.write_pretrained("DisGeNet", net, &disgenet, &disgenet_weights)?;

        self.write_correction(net, &go, &disgenet, &mut rng)
    }

    fn write_validation_only_networks(&self) -> Result<()> {
        self.write_node_order("STRING", &[84100, 582, 60, 7157, 1956, 9999])?;
        self.write_node_order("STRING-EXP", &[582, 583, 60])?;
        let mut giant: Vec<u64> = SMALL_NET_GENES.to_vec();
        giant.push(9999);
        self.write_node_order("GIANT-TN", &giant)
    }

    // ── Shared writers ──────────────────────────────────────────────────────

    fn write_node_order(&self, net: &str, ids: &[u64]) -> Result<()> {
        let lines: Vec<String> = ids.iter().map(u64::to_string).collect();
        self.write_lines(&format!("NodeOrder_{net}.txt"), &lines)
    }

    fn write_gsc(&self, gsc: &str, net: &str, terms: &[(&str, &str, Vec<u64>)], universe: &[u64]) -> Result<()> {
        let mut sets = Map::new();
        for (id, name, genes) in terms {
            let genes: Vec<String> = genes.iter().map(u64::to_string).collect();
            sets.insert(id.to_string(), json!({ "Name": name, "Genes": genes }));
        }
        self.write_json(&format!("GSC_{gsc}_{net}_GoodSets.json"), &Value::Object(sets))?;
        let lines: Vec<String> = universe.iter().map(u64::to_string).collect();
        self.write_lines(&format!("GSC_{gsc}_{net}_universe.txt"), &lines)
    }

    fn write_pretrained(
        &self,
        target: &str,
        net: &str,
        terms: &[(&str, &str, Vec<u64>)],
        weights: &[Vec<f64>],
    ) -> Result<()> {
        let mut lib = Map::new();
        for ((id, name, genes), w) in terms.iter().zip(weights) {
            let genes: Vec<String> = genes.iter().map(u64::to_string).collect();
            lib.insert(id.to_string(), json!({ "Name": name, "Weights": w, "PosGenes": genes }));
        }
        self.write_json(&format!("PreTrainedWeights_{target}_{net}_Embedding.json"), &Value::Object(lib))
    }

    /// Correction data for every (training GSC, target set) pair.
    fn write_correction(
        &self,
        net: &str,
        go: &[(&str, &str, Vec<u64>)],
        disgenet: &[(&str, &str, Vec<u64>)],
        rng: &mut StdRng,
    ) -> Result<()> {
        for (target, terms) in [("GO", go), ("DisGeNet", disgenet)] {
            // Reverse of the library order, so lookups cannot rely on position.
            let order: Vec<String> = terms.iter().rev().map(|(id, _, _)| id.to_string()).collect();
            self.write_lines(&format!("CorrectionMatrixOrder_{target}_{net}.txt"), &order)?;
            for gsc in ["GO", "DisGeNet"] {
                let rows: Vec<Vec<f64>> = (0..PANEL_ROWS)
                    .map(|_| (0..order.len()).map(|_| rng.gen_range(-0.6..0.6)).collect())
                    .collect();
                self.write_tsv(&format!("CorrectionMatrix_{gsc}_{target}_{net}_Embedding.tsv"), &rows)?;
            }
        }
        Ok(())
    }

    fn write_lines(&self, name: &str, lines: &[String]) -> Result<()> {
        let mut body = lines.join("\n");
        body.push('\n');
        fs::write(self.path().join(name), body).with_context(|| format!("Failed to write {name}"))
    }

    fn write_tsv(&self, name: &str, rows: &[Vec<f64>]) -> Result<()> {
        let lines: Vec<String> = rows
            .iter()
            .map(|r| r.iter().map(|v| format!("{v:.6}")).collect::<Vec<_>>().join("\t"))
            .collect();
        self.write_lines(name, &lines)
    }

    fn write_json(&self, name: &str, value: &Value) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        fs::write(self.path().join(name), body).with_context(|| format!("Failed to write {name}"))
    }
}

/// Entrez IDs of `SynthNet`, in node order.
pub fn large_ids() -> Vec<u64> {
    (LARGE_FIRST_ID..LARGE_FIRST_ID + LARGE_NET_SIZE as u64).collect()
}

pub fn is_large_positive(id: u64) -> bool {
    (LARGE_FIRST_ID..LARGE_FIRST_ID + LARGE_POSITIVES as u64).contains(&id)
}

pub fn large_symbol(id: u64) -> String {
    format!("SYN{}", id - LARGE_FIRST_ID + 1)
}

/// Symbols of the twenty `SynthNet` positives.
pub fn large_query() -> Vec<String> {
    large_ids().into_iter().filter(|id| is_large_positive(*id)).map(large_symbol).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_files_written() {
        let ds = SyntheticDataset::create().unwrap();
        for name in [
            "NodeOrder_BioGRID.txt",
            "Data_Embedding_SynthNet.tsv",
            "CorrectionMatrix_GO_DisGeNet_BioGRID_Embedding.tsv",
            "PreTrainedWeights_GO_SynthNet_Embedding.json",
            "IDconversion_Homo-sapiens_ENST-to-Entrez.json",
        ] {
            assert!(ds.path().join(name).exists(), "{name} missing");
        }
        let features = fs::read_to_string(ds.path().join("Data_Embedding_SynthNet.tsv")).unwrap();
        assert_eq!(features.lines().count(), LARGE_NET_SIZE);
    }

    #[test]
    fn test_large_query() {
        let q = large_query();
        assert_eq!(q.len(), LARGE_POSITIVES);
        assert_eq!(q[0], "SYN1");
    }
}

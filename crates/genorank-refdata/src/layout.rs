//! File naming of the local reference store.

use genorank_common::{FeatureType, GscName, IdSourceType, NetworkType, Selection};

const SPECIES: &str = "Homo-sapiens";

pub fn conversion_file(source: IdSourceType) -> String {
    format!("IDconversion_{SPECIES}_{source}-to-Entrez.json")
}

pub fn symbol_file() -> String {
    format!("IDconversion_{SPECIES}_Entrez-to-Symbol.json")
}

pub fn name_file() -> String {
    format!("IDconversion_{SPECIES}_Entrez-to-Name.json")
}

pub fn node_order_file(net: &NetworkType) -> String {
    format!("NodeOrder_{net}.txt")
}

pub fn edgelist_file(net: &NetworkType) -> String {
    format!("Edgelist_{net}.edg")
}

pub fn features_file(features: FeatureType, net: &NetworkType) -> String {
    format!("Data_{features}_{net}.tsv")
}

pub fn good_sets_file(gsc: GscName, net: &NetworkType) -> String {
    format!("GSC_{gsc}_{net}_GoodSets.json")
}

pub fn universe_file(gsc: GscName, net: &NetworkType) -> String {
    format!("GSC_{gsc}_{net}_universe.txt")
}

pub fn pretrained_file(target: GscName, net: &NetworkType, features: FeatureType) -> String {
    format!("PreTrainedWeights_{target}_{net}_{features}.json")
}

pub fn correction_order_file(target: GscName, net: &NetworkType) -> String {
    format!("CorrectionMatrixOrder_{target}_{net}.txt")
}

pub fn correction_matrix_file(gsc: GscName, target: GscName, net: &NetworkType, features: FeatureType) -> String {
    format!("CorrectionMatrix_{gsc}_{target}_{net}_{features}.tsv")
}

/// Files a custom network must ship besides its node order.
pub fn custom_companion_files(selection: &Selection) -> Vec<String> {
    vec![
        features_file(selection.features, &selection.net_type),
        good_sets_file(selection.gsc, &selection.net_type),
        universe_file(selection.gsc, &selection.net_type),
    ]
}

/// Every file a full run of `selection` reads, similarity targets included.
/// Conversion maps are excluded: they are loaded lazily, per source type.
pub fn required_files(selection: &Selection, targets: &[GscName]) -> Vec<String> {
    let net = &selection.net_type;
    let mut files = vec![node_order_file(net), edgelist_file(net), symbol_file(), name_file()];
    files.extend(custom_companion_files(selection));
    for &target in targets {
        files.push(pretrained_file(target, net, selection.features));
        files.push(correction_order_file(target, net));
        files.push(correction_matrix_file(selection.gsc, target, net, selection.features));
    }
    files
}

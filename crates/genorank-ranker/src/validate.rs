//! Network membership summary for resolved input genes.

use std::collections::BTreeSet;

use genorank_common::{GeneId, NetworkType, Result};
use serde::Serialize;
use tracing::{info, instrument};

use crate::reference_provider::ReferenceDataProvider;
use crate::resolve::{ConversionRecord, Resolution};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub network: NetworkType,
    pub network_genes: usize,
    pub positive_genes: usize,
}

/// A conversion record plus one membership flag per validated network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRow {
    pub record: ConversionRecord,
    /// Same order as `ValidationReport::summaries`.
    pub in_network: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Number of non-blank input identifiers.
    pub input_count: usize,
    pub summaries: Vec<NetworkSummary>,
    pub rows: Vec<AuditRow>,
}

/// Audit view restricted to one network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSubset {
    pub network: NetworkType,
    pub positive_genes: usize,
    pub rows: Vec<(ConversionRecord, bool)>,
}

impl ValidationReport {
    pub fn subset(&self, net: &NetworkType) -> Option<ValidationSubset> {
        let col = self.summaries.iter().position(|s| &s.network == net)?;
        Some(ValidationSubset {
            network: net.clone(),
            positive_genes: self.summaries[col].positive_genes,
            rows: self
                .rows
                .iter()
                .map(|r| (r.record.clone(), r.in_network[col]))
                .collect(),
        })
    }
}

/// Count resolved genes per network and flag each audit row.
///
/// A row is in a network if any of its resolved IDs is.
#[instrument(skip_all, fields(networks = networks.len()))]
pub fn validate_membership(
    provider: &dyn ReferenceDataProvider,
    resolution: &Resolution,
    networks: &[NetworkType],
) -> Result<ValidationReport> {
    let resolved: BTreeSet<GeneId> = resolution.genes.iter().copied().collect();

    let mut summaries = Vec::with_capacity(networks.len());
    let mut flags: Vec<Vec<bool>> = vec![Vec::with_capacity(networks.len()); resolution.records.len()];

    for net in networks {
        let genes = provider.network_genes(net)?;
        let positive_genes = resolved.iter().filter(|g| genes.contains(**g)).count();
        info!(net = %net, network_genes = genes.len(), positive_genes, "Validated network membership");
        summaries.push(NetworkSummary {
            network: net.clone(),
            network_genes: genes.len(),
            positive_genes,
        });
        for (row, record) in flags.iter_mut().zip(&resolution.records) {
            row.push(record.resolved_ids.iter().any(|g| genes.contains(*g)));
        }
    }

    let rows = resolution
        .records
        .iter()
        .cloned()
        .zip(flags)
        .map(|(record, in_network)| AuditRow { record, in_network })
        .collect();

    Ok(ValidationReport {
        input_count: resolution.records.len(),
        summaries,
        rows,
    })
}

//! Identifier resolution: raw input strings to canonical `GeneId`s.
//!
//! Numeric input is taken as an Entrez ID directly. Anything else is
//! upper-cased and looked up in the conversion maps, first match wins, in
//! the configured source priority. Maps are loaded lazily: a fully numeric
//! query never touches them.

use std::collections::HashSet;
use std::sync::Arc;

use genorank_common::refdata::ConversionMap;
use genorank_common::{GeneId, IdSourceType, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::reference_provider::ReferenceDataProvider;

/// Audit text for inputs that matched nothing.
pub const UNMAPPED_LABEL: &str = "Could Not be mapped to Entrez";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "source")]
pub enum ResolutionStatus {
    /// Input was already a numeric gene ID.
    Direct,
    Converted(IdSourceType),
    Unmapped,
}

/// Audit entry for one input identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRecord {
    pub original_id: String,
    pub resolved_ids: Vec<GeneId>,
    pub status: ResolutionStatus,
}

impl ConversionRecord {
    /// Resolved IDs joined with `/`, or the unmapped label.
    pub fn mapped_to(&self) -> String {
        if self.resolved_ids.is_empty() {
            UNMAPPED_LABEL.to_string()
        } else {
            self.resolved_ids.iter().map(GeneId::to_string).collect::<Vec<_>>().join("/")
        }
    }
}

/// Output of the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// Every resolved ID, in input order, without repeats.
    pub genes: Vec<GeneId>,
    /// One record per non-blank input, in input order.
    pub records: Vec<ConversionRecord>,
}

impl Resolution {
    pub fn unmapped(&self) -> impl Iterator<Item = &ConversionRecord> {
        self.records.iter().filter(|r| r.status == ResolutionStatus::Unmapped)
    }
}

/// Conversion maps in priority order, each loaded on first need.
struct LazyMaps<'a> {
    provider: &'a dyn ReferenceDataProvider,
    priority: &'a [IdSourceType],
    loaded: Vec<Option<Arc<ConversionMap>>>,
}

impl<'a> LazyMaps<'a> {
    fn new(provider: &'a dyn ReferenceDataProvider, priority: &'a [IdSourceType]) -> Self {
        Self { provider, priority, loaded: vec![None; priority.len()] }
    }

    fn lookup(&mut self, key: &str) -> Result<Option<(IdSourceType, Vec<GeneId>)>> {
        for (slot, &source) in self.priority.iter().enumerate() {
            if self.loaded[slot].is_none() {
                self.loaded[slot] = Some(self.provider.conversion_map(source)?);
            }
            if let Some(map) = &self.loaded[slot] {
                if let Some(ids) = map.get(key) {
                    return Ok(Some((source, ids.to_vec())));
                }
            }
        }
        Ok(None)
    }
}

/// Resolve `inputs` against the provider's conversion maps.
///
/// Unmapped inputs are recorded, not treated as errors; only a failure to
/// load a conversion map is an error.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn resolve_identifiers(
    provider: &dyn ReferenceDataProvider,
    inputs: &[String],
    priority: &[IdSourceType],
) -> Result<Resolution> {
    let mut maps = LazyMaps::new(provider, priority);
    let mut genes = Vec::new();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(inputs.len());

    for raw in inputs {
        let original = raw.trim();
        if original.is_empty() {
            continue;
        }
        let record = if let Ok(id) = original.parse::<GeneId>() {
            ConversionRecord {
                original_id: original.to_string(),
                resolved_ids: vec![id],
                status: ResolutionStatus::Direct,
            }
        } else {
            match maps.lookup(&original.to_uppercase())? {
                Some((source, ids)) => ConversionRecord {
                    original_id: original.to_string(),
                    resolved_ids: ids,
                    status: ResolutionStatus::Converted(source),
                },
                None => {
                    debug!(input = original, "Identifier not mapped");
                    ConversionRecord {
                        original_id: original.to_string(),
                        resolved_ids: Vec::new(),
                        status: ResolutionStatus::Unmapped,
                    }
                }
            }
        };
        for id in &record.resolved_ids {
            if seen.insert(*id) {
                genes.push(*id);
            }
        }
        records.push(record);
    }

    let unmapped = records.iter().filter(|r| r.status == ResolutionStatus::Unmapped).count();
    info!(resolved = genes.len(), unmapped, "Resolved input identifiers");
    Ok(Resolution { genes, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_provider::MockReferenceProvider;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn provider() -> MockReferenceProvider {
        MockReferenceProvider::new()
            .with_conversion(IdSourceType::Ensg, "ENSG00000113966", &[84100])
            .with_conversion(IdSourceType::Symbol, "ARL6", &[84100])
            .with_conversion(IdSourceType::Symbol, "BBS1", &[582])
            .with_conversion(IdSourceType::Symbol, "MULTI", &[582, 583])
            .with_conversion(IdSourceType::Ensp, "BBS1", &[999])
    }

    #[test]
    fn test_numeric_input_is_direct_without_lookups() {
        let p = provider();
        let res = resolve_identifiers(&p, &strings(&["582", " 84100 ", "582"]), &IdSourceType::DEFAULT_PRIORITY).unwrap();
        assert_eq!(res.genes, vec![GeneId::new(582), GeneId::new(84100)]);
        assert!(res.records.iter().all(|r| r.status == ResolutionStatus::Direct));
        assert_eq!(res.records.len(), 3);
        assert_eq!(p.conversion_lookups(), 0);
    }

    #[test]
    fn test_case_insensitive_and_priority_order() {
        let p = provider();
        let res = resolve_identifiers(&p, &strings(&["bbs1", "ensg00000113966"]), &IdSourceType::DEFAULT_PRIORITY).unwrap();
        // Symbol outranks ENSP.
        assert_eq!(res.records[0].status, ResolutionStatus::Converted(IdSourceType::Symbol));
        assert_eq!(res.records[0].resolved_ids, vec![GeneId::new(582)]);
        assert_eq!(res.records[1].status, ResolutionStatus::Converted(IdSourceType::Ensg));
    }

    #[test]
    fn test_custom_priority() {
        let p = provider();
        let res = resolve_identifiers(&p, &strings(&["BBS1"]), &[IdSourceType::Ensp, IdSourceType::Symbol]).unwrap();
        assert_eq!(res.genes, vec![GeneId::new(999)]);
    }

    #[test]
    fn test_multi_mapping_joined() {
        let res = resolve_identifiers(&provider(), &strings(&["MULTI"]), &IdSourceType::DEFAULT_PRIORITY).unwrap();
        assert_eq!(res.records[0].mapped_to(), "582/583");
        assert_eq!(res.genes.len(), 2);
    }

    #[test]
    fn test_unmapped_recorded_not_error() {
        let res = resolve_identifiers(&provider(), &strings(&["NOPE", "", "ARL6"]), &IdSourceType::DEFAULT_PRIORITY).unwrap();
        assert_eq!(res.records.len(), 2);
        assert_eq!(res.records[0].status, ResolutionStatus::Unmapped);
        assert_eq!(res.records[0].mapped_to(), UNMAPPED_LABEL);
        assert_eq!(res.unmapped().count(), 1);
        assert_eq!(res.genes, vec![GeneId::new(84100)]);
    }
}

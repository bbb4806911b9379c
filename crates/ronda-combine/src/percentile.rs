//! Sector-relative percentiles.

use std::collections::BTreeMap;

use ronda_traits::stats::average_ranks;

use crate::scorer::ScoredEntity;

/// Percentile of a lone entity in its sector.
pub const LONE_ENTITY_PERCENTILE: f64 = 50.0;

/// Assign each entity the percentile of its composite among same-sector peers.
///
/// Ties share the average rank; `pct = 100 * (rank - 1) / (n - 1)`. Sector
/// names are compared exactly as reported by the provider.
pub fn assign_sector_percentiles(entities: &mut [ScoredEntity]) {
    let mut sectors: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, entity) in entities.iter().enumerate() {
        sectors.entry(entity.sector().to_string()).or_default().push(idx);
    }

    for members in sectors.values() {
        if members.len() == 1 {
            entities[members[0]].score.sector_percentile = LONE_ENTITY_PERCENTILE;
            continue;
        }
        let composites: Vec<f64> = members.iter().map(|&i| entities[i].composite()).collect();
        let ranks = average_ranks(&composites);
        let span = (members.len() - 1) as f64;
        for (&idx, rank) in members.iter().zip(ranks) {
            entities[idx].score.sector_percentile = 100.0 * (rank - 1.0) / span;
        }
    }
}

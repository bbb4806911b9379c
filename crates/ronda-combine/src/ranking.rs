//! Final ordering of scored entities.

use ronda_traits::stats::MIN_STD_THRESHOLD;

use crate::scorer::ScoredEntity;

/// Filter, order and normalize scored entities.
///
/// - Entities below `min_quality` are dropped.
/// - The rest are sorted by composite, highest first, ties by ascending symbol.
/// - At most `max_results` are kept.
/// - `normalized` is the min-max scaled composite over the kept set; when
///   every composite is equal it is 1.
#[must_use]
pub fn rank(
    entities: Vec<ScoredEntity>,
    min_quality: Option<f64>,
    max_results: Option<usize>,
) -> Vec<ScoredEntity> {
    let mut ranked: Vec<ScoredEntity> = entities
        .into_iter()
        .filter(|e| min_quality.is_none_or(|min| e.composite() >= min))
        .collect();
    ranked.sort_by(|a, b| {
        b.composite()
            .total_cmp(&a.composite())
            .then_with(|| a.symbol().cmp(b.symbol()))
    });
    if let Some(limit) = max_results {
        ranked.truncate(limit);
    }

    let (min, max) = ranked.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.composite()), hi.max(e.composite()))
    });
    let range = max - min;
    for entity in &mut ranked {
        entity.score.normalized = if range > MIN_STD_THRESHOLD {
            (entity.composite() - min) / range
        } else {
            1.0
        };
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::entity;
    use approx::assert_relative_eq;

    fn symbols(entities: &[ScoredEntity]) -> Vec<&str> {
        entities.iter().map(ScoredEntity::symbol).collect()
    }

    #[test]
    fn test_order_and_tie_break() {
        let ranked = rank(
            vec![
                entity("MSFT", "Technology", 0.7),
                entity("AAPL", "Technology", 0.7),
                entity("XOM", "Energy", 0.9),
                entity("KO", "Consumer Defensive", 0.4),
            ],
            None,
            None,
        );
        assert_eq!(symbols(&ranked), ["XOM", "AAPL", "MSFT", "KO"]);
        assert_relative_eq!(ranked[0].score.normalized, 1.0);
        assert_relative_eq!(ranked[1].score.normalized, 0.6, epsilon = 1e-12);
        assert_relative_eq!(ranked[3].score.normalized, 0.0);
    }

    #[test]
    fn test_min_quality_and_limit() {
        let ranked = rank(
            vec![
                entity("A", "Technology", 0.8),
                entity("B", "Technology", 0.6),
                entity("C", "Technology", 0.59),
                entity("D", "Technology", 0.95),
            ],
            Some(0.6),
            Some(2),
        );
        assert_eq!(symbols(&ranked), ["D", "A"]);
    }

    #[test]
    fn test_degenerate_sets() {
        assert!(rank(Vec::new(), Some(0.5), None).is_empty());
        let single = rank(vec![entity("ONLY", "Energy", 0.3)], None, None);
        assert_relative_eq!(single[0].score.normalized, 1.0);
    }
}

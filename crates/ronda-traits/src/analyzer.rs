//! Analyzer trait for factor scoring.

use crate::{FinancialRecord, SectorBenchmark, SubScore};

/// A factor analyzer that scores one entity.
///
/// Analyzers are pure: the same record and benchmark always produce the same
/// [`SubScore`]. They are total over their domain, so gaps, zero denominators
/// and negative values map to a defined score instead of an error.
/// Implementations must be `Send + Sync` so a single instance can be shared
/// across entity pipelines.
///
/// # Example
///
/// ```
/// use ronda_traits::{Analyzer, FinancialRecord, SectorBenchmark, SubScore};
///
/// struct Flat;
///
/// impl Analyzer for Flat {
///     fn name(&self) -> &str {
///         "flat"
///     }
///
///     fn analyze(&self, _record: &FinancialRecord, _benchmark: &SectorBenchmark) -> SubScore {
///         SubScore::new(0.5)
///     }
/// }
/// ```
pub trait Analyzer: Send + Sync {
    /// Factor name used in logs and score breakdowns.
    fn name(&self) -> &str;

    /// Score `record` against its sector `benchmark`.
    fn analyze(&self, record: &FinancialRecord, benchmark: &SectorBenchmark) -> SubScore;
}

use crate::{RatioError, RatioReport, RawFinancials};

/// Trait for ratio engines
pub trait RatioCalculator: Send + Sync {
    fn compute(
        &self,
        raw: &RawFinancials,
        growth_window_years: u32,
    ) -> Result<RatioReport, RatioError>;
}

/// Trait for anything that can hand over a snapshot for a symbol.
///
/// Implementations absorb their own fetch or parse failures and return `None`;
/// nothing provider-specific ever reaches the engine as an error.
pub trait SnapshotSource {
    fn snapshot(&self, symbol: &str) -> Option<RawFinancials>;

    fn symbols(&self) -> Vec<String>;
}

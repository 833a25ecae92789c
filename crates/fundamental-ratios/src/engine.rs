use ratio_core::{
    EpsPoint, RatioCalculator, RatioError, RatioKind, RatioReport, RatioValue, RawFinancials,
    UnavailableReason,
};
use rayon::prelude::*;

/// EPS growth is measured over three fiscal years unless the caller says otherwise.
pub const DEFAULT_GROWTH_WINDOW_YEARS: u32 = 3;

/// Computes the fixed ratio set for one snapshot.
///
/// Every ratio is either `Computed` or `Unavailable` with a reason; the engine
/// never stores an infinity or NaN and never rounds. The only errors are
/// caller contract violations (see [`RatioError`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioEngine {
    growth_window_years: u32,
}

impl RatioEngine {
    pub fn new() -> Self {
        Self {
            growth_window_years: DEFAULT_GROWTH_WINDOW_YEARS,
        }
    }

    pub fn with_growth_window(growth_window_years: u32) -> Result<Self, RatioError> {
        check_growth_window(growth_window_years)?;
        Ok(Self {
            growth_window_years,
        })
    }

    pub fn growth_window_years(&self) -> u32 {
        self.growth_window_years
    }

    /// Computes with the engine's own growth window.
    pub fn compute_default(&self, raw: &RawFinancials) -> Result<RatioReport, RatioError> {
        compute(raw, self.growth_window_years)
    }

    /// Computes many snapshots in parallel; results come back in input order.
    pub fn compute_batch(&self, raws: &[RawFinancials]) -> Vec<Result<RatioReport, RatioError>> {
        compute_batch(raws, self.growth_window_years)
    }
}

impl Default for RatioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RatioCalculator for RatioEngine {
    fn compute(
        &self,
        raw: &RawFinancials,
        growth_window_years: u32,
    ) -> Result<RatioReport, RatioError> {
        compute(raw, growth_window_years)
    }
}

/// Computes every ratio in [`RatioKind::ALL`] for `raw`.
pub fn compute(raw: &RawFinancials, growth_window_years: u32) -> Result<RatioReport, RatioError> {
    check_growth_window(growth_window_years)?;
    raw.validate()?;

    let pe = pass_through(raw.price_to_earnings);
    let eps_growth = calculate_eps_growth(&raw.eps_history, growth_window_years);

    let mut report = RatioReport::new(raw.symbol.clone(), raw.as_of);
    report.insert(RatioKind::Pe, pe);
    report.insert(RatioKind::Pb, pass_through(raw.price_to_book));
    report.insert(RatioKind::Peg, calculate_peg(pe, eps_growth));
    report.insert(
        RatioKind::CurrentRatio,
        checked_ratio(raw.current_assets, raw.current_liabilities),
    );
    report.insert(
        RatioKind::AssetTurnover,
        checked_ratio(raw.total_revenue, raw.total_assets),
    );
    report.insert(
        RatioKind::NetMargin,
        checked_ratio(raw.net_income, raw.total_revenue),
    );
    report.insert(RatioKind::EpsGrowth, eps_growth);

    tracing::debug!(
        symbol = %report.symbol,
        computed = report.computed_count(),
        "Computed ratio report"
    );

    Ok(report)
}

/// One independent computation per snapshot, spread over the rayon pool.
pub fn compute_batch(
    raws: &[RawFinancials],
    growth_window_years: u32,
) -> Vec<Result<RatioReport, RatioError>> {
    raws.par_iter()
        .map(|raw| compute(raw, growth_window_years))
        .collect()
}

fn check_growth_window(growth_window_years: u32) -> Result<(), RatioError> {
    if growth_window_years < 1 {
        return Err(RatioError::InvalidGrowthWindow(growth_window_years));
    }
    Ok(())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn pass_through(value: Option<f64>) -> RatioValue {
    match finite(value) {
        Some(v) => RatioValue::Computed(v),
        None => RatioValue::Unavailable(UnavailableReason::MissingInput),
    }
}

fn divide(numerator: f64, denominator: f64) -> RatioValue {
    if denominator == 0.0 {
        return RatioValue::Unavailable(UnavailableReason::DivisionByZero);
    }
    let value = numerator / denominator;
    // A subnormal denominator can still overflow to infinity.
    if value.is_finite() {
        RatioValue::Computed(value)
    } else {
        RatioValue::Unavailable(UnavailableReason::DivisionByZero)
    }
}

pub(crate) fn checked_ratio(numerator: Option<f64>, denominator: Option<f64>) -> RatioValue {
    match (finite(numerator), finite(denominator)) {
        (Some(n), Some(d)) => divide(n, d),
        _ => RatioValue::Unavailable(UnavailableReason::MissingInput),
    }
}

/// Percentage change between the latest EPS and the EPS `growth_window_years - 1`
/// periods back, capped at the oldest period available.
pub(crate) fn calculate_eps_growth(history: &[EpsPoint], growth_window_years: u32) -> RatioValue {
    if history.len() < 2 {
        return RatioValue::Unavailable(UnavailableReason::InsufficientHistory);
    }

    let latest = history[0].diluted_eps;
    let n = (growth_window_years.saturating_sub(1) as usize).min(history.len() - 1);
    let old = history[n].diluted_eps;

    match divide(latest - old, old.abs()) {
        RatioValue::Computed(fraction) => {
            let percent = fraction * 100.0;
            if percent.is_finite() {
                RatioValue::Computed(percent)
            } else {
                RatioValue::Unavailable(UnavailableReason::DivisionByZero)
            }
        }
        unavailable => unavailable,
    }
}

/// PE divided by EPS growth expressed as a percentage number.
pub(crate) fn calculate_peg(pe: RatioValue, eps_growth: RatioValue) -> RatioValue {
    match (pe, eps_growth) {
        (RatioValue::Computed(pe), RatioValue::Computed(growth)) => divide(pe, growth),
        _ => RatioValue::Unavailable(UnavailableReason::MissingInput),
    }
}

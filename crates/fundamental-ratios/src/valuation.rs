use ratio_core::{RatioValue, RawFinancials, UnavailableReason};

/// P/E Graham assigns to a company with no growth.
pub const GRAHAM_BASE_MULTIPLE: f64 = 8.5;

/// Graham's intrinsic value per share: `eps * (8.5 + 2 * g)`, with `g` the
/// expected earnings growth as a percentage number.
pub fn graham_intrinsic_value(trailing_eps: Option<f64>, growth_percent: Option<f64>) -> RatioValue {
    let eps = trailing_eps.filter(|v| v.is_finite());
    let growth = growth_percent.filter(|v| v.is_finite());

    match (eps, growth) {
        (Some(eps), Some(growth)) => {
            let value = eps * (GRAHAM_BASE_MULTIPLE + 2.0 * growth);
            if value.is_finite() {
                RatioValue::Computed(value)
            } else {
                RatioValue::Unavailable(UnavailableReason::MissingInput)
            }
        }
        _ => RatioValue::Unavailable(UnavailableReason::MissingInput),
    }
}

/// Intrinsic value from the snapshot's trailing EPS and the provider's
/// fractional earnings growth. No growth figure means no value.
pub fn intrinsic_value(raw: &RawFinancials) -> RatioValue {
    graham_intrinsic_value(raw.trailing_eps, raw.earnings_growth.map(|g| g * 100.0))
}

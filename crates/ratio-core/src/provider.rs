//! Mapping from provider-shaped snapshots into [`RawFinancials`].
//!
//! Quote APIs return numbers, ratio websites return display strings such as
//! `"1,234.5"` or `"23.4 %"`, and both leave gaps. Everything in here is
//! lenient: anything that cannot be read as a finite number becomes `None`.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::{EpsPoint, RatioError, RawFinancials, Shareholding};

/// How a provider scales a ratio field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    /// 0.12 means 12%
    Fraction,
    /// 12.0 means 12%
    Percent,
}

impl Scale {
    pub fn to_fraction(&self, value: f64) -> f64 {
        match self {
            Scale::Fraction => value,
            Scale::Percent => value / 100.0,
        }
    }
}

impl FromStr for Scale {
    type Err = RatioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fraction" => Ok(Scale::Fraction),
            "percent" | "percentage" => Ok(Scale::Percent),
            other => Err(RatioError::InvalidInput(format!(
                "unknown scale '{other}' (expected 'fraction' or 'percent')"
            ))),
        }
    }
}

/// Unit conventions of a particular provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConvention {
    pub dividend_yield: Scale,
    pub debt_to_equity: Scale,
    pub shareholding: Scale,
}

impl Default for UnitConvention {
    fn default() -> Self {
        // Yahoo-style quotes report D/E multiplied by 100; shareholding
        // patterns are scraped as "50.3 %".
        Self {
            dividend_yield: Scale::Fraction,
            debt_to_equity: Scale::Percent,
            shareholding: Scale::Percent,
        }
    }
}

/// A provider snapshot, keyed the way quote APIs name their fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSnapshot {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub as_of: Option<NaiveDate>,

    #[serde(default, rename = "trailingPE", deserialize_with = "lenient_f64")]
    pub trailing_pe: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_to_book: Option<f64>,
    #[serde(
        default,
        rename = "priceToSalesTrailing12Months",
        deserialize_with = "lenient_f64"
    )]
    pub price_to_sales: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub trailing_eps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub return_on_equity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub return_on_assets: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub debt_to_equity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dividend_yield: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub book_value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub profit_margins: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub earnings_growth: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_revenue: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub net_income_to_common: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_current_assets: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_current_liabilities: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_assets: Option<f64>,

    // Shareholding pattern
    #[serde(default, deserialize_with = "lenient_f64")]
    pub promoter_holding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub fii_holding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub dii_holding: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub public_holding: Option<f64>,

    /// Diluted EPS per fiscal year, most recent first.
    #[serde(default, deserialize_with = "lenient_f64_list")]
    pub diluted_eps_history: Vec<Option<f64>>,
}

impl ProviderSnapshot {
    pub fn into_raw(self, symbol: &str, units: &UnitConvention) -> RawFinancials {
        // Positions are period indices, so a gap ends the usable history.
        let eps_history: Vec<EpsPoint> = self
            .diluted_eps_history
            .iter()
            .map_while(|v| v.and_then(finite))
            .enumerate()
            .map(|(i, eps)| EpsPoint::new(i as u32, eps))
            .collect();

        if eps_history.len() < self.diluted_eps_history.len() {
            tracing::debug!(
                symbol,
                kept = eps_history.len(),
                reported = self.diluted_eps_history.len(),
                "EPS history truncated at first missing period"
            );
        }

        let holding = |v: Option<f64>| {
            v.and_then(finite)
                .map(|v| units.shareholding.to_fraction(v))
        };

        let mut raw = RawFinancials {
            symbol: symbol.trim().to_string(),
            company_name: self.long_name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            sector: self.sector.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            as_of: self.as_of,
            price_to_earnings: self.trailing_pe.and_then(finite),
            price_to_book: self.price_to_book.and_then(finite),
            price_to_sales: self.price_to_sales.and_then(finite),
            trailing_eps: self.trailing_eps.and_then(finite),
            return_on_equity: self.return_on_equity.and_then(finite),
            return_on_assets: self.return_on_assets.and_then(finite),
            debt_to_equity: self
                .debt_to_equity
                .and_then(finite)
                .map(|v| units.debt_to_equity.to_fraction(v)),
            dividend_yield: self
                .dividend_yield
                .and_then(finite)
                .map(|v| units.dividend_yield.to_fraction(v)),
            current_price: self.current_price.and_then(finite),
            book_value: self.book_value.and_then(finite),
            fifty_two_week_high: self.fifty_two_week_high.and_then(finite),
            fifty_two_week_low: self.fifty_two_week_low.and_then(finite),
            profit_margin: self.profit_margins.and_then(finite),
            earnings_growth: self.earnings_growth.and_then(finite),
            market_cap: self.market_cap.and_then(finite),
            total_revenue: self.total_revenue.and_then(finite),
            net_income: self.net_income_to_common.and_then(finite),
            current_assets: self.total_current_assets.and_then(finite),
            current_liabilities: self.total_current_liabilities.and_then(finite),
            total_assets: self.total_assets.and_then(finite),
            shareholding: Shareholding {
                promoter: holding(self.promoter_holding),
                fii: holding(self.fii_holding),
                dii: holding(self.dii_holding),
                public: holding(self.public_holding),
            },
            eps_history,
        };

        drop_out_of_range(&mut raw);
        raw
    }
}

/// Provider values that break the record's sign or range rules become absent,
/// so one bad field never costs the whole snapshot.
fn drop_out_of_range(raw: &mut RawFinancials) {
    let symbol = raw.symbol.clone();

    let non_negative: [(&str, &mut Option<f64>); 12] = [
        ("price_to_earnings", &mut raw.price_to_earnings),
        ("price_to_book", &mut raw.price_to_book),
        ("price_to_sales", &mut raw.price_to_sales),
        ("debt_to_equity", &mut raw.debt_to_equity),
        ("current_price", &mut raw.current_price),
        ("fifty_two_week_high", &mut raw.fifty_two_week_high),
        ("fifty_two_week_low", &mut raw.fifty_two_week_low),
        ("market_cap", &mut raw.market_cap),
        ("total_revenue", &mut raw.total_revenue),
        ("current_assets", &mut raw.current_assets),
        ("current_liabilities", &mut raw.current_liabilities),
        ("total_assets", &mut raw.total_assets),
    ];
    for (field, slot) in non_negative {
        if let Some(value) = slot.filter(|v| *v < 0.0) {
            tracing::debug!(%symbol, field, value, "Dropping negative provider value");
            *slot = None;
        }
    }

    let holdings: [(&str, &mut Option<f64>); 4] = [
        ("promoter", &mut raw.shareholding.promoter),
        ("fii", &mut raw.shareholding.fii),
        ("dii", &mut raw.shareholding.dii),
        ("public", &mut raw.shareholding.public),
    ];
    for (field, slot) in holdings {
        if let Some(value) = slot.filter(|v| !(0.0..=1.0).contains(v)) {
            tracing::debug!(%symbol, field, value, "Dropping out-of-range shareholding");
            *slot = None;
        }
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Parses a number as ratio websites display it.
///
/// Accepts thousands separators, a trailing `%`, rupee markers (`₹`, `Rs.`),
/// a `Cr.` unit suffix and accounting-style negatives such as `(12.5)`.
/// Placeholders (`""`, `"N/A"`, `"-"`) and anything non-finite give `None`.
pub fn parse_display_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if matches!(
        trimmed.to_ascii_uppercase().as_str(),
        "N/A" | "NA" | "-" | "--" | "NONE" | "NULL"
    ) {
        return None;
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .replace("Rs.", "")
        .replace("Cr.", "")
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '₹') && !c.is_whitespace())
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    finite(if negative { -value } else { value })
}

fn value_to_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().and_then(finite),
        serde_json::Value::String(s) => parse_display_number(s),
        _ => None,
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

fn lenient_f64_list<'de, D>(deserializer: D) -> Result<Vec<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items.iter().map(value_to_f64).collect(),
        _ => Vec::new(),
    })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::RatioError;

/// One diluted EPS observation. `period_index` 0 is the most recent period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpsPoint {
    pub period_index: u32,
    pub diluted_eps: f64,
}

impl EpsPoint {
    pub fn new(period_index: u32, diluted_eps: f64) -> Self {
        Self {
            period_index,
            diluted_eps,
        }
    }
}

/// Raw per-company financial facts for one reporting snapshot.
///
/// Ratios such as ROE, ROA and dividend yield are fractional (0.12 = 12%).
/// Every optional field is either absent or a finite number; a fetch layer
/// must map provider errors to `None` before handing the record over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFinancials {
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,

    // Valuation
    #[serde(default)]
    pub price_to_earnings: Option<f64>,
    #[serde(default)]
    pub price_to_book: Option<f64>,
    #[serde(default)]
    pub price_to_sales: Option<f64>,
    #[serde(default)]
    pub trailing_eps: Option<f64>,

    // Returns and leverage (fractional)
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub return_on_assets: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,

    // Price
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub book_value: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default)]
    pub fifty_two_week_low: Option<f64>,

    // Income statement
    #[serde(default)]
    pub profit_margin: Option<f64>,
    /// Year-over-year earnings growth as the provider reports it (fractional)
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_revenue: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,

    // Balance sheet
    #[serde(default)]
    pub current_assets: Option<f64>,
    #[serde(default)]
    pub current_liabilities: Option<f64>,
    #[serde(default)]
    pub total_assets: Option<f64>,

    #[serde(default)]
    pub shareholding: Shareholding,

    /// Most recent first.
    #[serde(default)]
    pub eps_history: Vec<EpsPoint>,
}

/// Shareholding pattern, each holder class as a fraction of equity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Shareholding {
    #[serde(default)]
    pub promoter: Option<f64>,
    #[serde(default)]
    pub fii: Option<f64>,
    #[serde(default)]
    pub dii: Option<f64>,
    #[serde(default)]
    pub public: Option<f64>,
}

impl Shareholding {
    pub fn fields(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("shareholding.promoter", self.promoter),
            ("shareholding.fii", self.fii),
            ("shareholding.dii", self.dii),
            ("shareholding.public", self.public),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }
}

impl RawFinancials {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn with_price_to_earnings(mut self, pe: f64) -> Self {
        self.price_to_earnings = Some(pe);
        self
    }

    pub fn with_price_to_book(mut self, pb: f64) -> Self {
        self.price_to_book = Some(pb);
        self
    }

    pub fn with_current_position(mut self, assets: f64, liabilities: f64) -> Self {
        self.current_assets = Some(assets);
        self.current_liabilities = Some(liabilities);
        self
    }

    pub fn with_total_assets(mut self, total_assets: f64) -> Self {
        self.total_assets = Some(total_assets);
        self
    }

    pub fn with_total_revenue(mut self, revenue: f64) -> Self {
        self.total_revenue = Some(revenue);
        self
    }

    pub fn with_net_income(mut self, net_income: f64) -> Self {
        self.net_income = Some(net_income);
        self
    }

    /// Sets the EPS history from most-recent-first values, numbering periods 0, 1, 2...
    pub fn with_eps_history(mut self, eps: &[f64]) -> Self {
        self.eps_history = eps
            .iter()
            .enumerate()
            .map(|(i, &v)| EpsPoint::new(i as u32, v))
            .collect();
        self
    }

    /// Fields that can never be negative, with their current values.
    pub fn non_negative_fields(&self) -> [(&'static str, Option<f64>); 12] {
        [
            ("price_to_earnings", self.price_to_earnings),
            ("price_to_book", self.price_to_book),
            ("price_to_sales", self.price_to_sales),
            ("debt_to_equity", self.debt_to_equity),
            ("current_price", self.current_price),
            ("fifty_two_week_high", self.fifty_two_week_high),
            ("fifty_two_week_low", self.fifty_two_week_low),
            ("market_cap", self.market_cap),
            ("total_revenue", self.total_revenue),
            ("current_assets", self.current_assets),
            ("current_liabilities", self.current_liabilities),
            ("total_assets", self.total_assets),
        ]
    }

    /// Checks the caller contract. Data that is merely missing is fine here;
    /// only values that no fetch layer should ever produce are rejected.
    pub fn validate(&self) -> Result<(), RatioError> {
        if self.symbol.trim().is_empty() {
            return Err(RatioError::InvalidInput("symbol must be non-empty".to_string()));
        }

        for (field, value) in self
            .non_negative_fields()
            .into_iter()
            .chain(self.shareholding.fields())
        {
            if let Some(v) = value {
                if v.is_finite() && v < 0.0 {
                    return Err(RatioError::NegativeInput { field, value: v });
                }
            }
        }

        for (field, value) in self.shareholding.fields() {
            if let Some(v) = value.filter(|v| v.is_finite() && *v > 1.0) {
                return Err(RatioError::InvalidInput(format!(
                    "{field} is a fraction of equity, got {v}"
                )));
            }
        }

        let mut previous: Option<u32> = None;
        for (i, point) in self.eps_history.iter().enumerate() {
            if !point.diluted_eps.is_finite() {
                return Err(RatioError::NonFiniteInput {
                    field: format!("eps_history[{i}]"),
                    value: point.diluted_eps,
                });
            }
            if let Some(prev) = previous {
                if point.period_index <= prev {
                    return Err(RatioError::InvalidInput(format!(
                        "eps_history must be ordered most recent first (period {} follows {})",
                        point.period_index, prev
                    )));
                }
            }
            previous = Some(point.period_index);
        }

        Ok(())
    }
}

/// The fixed set of ratios a report carries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RatioKind {
    #[serde(rename = "PE")]
    Pe,
    #[serde(rename = "PB")]
    Pb,
    #[serde(rename = "PEG")]
    Peg,
    CurrentRatio,
    AssetTurnover,
    NetMargin,
    #[serde(rename = "EPSGrowth")]
    EpsGrowth,
}

impl RatioKind {
    pub const ALL: [RatioKind; 7] = [
        RatioKind::Pe,
        RatioKind::Pb,
        RatioKind::Peg,
        RatioKind::CurrentRatio,
        RatioKind::AssetTurnover,
        RatioKind::NetMargin,
        RatioKind::EpsGrowth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::Pe => "PE",
            RatioKind::Pb => "PB",
            RatioKind::Peg => "PEG",
            RatioKind::CurrentRatio => "CurrentRatio",
            RatioKind::AssetTurnover => "AssetTurnover",
            RatioKind::NetMargin => "NetMargin",
            RatioKind::EpsGrowth => "EPSGrowth",
        }
    }
}

impl std::fmt::Display for RatioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a ratio could not be computed from the data at hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    MissingInput,
    DivisionByZero,
    InsufficientHistory,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailableReason::MissingInput => "missing input",
            UnavailableReason::DivisionByZero => "division by zero",
            UnavailableReason::InsufficientHistory => "insufficient history",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum RatioValue {
    Computed(f64),
    Unavailable(UnavailableReason),
}

impl RatioValue {
    pub fn computed(&self) -> Option<f64> {
        match self {
            RatioValue::Computed(v) => Some(*v),
            RatioValue::Unavailable(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, RatioValue::Computed(_))
    }

    pub fn reason(&self) -> Option<UnavailableReason> {
        match self {
            RatioValue::Computed(_) => None,
            RatioValue::Unavailable(reason) => Some(*reason),
        }
    }
}

/// Ratios computed for one company snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioReport {
    pub symbol: String,
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    pub values: BTreeMap<RatioKind, RatioValue>,
}

impl RatioReport {
    pub fn new(symbol: impl Into<String>, as_of: Option<NaiveDate>) -> Self {
        Self {
            symbol: symbol.into(),
            as_of,
            values: BTreeMap::new(),
        }
    }

    /// A report with every ratio unavailable for the same reason, used when a
    /// symbol had no data at all.
    pub fn unavailable(symbol: impl Into<String>, reason: UnavailableReason) -> Self {
        let mut report = Self::new(symbol, None);
        for kind in RatioKind::ALL {
            report.values.insert(kind, RatioValue::Unavailable(reason));
        }
        report
    }

    pub fn insert(&mut self, kind: RatioKind, value: RatioValue) {
        self.values.insert(kind, value);
    }

    /// Kinds never inserted read as missing input.
    pub fn get(&self, kind: RatioKind) -> RatioValue {
        self.values
            .get(&kind)
            .copied()
            .unwrap_or(RatioValue::Unavailable(UnavailableReason::MissingInput))
    }

    pub fn computed(&self, kind: RatioKind) -> Option<f64> {
        self.get(kind).computed()
    }

    /// Iterates every ratio in display order.
    pub fn iter(&self) -> impl Iterator<Item = (RatioKind, RatioValue)> + '_ {
        RatioKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    pub fn computed_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_computed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_kind_order_and_labels() {
        let labels: Vec<&str> = RatioKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(
            labels,
            vec!["PE", "PB", "PEG", "CurrentRatio", "AssetTurnover", "NetMargin", "EPSGrowth"]
        );

        let mut sorted = RatioKind::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, RatioKind::ALL.to_vec());
    }

    #[test]
    fn test_ratio_value_serialization() {
        let computed = serde_json::to_value(RatioValue::Computed(1.5)).unwrap();
        assert_eq!(computed, serde_json::json!({"status": "computed", "value": 1.5}));

        let missing =
            serde_json::to_value(RatioValue::Unavailable(UnavailableReason::MissingInput)).unwrap();
        assert_eq!(
            missing,
            serde_json::json!({"status": "unavailable", "value": "missing_input"})
        );

        let back: RatioValue = serde_json::from_value(missing).unwrap();
        assert_eq!(back, RatioValue::Unavailable(UnavailableReason::MissingInput));
    }

    #[test]
    fn test_report_get_defaults_to_missing_input() {
        let mut report = RatioReport::new("TCS.NS", None);
        report.insert(RatioKind::Pe, RatioValue::Computed(31.2));

        assert_eq!(report.computed(RatioKind::Pe), Some(31.2));
        assert_eq!(
            report.get(RatioKind::Peg),
            RatioValue::Unavailable(UnavailableReason::MissingInput)
        );
        assert_eq!(report.computed_count(), 1);
        assert_eq!(report.iter().count(), 7);
    }

    #[test]
    fn test_unavailable_report() {
        let report = RatioReport::unavailable("INFY.NS", UnavailableReason::MissingInput);
        assert_eq!(report.computed_count(), 0);
        assert!(report
            .iter()
            .all(|(_, v)| v.reason() == Some(UnavailableReason::MissingInput)));
    }

    #[test]
    fn test_validate_accepts_sparse_record() {
        assert!(RawFinancials::new("RELIANCE.NS").validate().is_ok());

        let raw = RawFinancials::new("RELIANCE.NS")
            .with_net_income(-50.0)
            .with_eps_history(&[-2.0, 1.0]);
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_symbol() {
        let err = RawFinancials::new("  ").validate().unwrap_err();
        assert!(matches!(err, RatioError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_negative_balance_sheet_value() {
        let raw = RawFinancials::new("SBIN.NS").with_current_position(100.0, -5.0);
        assert_eq!(
            raw.validate().unwrap_err(),
            RatioError::NegativeInput {
                field: "current_liabilities",
                value: -5.0
            }
        );
    }

    #[test]
    fn test_validate_rejects_non_finite_eps() {
        let raw = RawFinancials::new("SBIN.NS").with_eps_history(&[10.0, f64::NAN]);
        match raw.validate().unwrap_err() {
            RatioError::NonFiniteInput { field, value } => {
                assert_eq!(field, "eps_history[1]");
                assert!(value.is_nan());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_unordered_history() {
        let mut raw = RawFinancials::new("SBIN.NS");
        raw.eps_history = vec![EpsPoint::new(1, 5.0), EpsPoint::new(0, 4.0)];
        assert!(matches!(
            raw.validate().unwrap_err(),
            RatioError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_validate_shareholding_bounds() {
        let mut raw = RawFinancials::new("ITC.NS");
        raw.shareholding.promoter = Some(0.503);
        raw.shareholding.public = Some(0.0);
        assert!(raw.validate().is_ok());

        raw.shareholding.fii = Some(43.2);
        assert!(matches!(
            raw.validate().unwrap_err(),
            RatioError::InvalidInput(_)
        ));

        raw.shareholding.fii = Some(-0.1);
        assert_eq!(
            raw.validate().unwrap_err(),
            RatioError::NegativeInput {
                field: "shareholding.fii",
                value: -0.1
            }
        );
    }

    #[test]
    fn test_validate_ignores_non_finite_scalars() {
        // Non-finite optional scalars are treated as absent by the engine.
        let raw = RawFinancials::new("SBIN.NS").with_price_to_earnings(f64::NEG_INFINITY);
        assert!(raw.validate().is_ok());
    }
}

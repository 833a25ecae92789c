use ratio_core::{RatioKind, RatioReport, RatioValue, RawFinancials};
use serde::{Deserialize, Serialize};

use crate::valuation::intrinsic_value;

pub const DEFAULT_PRECISION: usize = 2;
pub const DEFAULT_PLACEHOLDER: &str = "N/A";
pub const SYMBOL_LABEL: &str = "Symbol";

/// Rupees per crore
const CRORE: f64 = 1e7;

/// Turns reports into display strings. Rounding happens here and only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFormatter {
    precision: usize,
    placeholder: String,
}

impl Default for ReportFormatter {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

impl ReportFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn format_value(&self, value: RatioValue) -> String {
        match value {
            RatioValue::Computed(v) => self.format_number(v),
            RatioValue::Unavailable(_) => self.placeholder.clone(),
        }
    }

    fn format_number(&self, v: f64) -> String {
        format!("{:.*}", self.precision, v)
    }

    fn format_optional(&self, value: Option<f64>) -> String {
        match value.filter(|v| v.is_finite()) {
            Some(v) => self.format_number(v),
            None => self.placeholder.clone(),
        }
    }

    /// `("Symbol", symbol)` followed by every ratio in [`RatioKind::ALL`] order.
    pub fn format(&self, report: &RatioReport) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(RatioKind::ALL.len() + 1);
        pairs.push((SYMBOL_LABEL, report.symbol.clone()));
        for kind in RatioKind::ALL {
            pairs.push((kind.label(), self.format_value(report.get(kind))));
        }
        pairs
    }

    /// Column labels matching [`ReportFormatter::record`].
    pub fn header(&self) -> Vec<&'static str> {
        std::iter::once(SYMBOL_LABEL)
            .chain(RatioKind::ALL.iter().map(|k| k.label()))
            .collect()
    }

    /// One table row, column order as in [`ReportFormatter::header`].
    pub fn record(&self, report: &RatioReport) -> Vec<String> {
        self.format(report).into_iter().map(|(_, v)| v).collect()
    }

    /// Descriptive snapshot fields, in the units an Indian equity summary
    /// uses: crore for amounts, percent for fractional ratios.
    pub fn key_metrics(&self, raw: &RawFinancials) -> Vec<(&'static str, String)> {
        let text = |s: &Option<String>| s.clone().unwrap_or_else(|| self.placeholder.clone());
        let percent = |v: Option<f64>| self.format_optional(v.map(|x| x * 100.0));
        let crore = |v: Option<f64>| self.format_optional(v.map(|x| x / CRORE));

        vec![
            (SYMBOL_LABEL, raw.symbol.clone()),
            ("Company", text(&raw.company_name)),
            ("Sector", text(&raw.sector)),
            ("Market Cap (₹ Cr)", crore(raw.market_cap)),
            ("Revenue (₹ Cr)", crore(raw.total_revenue)),
            ("P/S Ratio", self.format_optional(raw.price_to_sales)),
            ("EPS (₹)", self.format_optional(raw.trailing_eps)),
            ("ROE (%)", percent(raw.return_on_equity)),
            ("ROA (%)", percent(raw.return_on_assets)),
            ("Dividend Yield (%)", percent(raw.dividend_yield)),
            ("Debt to Equity", self.format_optional(raw.debt_to_equity)),
            ("Current Price (₹)", self.format_optional(raw.current_price)),
            ("Book Value (₹)", self.format_optional(raw.book_value)),
            ("52W High (₹)", self.format_optional(raw.fifty_two_week_high)),
            ("52W Low (₹)", self.format_optional(raw.fifty_two_week_low)),
            ("Profit Margin (%)", percent(raw.profit_margin)),
            ("Intrinsic Value (₹)", self.format_value(intrinsic_value(raw))),
            ("Promoter (%)", percent(raw.shareholding.promoter)),
            ("FII (%)", percent(raw.shareholding.fii)),
            ("DII (%)", percent(raw.shareholding.dii)),
            ("Public (%)", percent(raw.shareholding.public)),
        ]
    }
}

//! ratio-report: compute fundamental ratios for a set of NSE snapshots.
//!
//! Reads a JSON object mapping symbols to provider quote fields (what a fetch
//! job writes), computes the ratio set for each symbol and prints a table.
//!
//! Usage:
//!   cargo run -p ratio-report -- --input snapshots.json
//!   cargo run -p ratio-report -- --input snapshots.json --symbols TCS.NS INFY.NS --growth-years 5
//!   cargo run -p ratio-report -- --input snapshots.json --max-pe 25 --csv nse_ratios.csv

mod config;
mod source;
mod table;

use anyhow::{Context, Result};
use clap::Parser;
use config::ReportConfig;
use fundamental_ratios::{low_pe_screen, RatioEngine, ReportFormatter};
use ratio_core::{RatioReport, RawFinancials, SnapshotSource, UnavailableReason};
use source::JsonFileSource;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ratio-report", about = "Fundamental ratio report for NSE equities")]
struct Cli {
    /// JSON file mapping symbol -> provider snapshot
    #[arg(long)]
    input: PathBuf,

    /// Symbols to report, in output order (default: every symbol in the input)
    #[arg(long, num_args = 1..)]
    symbols: Vec<String>,

    /// Years of EPS history used for growth (overrides RATIO_GROWTH_YEARS)
    #[arg(long)]
    growth_years: Option<u32>,

    /// Decimal places in the output (overrides RATIO_PRECISION)
    #[arg(long)]
    precision: Option<usize>,

    /// Text shown for unavailable ratios (overrides RATIO_PLACEHOLDER)
    #[arg(long)]
    placeholder: Option<String>,

    /// Also list symbols with 0 < P/E < MAX_PE (overrides RATIO_MAX_PE)
    #[arg(long)]
    max_pe: Option<f64>,

    /// Write the ratio table to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print reports as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Print the key metric summary for each company
    #[arg(long)]
    show_metrics: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratio_report=info,fundamental_ratios=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ReportConfig::from_env()?;
    if let Some(years) = cli.growth_years {
        config.growth_years = years;
    }
    if let Some(precision) = cli.precision {
        config.precision = precision;
    }
    if let Some(placeholder) = cli.placeholder.clone() {
        config.placeholder = placeholder;
    }
    if cli.max_pe.is_some() {
        config.max_pe = cli.max_pe;
    }

    let engine = RatioEngine::with_growth_window(config.growth_years)
        .context("invalid growth window")?;
    let formatter = ReportFormatter::new()
        .with_precision(config.precision)
        .with_placeholder(config.placeholder.clone());

    let source = JsonFileSource::load(&cli.input, &config.units)?;
    tracing::info!(
        "Loaded {} snapshots from {}",
        source.len(),
        cli.input.display()
    );

    let symbols = if cli.symbols.is_empty() {
        source.symbols()
    } else {
        cli.symbols.clone()
    };

    let (reports, raws) = build_reports(&engine, &source, &symbols);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("failed to serialize reports")?
        );
    } else {
        println!("{}", table::ratio_table(&formatter, &reports));
    }

    if cli.show_metrics && !raws.is_empty() {
        println!("{}", table::metrics_table(&formatter, &raws));
    }

    if let Some(max_pe) = config.max_pe {
        let cheap: Vec<RatioReport> = low_pe_screen(&reports, max_pe)
            .into_iter()
            .cloned()
            .collect();
        println!("Stocks with P/E < {max_pe}");
        println!("{}", table::ratio_table(&formatter, &cheap));
    }

    if let Some(path) = &cli.csv {
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        table::write_csv(file, &formatter, &reports)?;
        tracing::info!("Saved {} rows to {}", reports.len(), path.display());
    }

    Ok(())
}

/// One report per requested symbol, in request order, paired with the
/// snapshot it was computed from.
///
/// A symbol without a snapshot, or with a snapshot the engine rejects, gets
/// an all-unavailable row so the output always lines up with the request.
fn build_reports(
    engine: &RatioEngine,
    source: &impl SnapshotSource,
    symbols: &[String],
) -> (Vec<RatioReport>, Vec<RawFinancials>) {
    let (raws, found): (Vec<RawFinancials>, Vec<bool>) = symbols
        .iter()
        .map(|symbol| match source.snapshot(symbol) {
            Some(raw) => (raw, true),
            None => (RawFinancials::new(symbol.clone()), false),
        })
        .unzip();

    let mut failed = 0usize;
    let reports: Vec<RatioReport> = engine
        .compute_batch(&raws)
        .into_iter()
        .zip(symbols.iter().zip(&found))
        .map(|(result, (symbol, has_snapshot))| match result {
            Ok(report) if *has_snapshot => report,
            Ok(_) => {
                tracing::warn!(%symbol, "No snapshot available");
                RatioReport::unavailable(symbol.clone(), UnavailableReason::MissingInput)
            }
            Err(e) => {
                failed += 1;
                tracing::error!(%symbol, error = %e, "Rejected snapshot");
                RatioReport::unavailable(symbol.clone(), UnavailableReason::MissingInput)
            }
        })
        .collect();

    tracing::info!(
        "Computed {} reports ({} rejected, {} missing)",
        reports.len(),
        failed,
        found.iter().filter(|f| !**f).count()
    );

    (reports, raws)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratio_core::{EpsPoint, RatioKind, RatioValue, UnitConvention};

    /// Hands out whatever records it was built with, valid or not.
    struct FixedSource(Vec<RawFinancials>);

    impl SnapshotSource for FixedSource {
        fn snapshot(&self, symbol: &str) -> Option<RawFinancials> {
            self.0.iter().find(|raw| raw.symbol == symbol).cloned()
        }

        fn symbols(&self) -> Vec<String> {
            self.0.iter().map(|raw| raw.symbol.clone()).collect()
        }
    }

    #[test]
    fn test_build_reports_in_request_order() {
        let source = JsonFileSource::from_json_str(
            r#"{
                "TCS.NS": {"trailingPE": 30.0, "dilutedEpsHistory": [125.0, 100.0]},
                "INFY.NS": {"trailingPE": 24.0, "totalCurrentAssets": 10.0, "totalCurrentLiabilities": -1.0}
            }"#,
            &UnitConvention::default(),
        )
        .unwrap();
        let symbols = vec![
            "SBIN.NS".to_string(),
            "INFY.NS".to_string(),
            "TCS.NS".to_string(),
        ];

        let (reports, raws) = build_reports(&RatioEngine::new(), &source, &symbols);

        assert_eq!(raws.len(), 3);
        assert_eq!(reports.len(), 3);
        // SBIN has no snapshot
        assert_eq!(reports[0].symbol, "SBIN.NS");
        assert_eq!(reports[0].computed_count(), 0);
        // INFY's negative liabilities are dropped, the rest still computes
        assert_eq!(reports[1].symbol, "INFY.NS");
        assert_eq!(reports[1].get(RatioKind::Pe), RatioValue::Computed(24.0));
        assert_eq!(
            reports[1].get(RatioKind::CurrentRatio),
            RatioValue::Unavailable(UnavailableReason::MissingInput)
        );
        assert_eq!(reports[2].symbol, "TCS.NS");
        assert_eq!(reports[2].get(RatioKind::EpsGrowth), RatioValue::Computed(25.0));
        assert_eq!(reports[2].get(RatioKind::Peg), RatioValue::Computed(1.2));
    }

    #[test]
    fn test_negative_provider_ratios_keep_the_company() {
        let source = JsonFileSource::from_json_str(
            r#"{"ZEEL.NS": {"trailingPE": 12.0, "priceToBook": -3.1, "debtToEquity": -45.0, "dilutedEpsHistory": [6.0, 5.0]}}"#,
            &UnitConvention::default(),
        )
        .unwrap();

        let (reports, raws) = build_reports(&RatioEngine::new(), &source, &source.symbols());

        assert_eq!(reports.len(), 1);
        assert_eq!(raws[0].price_to_book, None);
        assert_eq!(raws[0].debt_to_equity, None);
        let zeel = &reports[0];
        assert_eq!(zeel.symbol, "ZEEL.NS");
        assert_eq!(zeel.get(RatioKind::Pe), RatioValue::Computed(12.0));
        assert_eq!(
            zeel.get(RatioKind::Pb),
            RatioValue::Unavailable(UnavailableReason::MissingInput)
        );
        assert_eq!(zeel.get(RatioKind::EpsGrowth), RatioValue::Computed(20.0));
        assert_eq!(zeel.get(RatioKind::Peg), RatioValue::Computed(0.6));
    }

    #[test]
    fn test_rejected_snapshot_gets_placeholder_row() {
        let mut broken = RawFinancials::new("YESBANK.NS").with_price_to_earnings(40.0);
        broken.eps_history = vec![EpsPoint::new(1, 2.0), EpsPoint::new(0, 1.0)];
        let good = RawFinancials::new("ITC.NS").with_price_to_earnings(26.0);
        let source = FixedSource(vec![broken, good]);
        let symbols = vec!["YESBANK.NS".to_string(), "ITC.NS".to_string()];

        let (reports, raws) = build_reports(&RatioEngine::new(), &source, &symbols);

        assert_eq!(raws.len(), 2);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].symbol, "YESBANK.NS");
        assert_eq!(reports[0].computed_count(), 0);
        assert_eq!(
            reports[0].get(RatioKind::Pe),
            RatioValue::Unavailable(UnavailableReason::MissingInput)
        );
        assert_eq!(reports[1].symbol, "ITC.NS");
        assert_eq!(reports[1].get(RatioKind::Pe), RatioValue::Computed(26.0));
    }
}

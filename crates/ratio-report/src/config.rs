use anyhow::{Context, Result};
use fundamental_ratios::{DEFAULT_GROWTH_WINDOW_YEARS, DEFAULT_PLACEHOLDER, DEFAULT_PRECISION};
use ratio_core::{Scale, UnitConvention};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub growth_years: u32,        // RATIO_GROWTH_YEARS
    pub precision: usize,         // RATIO_PRECISION
    pub placeholder: String,      // RATIO_PLACEHOLDER
    pub max_pe: Option<f64>,      // RATIO_MAX_PE
    pub units: UnitConvention,    // RATIO_DIVIDEND_YIELD_SCALE, RATIO_DEBT_TO_EQUITY_SCALE, RATIO_SHAREHOLDING_SCALE
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            growth_years: DEFAULT_GROWTH_WINDOW_YEARS,
            precision: DEFAULT_PRECISION,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_pe: None,
            units: UnitConvention::default(),
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            growth_years: parse_var(&lookup, "RATIO_GROWTH_YEARS")?
                .unwrap_or(defaults.growth_years),
            precision: parse_var(&lookup, "RATIO_PRECISION")?.unwrap_or(defaults.precision),
            placeholder: lookup("RATIO_PLACEHOLDER").unwrap_or(defaults.placeholder),
            max_pe: parse_var(&lookup, "RATIO_MAX_PE")?,
            units: UnitConvention {
                dividend_yield: parse_var::<Scale, _>(&lookup, "RATIO_DIVIDEND_YIELD_SCALE")?
                    .unwrap_or(defaults.units.dividend_yield),
                debt_to_equity: parse_var::<Scale, _>(&lookup, "RATIO_DEBT_TO_EQUITY_SCALE")?
                    .unwrap_or(defaults.units.debt_to_equity),
                shareholding: parse_var::<Scale, _>(&lookup, "RATIO_SHAREHOLDING_SCALE")?
                    .unwrap_or(defaults.units.shareholding),
            },
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = ReportConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ReportConfig::default());
        assert_eq!(config.growth_years, 3);
        assert_eq!(config.precision, 2);
        assert_eq!(config.placeholder, "N/A");
    }

    #[test]
    fn test_reads_overrides() {
        let config = ReportConfig::from_lookup(lookup_from(&[
            ("RATIO_GROWTH_YEARS", "5"),
            ("RATIO_PRECISION", " 3 "),
            ("RATIO_PLACEHOLDER", "-"),
            ("RATIO_MAX_PE", "20"),
            ("RATIO_DIVIDEND_YIELD_SCALE", "percent"),
            ("RATIO_SHAREHOLDING_SCALE", "fraction"),
        ]))
        .unwrap();

        assert_eq!(config.growth_years, 5);
        assert_eq!(config.precision, 3);
        assert_eq!(config.placeholder, "-");
        assert_eq!(config.max_pe, Some(20.0));
        assert_eq!(config.units.dividend_yield, Scale::Percent);
        assert_eq!(config.units.debt_to_equity, Scale::Percent);
        assert_eq!(config.units.shareholding, Scale::Fraction);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ReportConfig::from_lookup(lookup_from(&[("RATIO_GROWTH_YEARS", "three")]))
            .unwrap_err();
        assert!(err.to_string().contains("RATIO_GROWTH_YEARS"));

        assert!(
            ReportConfig::from_lookup(lookup_from(&[("RATIO_DEBT_TO_EQUITY_SCALE", "bps")]))
                .is_err()
        );
    }
}

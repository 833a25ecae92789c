use anyhow::{Context, Result};
use ratio_core::{ProviderSnapshot, RawFinancials, SnapshotSource, UnitConvention};
use std::collections::BTreeMap;
use std::path::Path;

/// Snapshots a fetch job left on disk: a JSON object mapping each symbol to
/// the provider's quote fields.
#[derive(Debug, Clone, Default)]
pub struct JsonFileSource {
    snapshots: BTreeMap<String, RawFinancials>,
}

impl JsonFileSource {
    pub fn load(path: &Path, units: &UnitConvention) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&text, units)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// A malformed file is an error; a malformed entry is logged and skipped.
    pub fn from_json_str(text: &str, units: &UnitConvention) -> Result<Self> {
        let entries: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(text).context("expected a JSON object keyed by symbol")?;

        let mut snapshots = BTreeMap::new();
        for (symbol, value) in entries {
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() {
                tracing::warn!("Skipping snapshot with empty symbol");
                continue;
            }
            match serde_json::from_value::<ProviderSnapshot>(value) {
                Ok(snapshot) => {
                    let raw = snapshot.into_raw(&symbol, units);
                    snapshots.insert(symbol, raw);
                }
                Err(e) => {
                    tracing::warn!(%symbol, error = %e, "Skipping unreadable snapshot");
                }
            }
        }

        Ok(Self { snapshots })
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl SnapshotSource for JsonFileSource {
    fn snapshot(&self, symbol: &str) -> Option<RawFinancials> {
        self.snapshots.get(symbol.trim()).cloned()
    }

    fn symbols(&self) -> Vec<String> {
        self.snapshots.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_str() {
        let text = r#"{
            "TCS.NS": {"trailingPE": 30.1, "dilutedEpsHistory": [125.9, 115.2]},
            "INFY.NS": {"trailingPE": "24.5", "longName": "Infosys Limited"},
            "BROKEN.NS": "not a snapshot"
        }"#;

        let source = JsonFileSource::from_json_str(text, &UnitConvention::default()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.symbols(), vec!["INFY.NS", "TCS.NS"]);

        let tcs = source.snapshot("TCS.NS").unwrap();
        assert_eq!(tcs.price_to_earnings, Some(30.1));
        assert_eq!(tcs.eps_history.len(), 2);

        let infy = source.snapshot(" INFY.NS ").unwrap();
        assert_eq!(infy.company_name.as_deref(), Some("Infosys Limited"));

        assert!(source.snapshot("BROKEN.NS").is_none());
        assert!(source.snapshot("SBIN.NS").is_none());
    }

    #[test]
    fn test_rejects_non_object_file() {
        assert!(JsonFileSource::from_json_str("[1, 2, 3]", &UnitConvention::default()).is_err());
        assert!(JsonFileSource::from_json_str("not json", &UnitConvention::default()).is_err());
    }
}

use thiserror::Error;

/// Caller contract violations.
///
/// These are distinct from [`crate::UnavailableReason`]: an `UnavailableReason`
/// describes missing or unusable market data, a `RatioError` describes a bug
/// in whoever called the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatioError {
    #[error("Invalid growth window: {0} (must be at least 1 year)")]
    InvalidGrowthWindow(u32),

    #[error("Non-finite value in {field}: {value}")]
    NonFiniteInput { field: String, value: f64 },

    #[error("Negative value in {field}: {value}")]
    NegativeInput { field: &'static str, value: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

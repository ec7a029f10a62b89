use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Floor area (square feet or square metres, whichever the rates are quoted in)
pub type Area = Decimal;

/// Round up to the next whole cent. Rent and expense recoveries are never
/// rounded down.
pub fn round_up_to_cent(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
}

/// Round to the nearest cent, ties to even.
pub fn round_to_cent(amount: Money) -> Money {
    amount.round_dp(2)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_up_never_rounds_down() {
        assert_eq!(round_up_to_cent(dec!(1796.925)), dec!(1796.93));
        assert_eq!(round_up_to_cent(dec!(1796.921)), dec!(1796.93));
        assert_eq!(round_up_to_cent(dec!(1796.92)), dec!(1796.92));
    }

    #[test]
    fn test_round_up_negative_moves_toward_zero() {
        // Credits round toward positive infinity as well
        assert_eq!(round_up_to_cent(dec!(-10.005)), dec!(-10.00));
    }

    #[test]
    fn test_round_to_cent_bankers() {
        assert_eq!(round_to_cent(dec!(3403.648)), dec!(3403.65));
        assert_eq!(round_to_cent(dec!(0.125)), dec!(0.12));
    }
}

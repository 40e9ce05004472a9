//! Static per-model-tier token rates (spec §4.G: "rates are static
//! metadata per model id"). A small fixed table with a fallback default
//! rather than a config file — there is no live pricing feed to read
//! this from, and the spec treats it as illustrative metadata, not a
//! precisely reconciled billing source.

use std::str::FromStr;

use rust_decimal::Decimal;

/// `(tier, usd-per-input-token, usd-per-output-token)`.
const RATES: &[(&str, &str, &str)] = &[
    ("fast", "0.00000025", "0.00000125"),
    ("standard", "0.000001", "0.000005"),
    ("reasoning", "0.000003", "0.000015"),
    ("frontier", "0.000015", "0.000075"),
];

const DEFAULT_IN_RATE: &str = "0.000001";
const DEFAULT_OUT_RATE: &str = "0.000005";

fn decimal_of(s: &str) -> Decimal {
    Decimal::from_str(s).expect("rate table entries are valid decimals")
}

/// USD cost per input token for a model tier, or the fallback default if
/// the tier isn't in the table.
pub fn in_rate(model_tier: &str) -> Decimal {
    RATES
        .iter()
        .find(|(tier, _, _)| *tier == model_tier)
        .map(|(_, input, _)| decimal_of(input))
        .unwrap_or_else(|| decimal_of(DEFAULT_IN_RATE))
}

/// USD cost per output token for a model tier, or the fallback default.
pub fn out_rate(model_tier: &str) -> Decimal {
    RATES
        .iter()
        .find(|(tier, _, _)| *tier == model_tier)
        .map(|(_, _, output)| decimal_of(output))
        .unwrap_or_else(|| decimal_of(DEFAULT_OUT_RATE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tier_uses_its_own_rate() {
        assert_eq!(in_rate("fast"), decimal_of("0.00000025"));
    }

    #[test]
    fn unknown_tier_falls_back_to_default() {
        assert_eq!(in_rate("bespoke-tier"), decimal_of(DEFAULT_IN_RATE));
        assert_eq!(out_rate("bespoke-tier"), decimal_of(DEFAULT_OUT_RATE));
    }
}

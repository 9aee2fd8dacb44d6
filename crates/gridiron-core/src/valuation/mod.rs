// Valuation engine: roster needs, draft value, positional scarcity, tiers.

pub mod needs;
pub mod scarcity;
pub mod tiers;
pub mod value;

/// Round to two decimal places for reporting.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

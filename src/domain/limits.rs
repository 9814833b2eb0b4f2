//! Fixed orchestration parameters.
//!
//! These are deliberately compile-time constants rather than config: the
//! replication invariants (conservation, generation cap) are tested against
//! exactly these values.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Minimum capital accepted by `start`.
pub const MIN_CAPITAL: Decimal = dec!(100);

/// A hive never spawns past this generation.
pub const MAX_GENERATIONS: i32 = 3;

/// Growth multiplier (current / initial balance) that triggers a spawn.
pub const SPAWN_MULTIPLIER: Decimal = dec!(5);

/// Fraction of the parent balance harvested into a child hive.
pub const HARVEST_FRACTION: Decimal = dec!(0.10);

/// Agents created per hive.
pub const AGENTS_PER_HIVE: i32 = 4;

/// Base per-agent probability of proposing an order each step.
pub const BASE_TRADE_CHANCE: f64 = 0.30;

/// Fraction of hive balance committed per proposal before risk scaling.
pub const BASE_RISK_FRACTION: Decimal = dec!(0.02);

/// Probability that an agent trades despite a closed gate, modeling rare
/// discretionary trades.
pub const DISCRETIONARY_OVERRIDE_CHANCE: f64 = 0.05;

/// Base priority for enqueued orders.
pub const BASE_PRIORITY: i32 = 5;

/// Scale applied to combined power when deriving order priority.
pub const PRIORITY_SCALE: f64 = 3.0;

/// Symbols agents rotate through.
pub const SYMBOL_UNIVERSE: [&str; 6] = [
    "BTC-USD", "ETH-USD", "SOL-USD", "AVAX-USD", "LINK-USD", "DOT-USD",
];

/// Reference price per symbol, jittered per proposal.
pub fn reference_price(symbol: &str) -> Decimal {
    match symbol {
        "BTC-USD" => dec!(64000),
        "ETH-USD" => dec!(3200),
        "SOL-USD" => dec!(150),
        "AVAX-USD" => dec!(38),
        "LINK-USD" => dec!(16),
        "DOT-USD" => dec!(7),
        _ => dec!(100),
    }
}

//! Per-level pricing for progression nodes.
//!
//! Single-shot unlocks (research, zones) use a flat price. Leveled nodes
//! (skills) either read a precomputed price per level or grow the price at
//! runtime by a fixed multiplier after each purchase.

use crate::fixed::{Fixed64, scale_price};
use serde::{Deserialize, Serialize};

/// How the price of a node's next level is determined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostSchedule {
    /// Same price for every level.
    Flat(u64),

    /// `prices[i]` is the price to go from level `i` to `i + 1`. Must hold
    /// at least `max_level` entries.
    Table(Vec<u64>),

    /// Price increases linearly: base + increment * level.
    Linear { base: u64, increment: u64 },

    /// Runtime growth mode. The first level costs `base`; after each
    /// purchase the paid price is multiplied by `multiplier` (rounded down)
    /// and carried in the node state as its cost override.
    Growth { base: u64, multiplier: Fixed64 },
}

impl CostSchedule {
    /// Price to go from `level` to `level + 1`.
    ///
    /// `cost_override` is the runtime price carried by growth schedules; other
    /// schedules ignore it. Returns `None` when a table has no entry for
    /// `level`.
    pub fn price_at(&self, level: u32, cost_override: Option<u64>) -> Option<u64> {
        match self {
            CostSchedule::Flat(price) => Some(*price),
            CostSchedule::Table(prices) => prices.get(level as usize).copied(),
            CostSchedule::Linear { base, increment } => {
                Some(base.saturating_add(increment.saturating_mul(u64::from(level))))
            }
            CostSchedule::Growth { base, multiplier } => Some(
                cost_override.unwrap_or_else(|| {
                    (0..level).fold(*base, |price, _| scale_price(price, *multiplier))
                }),
            ),
        }
    }

    /// The override to store after paying `paid` for a level. Only growth
    /// schedules carry one.
    pub fn next_override(&self, paid: u64) -> Option<u64> {
        match self {
            CostSchedule::Growth { multiplier, .. } => Some(scale_price(paid, *multiplier)),
            _ => None,
        }
    }

    /// Whether this schedule can price every level below `max_level`.
    pub fn covers(&self, max_level: u32) -> bool {
        match self {
            CostSchedule::Table(prices) => prices.len() >= max_level as usize,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::f64_to_fixed64;

    #[test]
    fn flat_price_is_constant() {
        let cost = CostSchedule::Flat(500);
        assert_eq!(cost.price_at(0, None), Some(500));
        assert_eq!(cost.price_at(7, None), Some(500));
        assert_eq!(cost.next_override(500), None);
    }

    #[test]
    fn table_indexes_by_level() {
        let cost = CostSchedule::Table(vec![100, 150, 225]);
        assert_eq!(cost.price_at(0, None), Some(100));
        assert_eq!(cost.price_at(2, None), Some(225));
        assert_eq!(cost.price_at(3, None), None);
        assert!(cost.covers(3));
        assert!(!cost.covers(4));
    }

    #[test]
    fn linear_scaling() {
        let cost = CostSchedule::Linear {
            base: 1000,
            increment: 500,
        };
        assert_eq!(cost.price_at(0, None), Some(1000));
        assert_eq!(cost.price_at(1, None), Some(1500));
        assert_eq!(cost.price_at(4, None), Some(3000));
    }

    #[test]
    fn growth_without_override_uses_closed_form() {
        let cost = CostSchedule::Growth {
            base: 100,
            multiplier: f64_to_fixed64(1.5),
        };
        assert_eq!(cost.price_at(0, None), Some(100));
        assert_eq!(cost.price_at(1, None), Some(150));
        assert_eq!(cost.price_at(2, None), Some(225));
    }

    #[test]
    fn growth_prefers_override() {
        let cost = CostSchedule::Growth {
            base: 100,
            multiplier: f64_to_fixed64(1.5),
        };
        assert_eq!(cost.price_at(1, Some(180)), Some(180));
        assert_eq!(cost.next_override(180), Some(270));
    }

    #[test]
    fn linear_saturates() {
        let cost = CostSchedule::Linear {
            base: u64::MAX - 1,
            increment: 10,
        };
        assert_eq!(cost.price_at(3, None), Some(u64::MAX));
    }
}

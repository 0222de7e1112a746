//! One side of a limit order book: price → aggregate resting quantity.
//!
//! Backed by a `BTreeMap`, so best-level inspection and mutation are
//! O(log n). The ordering of "best" is fixed at construction: highest price
//! first for bids, lowest first for asks (and for the auction sink). Levels
//! hold strictly positive aggregates; a subtraction that reaches zero removes
//! the level, one that would go below zero is an
//! [`ImiError::InconsistentLadder`] — the caller poisons the book.

use std::collections::BTreeMap;

use imi_core::error::ImiError;
use imi_core::types::{Price, Qty};

/// Which end of the price axis is the best level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderOrder {
    /// Bids: the highest price is best.
    BestIsHighest,
    /// Asks and the auction sink: the lowest price is best.
    BestIsLowest,
}

/// Price-sorted aggregate quantities for one side of one book.
#[derive(Debug, Clone)]
pub struct PriceLadder {
    order: LadderOrder,
    levels: BTreeMap<Price, i64>,
}

impl PriceLadder {
    pub fn new(order: LadderOrder) -> Self {
        Self { order, levels: BTreeMap::new() }
    }

    /// Aggregate `qty` into the level at `price`. A zero quantity is a no-op
    /// so that empty orders never materialize a level.
    pub fn add(&mut self, price: Price, qty: Qty) {
        if qty == 0 {
            return;
        }
        *self.levels.entry(price).or_insert(0) += qty as i64;
    }

    /// Remove `qty` from the level at `price`, dropping the level when it
    /// reaches zero.
    pub fn sub(&mut self, price: Price, qty: Qty) -> Result<(), ImiError> {
        if qty == 0 {
            return Ok(());
        }
        let requested = qty as i64;
        let Some(level) = self.levels.get_mut(&price) else {
            return Err(ImiError::InconsistentLadder { price, available: 0, requested });
        };
        if *level < requested {
            return Err(ImiError::InconsistentLadder {
                price,
                available: *level,
                requested,
            });
        }
        *level -= requested;
        if *level == 0 {
            self.levels.remove(&price);
        }
        Ok(())
    }

    /// The best level, or `None` when the side is empty.
    pub fn best(&self) -> Option<(Price, i64)> {
        let entry = match self.order {
            LadderOrder::BestIsHighest => self.levels.last_key_value(),
            LadderOrder::BestIsLowest => self.levels.first_key_value(),
        };
        entry.map(|(price, qty)| (*price, *qty))
    }

    /// The best price alone.
    pub fn best_price(&self) -> Option<Price> {
        self.best().map(|(price, _)| price)
    }

    /// True iff `price` equals the current best price.
    pub fn is_at_best(&self, price: Price) -> bool {
        self.best_price() == Some(price)
    }

    /// Aggregate at `price`, zero when the level does not exist.
    pub fn qty_at(&self, price: Price) -> i64 {
        self.levels.get(&price).copied().unwrap_or(0)
    }

    /// Number of populated levels.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Value resting at a best level: `price × quantity`, `0` for an empty side.
pub fn depth_value(best: Option<(Price, i64)>) -> i64 {
    best.map(|(price, qty)| price as i64 * qty).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bid_best_is_highest() {
        let mut bids = PriceLadder::new(LadderOrder::BestIsHighest);
        bids.add(9980, 30);
        bids.add(9990, 50);
        bids.add(9970, 10);
        assert_eq!(bids.best(), Some((9990, 50)));
        assert!(bids.is_at_best(9990));
        assert!(!bids.is_at_best(9980));
    }

    #[test]
    fn ask_best_is_lowest() {
        let mut asks = PriceLadder::new(LadderOrder::BestIsLowest);
        asks.add(10_020, 5);
        asks.add(10_010, 7);
        assert_eq!(asks.best(), Some((10_010, 7)));
    }

    #[test]
    fn add_aggregates_same_price() {
        let mut bids = PriceLadder::new(LadderOrder::BestIsHighest);
        bids.add(9990, 50);
        bids.add(9990, 25);
        assert_eq!(bids.best(), Some((9990, 75)));
        assert_eq!(bids.depth(), 1);
    }

    #[test]
    fn sub_removes_emptied_level() {
        let mut bids = PriceLadder::new(LadderOrder::BestIsHighest);
        bids.add(9990, 50);
        bids.add(9980, 30);
        bids.sub(9990, 50).unwrap();
        assert_eq!(bids.best(), Some((9980, 30)));
        assert_eq!(bids.qty_at(9990), 0);
    }

    #[test]
    fn sub_below_zero_is_inconsistent() {
        let mut bids = PriceLadder::new(LadderOrder::BestIsHighest);
        bids.add(9990, 50);
        assert!(matches!(
            bids.sub(9990, 60),
            Err(ImiError::InconsistentLadder { available: 50, requested: 60, .. })
        ));
        assert!(matches!(
            bids.sub(9980, 1),
            Err(ImiError::InconsistentLadder { available: 0, .. })
        ));
    }

    #[test]
    fn zero_quantities_are_no_ops() {
        let mut asks = PriceLadder::new(LadderOrder::BestIsLowest);
        asks.add(10_000, 0);
        assert!(asks.is_empty());
        assert!(asks.sub(10_000, 0).is_ok());
    }

    #[test]
    fn empty_ladder_peeks_null() {
        let asks = PriceLadder::new(LadderOrder::BestIsLowest);
        assert_eq!(asks.best(), None);
        assert_eq!(depth_value(asks.best()), 0);
    }

    #[test]
    fn depth_value_is_price_times_qty() {
        assert_eq!(depth_value(Some((9990, 100))), 999_000);
        assert_eq!(depth_value(None), 0);
    }
}

//! Order index — live resting orders by id.
//!
//! Orders hold keys (book id, side, price), never pointers into ladders;
//! ladder levels are always reached through the book's ladder by price. The
//! index is a flat hash map sized for roughly a million live orders.

use ahash::AHashMap;

use imi_core::types::{BookId, OrderId, Price, Qty, Side};

/// A live resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestingOrder {
    pub book: BookId,
    pub side: Side,
    pub price: Price,
    pub residual: Qty,
}

/// Map from order id to its resting order.
#[derive(Debug, Default)]
pub struct OrderIndex {
    map: AHashMap<OrderId, RestingOrder>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new order. A reused id replaces the stale entry.
    pub fn insert(&mut self, id: OrderId, order: RestingOrder) {
        self.map.insert(id, order);
    }

    /// Copy of the order, `None` for unknown ids.
    pub fn get(&self, id: OrderId) -> Option<RestingOrder> {
        self.map.get(&id).copied()
    }

    /// Drop an order, returning it if it was present.
    pub fn remove(&mut self, id: OrderId) -> Option<RestingOrder> {
        self.map.remove(&id)
    }

    /// Reduce the order's residual by an executed quantity; the order is
    /// dropped when the residual reaches zero. The caller has already
    /// validated `qty <= residual`. Returns the remaining residual.
    pub fn consume(&mut self, id: OrderId, qty: Qty) -> Option<Qty> {
        let order = self.map.get_mut(&id)?;
        order.residual = order.residual.saturating_sub(qty);
        let remaining = order.residual;
        if remaining == 0 {
            self.map.remove(&id);
        }
        Some(remaining)
    }

    /// Iterate all live orders in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (OrderId, &RestingOrder)> {
        self.map.iter().map(|(id, order)| (*id, order))
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

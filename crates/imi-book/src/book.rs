//! Per-book state: two price ladders, the auction sink, and the event
//! streams.
//!
//! Sentinel-priced (market) orders and explicit auction-side orders rest in
//! the sink ladder; it absorbs their quantity so deletes and executions
//! balance, but it never contributes to top-of-book tracking.

use ahash::AHashMap;

use imi_core::types::*;

use crate::ladder::{LadderOrder, PriceLadder};

/// Which ladder of a book an order rests in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderKind {
    Bid,
    Ask,
    AuctionSink,
}

impl LadderKind {
    /// The side reported in emitted events, `None` for the sink (which never
    /// emits).
    pub fn event_side(self) -> Option<Side> {
        match self {
            Self::Bid => Some(Side::Bid),
            Self::Ask => Some(Side::Ask),
            Self::AuctionSink => None,
        }
    }
}

/// Route an order to a ladder. Unpriced orders go to the sink regardless of
/// their side byte.
pub fn route(side: Side, price: Price) -> LadderKind {
    if price == NO_PRICE {
        return LadderKind::AuctionSink;
    }
    match side {
        Side::Bid => LadderKind::Bid,
        Side::Ask => LadderKind::Ask,
        Side::Auction => LadderKind::AuctionSink,
    }
}

/// Append-only reconstruction artifacts of one book.
#[derive(Debug, Default)]
pub struct BookStreams {
    pub best_bid_ask: Vec<BestPriceEvent>,
    pub best_depths: Vec<BestDepthEvent>,
    pub transactions: Vec<Execution>,
    pub order_stats: AHashMap<OrderId, OrderLifecycle>,
    pub snapshots: Vec<Snapshot>,
    pub trading_actions: Vec<TradingAction>,
    pub system_events: Vec<SystemEvent>,
    pub open_close: Vec<AuctionPrint>,
    pub message_counts: MessageCounts,
}

/// Best bid and ask with their aggregate quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOfBook {
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub best_bid_qty: i64,
    pub best_ask_qty: i64,
}

/// Live state of one registered book.
#[derive(Debug)]
pub struct BookState {
    pub bids: PriceLadder,
    pub asks: PriceLadder,
    pub auction: PriceLadder,
    pub streams: BookStreams,
    /// Set when an invariant was violated; all further events are dropped.
    pub poisoned: bool,
}

impl BookState {
    pub fn new() -> Self {
        Self {
            bids: PriceLadder::new(LadderOrder::BestIsHighest),
            asks: PriceLadder::new(LadderOrder::BestIsLowest),
            auction: PriceLadder::new(LadderOrder::BestIsLowest),
            streams: BookStreams::default(),
            poisoned: false,
        }
    }

    pub fn ladder(&self, kind: LadderKind) -> &PriceLadder {
        match kind {
            LadderKind::Bid => &self.bids,
            LadderKind::Ask => &self.asks,
            LadderKind::AuctionSink => &self.auction,
        }
    }

    pub fn ladder_mut(&mut self, kind: LadderKind) -> &mut PriceLadder {
        match kind {
            LadderKind::Bid => &mut self.bids,
            LadderKind::Ask => &mut self.asks,
            LadderKind::AuctionSink => &mut self.auction,
        }
    }

    /// Current top of book from the bid and ask ladders (the sink is
    /// invisible here).
    pub fn top_of_book(&self) -> TopOfBook {
        let bid = self.bids.best();
        let ask = self.asks.best();
        TopOfBook {
            best_bid: bid.map(|(price, _)| price),
            best_ask: ask.map(|(price, _)| price),
            best_bid_qty: bid.map(|(_, qty)| qty).unwrap_or(0),
            best_ask_qty: ask.map(|(_, qty)| qty).unwrap_or(0),
        }
    }
}

impl Default for BookState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_respects_sentinel() {
        assert_eq!(route(Side::Bid, 9990), LadderKind::Bid);
        assert_eq!(route(Side::Ask, 9990), LadderKind::Ask);
        assert_eq!(route(Side::Auction, 9990), LadderKind::AuctionSink);
        assert_eq!(route(Side::Bid, NO_PRICE), LadderKind::AuctionSink);
        assert_eq!(route(Side::Ask, NO_PRICE), LadderKind::AuctionSink);
    }

    #[test]
    fn sink_never_names_an_event_side() {
        assert_eq!(LadderKind::Bid.event_side(), Some(Side::Bid));
        assert_eq!(LadderKind::Ask.event_side(), Some(Side::Ask));
        assert_eq!(LadderKind::AuctionSink.event_side(), None);
    }

    #[test]
    fn top_of_book_ignores_sink() {
        let mut book = BookState::new();
        book.bids.add(9990, 100);
        book.auction.add(10_000, 500);
        let top = book.top_of_book();
        assert_eq!(top.best_bid, Some(9990));
        assert_eq!(top.best_bid_qty, 100);
        assert_eq!(top.best_ask, None);
        assert_eq!(top.best_ask_qty, 0);
    }
}

//! The book manager — the event-application core.
//!
//! Applies decoded messages to per-book state and publishes the
//! reconstruction streams. For every input record the order is fixed: ladder
//! mutation, order-index mutation, stream emission — so a consumer reading
//! the streams in append order only ever observes valid book states.
//!
//! # Failure semantics
//!
//! Unknown order or book references skip the record and bump a day-level
//! counter. An invariant violation (ladder underflow, residual underflow)
//! *poisons* the book: its further events are dropped, its id lands in the
//! bundle's error summary, and every other book continues unaffected.

use ahash::AHashMap;
use tracing::{error, warn};

use imi_core::error::ImiError;
use imi_core::types::*;

use crate::book::{BookState, BookStreams, LadderKind, route};
use crate::day::DayBundle;
use crate::ladder::depth_value;
use crate::orders::{OrderIndex, RestingOrder};
use crate::tables::StaticTables;

/// Per-day reconstruction state across all registered books.
#[derive(Debug, Default)]
pub struct BookManager {
    books: AHashMap<BookId, BookState>,
    orders: OrderIndex,
    tables: StaticTables,
    errors: ErrorSummary,
}

impl BookManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded message at its event timestamp.
    ///
    /// `T` messages are a no-op here: the day driver owns the clock and
    /// snapshot scheduling (see [`Self::capture_snapshots`]).
    pub fn apply(&mut self, ts: Micros, msg: ItchMessage) {
        match msg {
            ItchMessage::Timestamp(_) => {}
            ItchMessage::Directory(m) => self.register_book(m),
            ItchMessage::Add(m) => self.add_order(ts, m),
            ItchMessage::Delete(m) => self.delete_order(ts, m),
            ItchMessage::Replace(m) => self.replace_order(ts, m),
            ItchMessage::Executed(m) => self.execute(ts, m.order_id, m.qty, None),
            ItchMessage::ExecutedWithPrice(m) => {
                self.execute(ts, m.order_id, m.qty, Some((m.printable, m.exec_price)));
            }
            ItchMessage::PriceTick(m) => self.tables.add_price_tick(&m),
            ItchMessage::QuantityTick(_) => {}
            ItchMessage::TradingAction(m) => self.trading_action(ts, m),
            ItchMessage::SystemEvent(m) => self.system_event(ts, m),
        }
    }

    /// Append a top-of-book snapshot for `second` to every healthy book.
    ///
    /// A repeated `T` for the same second overwrites that second's snapshot.
    pub fn capture_snapshots(&mut self, second: u32) {
        for book in self.books.values_mut() {
            if book.poisoned {
                continue;
            }
            let top = book.top_of_book();
            let snap = Snapshot {
                second,
                best_bid: top.best_bid,
                best_ask: top.best_ask,
                best_bid_qty: top.best_bid_qty,
                best_ask_qty: top.best_ask_qty,
            };
            match book.streams.snapshots.last_mut() {
                Some(last) if last.second == second => *last = snap,
                _ => book.streams.snapshots.push(snap),
            }
        }
    }

    /// Consume the manager into the day's result bundle.
    pub fn into_bundle(self, date: String) -> DayBundle {
        let BookManager { books: states, orders: _, tables, mut errors } = self;
        let mut books = AHashMap::with_capacity(states.len());
        for (id, state) in states {
            if state.poisoned {
                errors.poisoned_books.push(id);
            }
            books.insert(id, state.streams);
        }
        errors.poisoned_books.sort_unstable();
        DayBundle {
            date,
            metadata: tables.metadata,
            price_tick_sizes: tables.price_tick_sizes,
            books,
            errors,
        }
    }

    /// One book's live state, for inspection.
    pub fn book(&self, id: BookId) -> Option<&BookState> {
        self.books.get(&id)
    }

    /// The live order index, for inspection.
    pub fn orders(&self) -> &OrderIndex {
        &self.orders
    }

    /// Number of registered books.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    pub(crate) fn errors_mut(&mut self) -> &mut ErrorSummary {
        &mut self.errors
    }

    // -----------------------------------------------------------------------
    // Message handlers
    // -----------------------------------------------------------------------

    fn register_book(&mut self, dir: BookDirectory) {
        self.tables.register(&dir);
        if self.books.insert(dir.book, BookState::new()).is_some() {
            warn!(book = dir.book, "duplicate directory entry; book state reset");
        }
    }

    fn add_order(&mut self, ts: Micros, m: AddOrder) {
        let Some(book) = self.books.get_mut(&m.book) else {
            self.errors.unknown_book += 1;
            warn!(book = m.book, order_id = m.order_id, "add order for unregistered book");
            return;
        };
        if book.poisoned {
            return;
        }
        book.streams.message_counts.add_order += 1;

        let kind = route(m.side, m.price);
        let ladder = book.ladder_mut(kind);
        let best_at_entry = ladder.best();
        ladder.add(m.price, m.qty);
        let best_after = ladder.best();

        book.streams
            .order_stats
            .insert(m.order_id, new_lifecycle(ts, m.price, best_at_entry, m.qty));
        if let Some(side) = kind.event_side() {
            emit_add(&mut book.streams, ts, side, m.price, m.qty, best_after);
        }
        self.orders.insert(
            m.order_id,
            RestingOrder { book: m.book, side: m.side, price: m.price, residual: m.qty },
        );
    }

    fn delete_order(&mut self, ts: Micros, m: DeleteOrder) {
        let Some(order) = self.orders.get(m.order_id) else {
            self.errors.unknown_order += 1;
            warn!(order_id = m.order_id, "delete for unknown order");
            return;
        };
        let Some(book) = self.books.get_mut(&order.book) else {
            self.errors.unknown_book += 1;
            return;
        };
        if book.poisoned {
            return;
        }
        book.streams.message_counts.delete_order += 1;
        if let Some(stats) = book.streams.order_stats.get_mut(&m.order_id) {
            stats.remove_time = Some(ts);
        }

        let kind = route(order.side, order.price);
        let ladder = book.ladder_mut(kind);
        let best_before = ladder.best();
        if let Err(err) = ladder.sub(order.price, order.residual) {
            poison(order.book, book, &err);
            return;
        }
        let best_after = ladder.best();

        if let Some(side) = kind.event_side() {
            emit_removal(&mut book.streams, ts, side, order.price, best_before, best_after);
        }
        self.orders.remove(m.order_id);
    }

    /// Replace is an atomic delete-and-add sharing one timestamp; when both
    /// halves live on the same ladder only the *net* top-of-book change is
    /// emitted, so an in-place resize never fakes a price move.
    fn replace_order(&mut self, ts: Micros, m: ReplaceOrder) {
        let Some(old) = self.orders.get(m.old_order_id) else {
            self.errors.unknown_order += 1;
            warn!(order_id = m.old_order_id, "replace for unknown order");
            return;
        };
        let Some(book) = self.books.get_mut(&old.book) else {
            self.errors.unknown_book += 1;
            return;
        };
        if book.poisoned {
            return;
        }
        book.streams.message_counts.replace_order += 1;
        if let Some(stats) = book.streams.order_stats.get_mut(&m.old_order_id) {
            stats.remove_time = Some(ts);
        }
        self.orders.remove(m.old_order_id);

        let old_kind = route(old.side, old.price);
        let new_kind = route(old.side, m.price);

        if old_kind == new_kind {
            let ladder = book.ladder_mut(old_kind);
            let best_before = ladder.best();
            if let Err(err) = ladder.sub(old.price, old.residual) {
                poison(old.book, book, &err);
                return;
            }
            let best_at_entry = ladder.best();
            ladder.add(m.price, m.qty);
            let best_after = ladder.best();

            book.streams
                .order_stats
                .insert(m.new_order_id, new_lifecycle(ts, m.price, best_at_entry, m.qty));
            if let Some(side) = old_kind.event_side() {
                let price_before = best_before.map(|(price, _)| price);
                let price_after = best_after.map(|(price, _)| price);
                if price_before != price_after {
                    book.streams.best_bid_ask.push(BestPriceEvent {
                        timestamp: ts,
                        side,
                        best_price: price_after,
                    });
                }
                let touched = best_before.is_some_and(|(price, _)| price == old.price)
                    || best_after.is_some_and(|(price, _)| price == m.price)
                    || best_before != best_after;
                if touched {
                    book.streams.best_depths.push(BestDepthEvent {
                        timestamp: ts,
                        side,
                        depth_value: depth_value(best_after),
                    });
                }
            }
        } else {
            // The halves land on different ladders (sentinel price on one
            // side of the replace): delete-style then add-style effects.
            let ladder = book.ladder_mut(old_kind);
            let best_before = ladder.best();
            if let Err(err) = ladder.sub(old.price, old.residual) {
                poison(old.book, book, &err);
                return;
            }
            let best_after = ladder.best();
            if let Some(side) = old_kind.event_side() {
                emit_removal(&mut book.streams, ts, side, old.price, best_before, best_after);
            }

            let ladder = book.ladder_mut(new_kind);
            let best_at_entry = ladder.best();
            ladder.add(m.price, m.qty);
            let best_after = ladder.best();
            book.streams
                .order_stats
                .insert(m.new_order_id, new_lifecycle(ts, m.price, best_at_entry, m.qty));
            if let Some(side) = new_kind.event_side() {
                emit_add(&mut book.streams, ts, side, m.price, m.qty, best_after);
            }
        }

        self.orders.insert(
            m.new_order_id,
            RestingOrder { book: old.book, side: old.side, price: m.price, residual: m.qty },
        );
    }

    /// Shared path for `E` and `C`. `print` carries the auction print
    /// (`printable`, `exec_price`) for `C`; the ladder always moves at the
    /// order's resting price.
    fn execute(&mut self, ts: Micros, order_id: OrderId, qty: Qty, print: Option<(bool, Price)>) {
        let Some(order) = self.orders.get(order_id) else {
            self.errors.unknown_order += 1;
            warn!(order_id, "execution for unknown order");
            return;
        };
        let Some(book) = self.books.get_mut(&order.book) else {
            self.errors.unknown_book += 1;
            return;
        };
        if book.poisoned {
            return;
        }
        if qty > order.residual {
            let err = ImiError::NegativeResidual {
                order_id,
                residual: order.residual,
                executed: qty,
            };
            poison(order.book, book, &err);
            return;
        }
        match print {
            None => book.streams.message_counts.order_executed += 1,
            Some(_) => book.streams.message_counts.order_executed_with_price += 1,
        }

        let kind = route(order.side, order.price);

        // The print carries the book as it stood at match time: best prices
        // before any level removal, the resting side's quantity already net
        // of this execution.
        let mut top = book.top_of_book();
        match kind {
            LadderKind::Bid if top.best_bid == Some(order.price) => {
                top.best_bid_qty -= qty as i64;
            }
            LadderKind::Ask if top.best_ask == Some(order.price) => {
                top.best_ask_qty -= qty as i64;
            }
            _ => {}
        }

        let ladder = book.ladder_mut(kind);
        let best_before = ladder.best();
        if let Err(err) = ladder.sub(order.price, qty) {
            poison(order.book, book, &err);
            return;
        }
        let best_after = ladder.best();

        book.streams.transactions.push(Execution {
            timestamp: ts,
            price: order.price,
            size: qty,
            aggressor: order.side.opposite(),
            best_bid: top.best_bid,
            best_ask: top.best_ask,
            best_bid_qty: top.best_bid_qty,
            best_ask_qty: top.best_ask_qty,
        });
        if let Some((printable, exec_price)) = print {
            book.streams.open_close.push(AuctionPrint { timestamp: ts, printable, exec_price });
        }
        if let Some(stats) = book.streams.order_stats.get_mut(&order_id) {
            stats.quantity_filled += qty;
            stats.first_fill_time.get_or_insert(ts);
            if qty == order.residual {
                stats.remove_time = Some(ts);
            }
        }
        if let Some(side) = kind.event_side() {
            emit_removal(&mut book.streams, ts, side, order.price, best_before, best_after);
        }
        self.orders.consume(order_id, qty);
    }

    fn trading_action(&mut self, ts: Micros, m: TradingActionMsg) {
        let Some(book) = self.books.get_mut(&m.book) else {
            self.errors.unknown_book += 1;
            warn!(book = m.book, "trading action for unregistered book");
            return;
        };
        if book.poisoned {
            return;
        }
        book.streams.message_counts.orderbook_trading_action += 1;
        book.streams.trading_actions.push(TradingAction {
            timestamp: ts,
            trading_state: m.trading_state,
            book_condition: m.book_condition,
        });
    }

    fn system_event(&mut self, ts: Micros, m: SystemEventMsg) {
        let Some(book) = self.books.get_mut(&m.book) else {
            self.errors.unknown_book += 1;
            warn!(book = m.book, "system event for unregistered book");
            return;
        };
        if book.poisoned {
            return;
        }
        book.streams.system_events.push(SystemEvent {
            timestamp: ts,
            group: m.group,
            event_code: m.event_code,
            book: m.book,
        });
    }
}

// ---------------------------------------------------------------------------
// Emission helpers
// ---------------------------------------------------------------------------

fn new_lifecycle(
    ts: Micros,
    price: Price,
    best_at_entry: Option<(Price, i64)>,
    qty: Qty,
) -> OrderLifecycle {
    OrderLifecycle {
        entry_time: ts,
        price,
        best_price_at_entry: best_at_entry.map(|(best, _)| best),
        quantity_entered: qty,
        quantity_filled: 0,
        first_fill_time: None,
        remove_time: None,
    }
}

/// Top-of-book effects of quantity arriving at `price`.
///
/// A new best depth is published when the order landed on the best level; a
/// new best price additionally when the order alone makes up that level.
fn emit_add(
    streams: &mut BookStreams,
    ts: Micros,
    side: Side,
    price: Price,
    qty: Qty,
    best_after: Option<(Price, i64)>,
) {
    let Some((best_price, best_qty)) = best_after else {
        return;
    };
    if price != best_price {
        return;
    }
    if qty as i64 == best_qty {
        streams.best_bid_ask.push(BestPriceEvent { timestamp: ts, side, best_price: Some(price) });
    }
    streams.best_depths.push(BestDepthEvent {
        timestamp: ts,
        side,
        depth_value: best_price as i64 * best_qty,
    });
}

/// Top-of-book effects of quantity leaving `removed_price`.
///
/// Nothing is published unless the touched level was the best. A new best
/// price is published only when the level was wholly removed; the new best
/// depth in every touched case.
fn emit_removal(
    streams: &mut BookStreams,
    ts: Micros,
    side: Side,
    removed_price: Price,
    best_before: Option<(Price, i64)>,
    best_after: Option<(Price, i64)>,
) {
    let was_best = best_before.is_some_and(|(price, _)| price == removed_price);
    if !was_best {
        return;
    }
    if best_after.map(|(price, _)| price) != Some(removed_price) {
        streams.best_bid_ask.push(BestPriceEvent {
            timestamp: ts,
            side,
            best_price: best_after.map(|(price, _)| price),
        });
    }
    streams.best_depths.push(BestDepthEvent {
        timestamp: ts,
        side,
        depth_value: depth_value(best_after),
    });
}

fn poison(book_id: BookId, book: &mut BookState, err: &ImiError) {
    book.poisoned = true;
    error!(book = book_id, %err, "book poisoned; dropping its further events");
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOK: BookId = 42;

    fn directory(book: BookId) -> ItchMessage {
        ItchMessage::Directory(BookDirectory {
            ms: 0,
            book,
            price_type: '1',
            isin: "CH0012032048".into(),
            currency: "CHF".into(),
            group: "ACoK".into(),
            minimum_quantity: 1,
            quantity_tick_table_id: 3,
            price_tick_table_id: 7,
            price_decimals: 2,
            delisting_date: 0,
            delisting_time: 0,
        })
    }

    fn add(order_id: OrderId, side: Side, qty: Qty, price: Price) -> ItchMessage {
        ItchMessage::Add(AddOrder { ms: 0, order_id, side, qty, book: BOOK, price })
    }

    fn mgr() -> BookManager {
        let mut mgr = BookManager::new();
        mgr.apply(0, directory(BOOK));
        mgr
    }

    fn streams(mgr: &BookManager) -> &BookStreams {
        &mgr.book(BOOK).unwrap().streams
    }

    #[test]
    fn lone_add_sets_best_price_and_depth() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));

        let s = streams(&mgr);
        assert_eq!(
            s.best_bid_ask,
            vec![BestPriceEvent { timestamp: 100, side: Side::Bid, best_price: Some(9990) }]
        );
        assert_eq!(
            s.best_depths,
            vec![BestDepthEvent { timestamp: 100, side: Side::Bid, depth_value: 100 * 9990 }]
        );
        let stats = &s.order_stats[&1];
        assert_eq!(stats.entry_time, 100);
        assert_eq!(stats.best_price_at_entry, None);
        assert_eq!(stats.quantity_entered, 100);
        assert_eq!(s.message_counts.add_order, 1);
    }

    #[test]
    fn add_behind_best_is_silent() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(200, add(2, Side::Bid, 30, 9980));

        let s = streams(&mgr);
        assert_eq!(s.best_bid_ask.len(), 1);
        assert_eq!(s.best_depths.len(), 1);
        assert_eq!(s.order_stats[&2].best_price_at_entry, Some(9990));
    }

    #[test]
    fn add_joining_best_level_emits_depth_only() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Ask, 100, 10_010));
        mgr.apply(200, add(2, Side::Ask, 50, 10_010));

        let s = streams(&mgr);
        assert_eq!(s.best_bid_ask.len(), 1); // only the first add set the price
        assert_eq!(s.best_depths.len(), 2);
        assert_eq!(s.best_depths[1].depth_value, 150 * 10_010);
    }

    #[test]
    fn replace_in_place_emits_depth_only() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(
            200,
            ItchMessage::Replace(ReplaceOrder {
                ms: 0,
                old_order_id: 1,
                new_order_id: 2,
                qty: 150,
                price: 9990,
            }),
        );

        let s = streams(&mgr);
        assert_eq!(s.best_bid_ask.len(), 1); // no price event from the replace
        assert_eq!(
            s.best_depths.last(),
            Some(&BestDepthEvent { timestamp: 200, side: Side::Bid, depth_value: 150 * 9990 })
        );
        assert_eq!(s.order_stats[&1].remove_time, Some(200));
        assert_eq!(s.order_stats[&2].entry_time, 200);
        assert_eq!(mgr.orders().get(1), None);
        assert_eq!(mgr.orders().get(2).map(|o| o.residual), Some(150));
    }

    #[test]
    fn replace_moving_off_best_emits_net_change() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 50, 9990));
        mgr.apply(100, add(2, Side::Bid, 30, 9980));
        mgr.apply(
            300,
            ItchMessage::Replace(ReplaceOrder {
                ms: 0,
                old_order_id: 1,
                new_order_id: 3,
                qty: 50,
                price: 9970,
            }),
        );

        let s = streams(&mgr);
        assert_eq!(
            s.best_bid_ask.last(),
            Some(&BestPriceEvent { timestamp: 300, side: Side::Bid, best_price: Some(9980) })
        );
        assert_eq!(s.best_depths.last().map(|d| d.depth_value), Some(30 * 9980));
        // exactly one price event for the whole replace
        assert_eq!(s.best_bid_ask.len(), 2);
    }

    #[test]
    fn depleting_execution_prints_pre_depletion_book() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(
            300,
            ItchMessage::Executed(OrderExecuted { ms: 0, order_id: 1, qty: 100, match_number: 7 }),
        );

        let s = streams(&mgr);
        assert_eq!(
            s.transactions,
            vec![Execution {
                timestamp: 300,
                price: 9990,
                size: 100,
                aggressor: Side::Ask,
                best_bid: Some(9990),
                best_ask: None,
                best_bid_qty: 0, // post-subtraction
                best_ask_qty: 0,
            }]
        );
        assert_eq!(
            s.best_bid_ask.last(),
            Some(&BestPriceEvent { timestamp: 300, side: Side::Bid, best_price: None })
        );
        assert_eq!(s.best_depths.last().map(|d| d.depth_value), Some(0));
        // fully filled: gone from the index, lifecycle closed
        assert_eq!(mgr.orders().len(), 0);
        let stats = &s.order_stats[&1];
        assert_eq!(stats.quantity_filled, 100);
        assert_eq!(stats.first_fill_time, Some(300));
        assert_eq!(stats.remove_time, Some(300));
    }

    #[test]
    fn partial_execution_keeps_best_price() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Ask, 100, 10_010));
        mgr.apply(
            200,
            ItchMessage::Executed(OrderExecuted { ms: 0, order_id: 1, qty: 40, match_number: 7 }),
        );

        let s = streams(&mgr);
        let exec = &s.transactions[0];
        assert_eq!(exec.aggressor, Side::Bid);
        assert_eq!(exec.best_ask, Some(10_010));
        assert_eq!(exec.best_ask_qty, 60); // already net of the fill
        assert_eq!(s.best_bid_ask.len(), 1); // no new price event
        assert_eq!(s.best_depths.last().map(|d| d.depth_value), Some(60 * 10_010));
        assert_eq!(mgr.orders().get(1).map(|o| o.residual), Some(60));
        assert_eq!(s.order_stats[&1].remove_time, None);
    }

    #[test]
    fn crossing_delete_steps_down_to_next_level() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 50, 9990));
        mgr.apply(100, add(2, Side::Bid, 30, 9980));
        mgr.apply(400, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 1 }));

        let s = streams(&mgr);
        assert_eq!(
            s.best_bid_ask.last(),
            Some(&BestPriceEvent { timestamp: 400, side: Side::Bid, best_price: Some(9980) })
        );
        assert_eq!(s.best_depths.last().map(|d| d.depth_value), Some(30 * 9980));
        assert_eq!(s.order_stats[&1].remove_time, Some(400));
        assert_eq!(s.message_counts.delete_order, 1);
    }

    #[test]
    fn delete_behind_best_is_silent() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 50, 9990));
        mgr.apply(100, add(2, Side::Bid, 30, 9980));
        let events_before = streams(&mgr).best_depths.len();
        mgr.apply(400, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 2 }));

        let s = streams(&mgr);
        assert_eq!(s.best_depths.len(), events_before);
        assert_eq!(mgr.book(BOOK).unwrap().bids.qty_at(9980), 0);
    }

    #[test]
    fn unknown_references_are_counted_and_skipped() {
        let mut mgr = mgr();
        mgr.apply(100, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 999 }));
        mgr.apply(
            100,
            ItchMessage::Executed(OrderExecuted { ms: 0, order_id: 998, qty: 1, match_number: 0 }),
        );
        mgr.apply(100, ItchMessage::Add(AddOrder {
            ms: 0,
            order_id: 5,
            side: Side::Bid,
            qty: 10,
            book: 777, // never registered
            price: 100,
        }));
        mgr.apply(
            100,
            ItchMessage::SystemEvent(SystemEventMsg {
                ms: 0,
                group: "ACoK".into(),
                event_code: 'C',
                book: 555, // never registered
            }),
        );

        let bundle = mgr.into_bundle("2019-03-26".into());
        assert_eq!(bundle.errors.unknown_order, 2);
        assert_eq!(bundle.errors.unknown_book, 2);
        assert!(bundle.errors.poisoned_books.is_empty());
    }

    #[test]
    fn over_execution_poisons_only_that_book() {
        let mut mgr = mgr();
        mgr.apply(0, directory(43));
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(
            200,
            ItchMessage::Executed(OrderExecuted { ms: 0, order_id: 1, qty: 150, match_number: 0 }),
        );
        // the poisoned book drops everything from now on
        mgr.apply(300, add(2, Side::Bid, 10, 9990));
        // the healthy book keeps going
        mgr.apply(
            300,
            ItchMessage::Add(AddOrder {
                ms: 0,
                order_id: 3,
                side: Side::Ask,
                qty: 5,
                book: 43,
                price: 10_000,
            }),
        );

        assert!(mgr.book(BOOK).unwrap().poisoned);
        assert_eq!(streams(&mgr).transactions.len(), 0);
        assert_eq!(streams(&mgr).message_counts.add_order, 1);
        assert_eq!(mgr.book(43).unwrap().streams.message_counts.add_order, 1);

        let bundle = mgr.into_bundle("2019-03-26".into());
        assert_eq!(bundle.errors.poisoned_books, vec![BOOK]);
    }

    #[test]
    fn sentinel_priced_order_rests_in_sink() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 500, NO_PRICE));

        let book = mgr.book(BOOK).unwrap();
        assert!(book.bids.is_empty());
        assert_eq!(book.auction.qty_at(NO_PRICE), 500);
        let s = streams(&mgr);
        assert!(s.best_bid_ask.is_empty());
        assert!(s.best_depths.is_empty());

        mgr.apply(200, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 1 }));
        let book = mgr.book(BOOK).unwrap();
        assert!(book.auction.is_empty());
        assert!(!book.poisoned);
        assert!(streams(&mgr).best_bid_ask.is_empty());
    }

    #[test]
    fn auction_side_order_rests_in_sink() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Auction, 200, 10_000));
        let book = mgr.book(BOOK).unwrap();
        assert_eq!(book.auction.qty_at(10_000), 200);
        assert!(book.asks.is_empty());
        assert!(streams(&mgr).best_depths.is_empty());
    }

    #[test]
    fn priced_execution_records_auction_print() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Ask, 100, 10_010));
        mgr.apply(
            200,
            ItchMessage::ExecutedWithPrice(OrderExecutedWithPrice {
                ms: 0,
                order_id: 1,
                qty: 30,
                match_number: 9,
                printable: true,
                exec_price: 10_005,
            }),
        );

        let s = streams(&mgr);
        assert_eq!(
            s.open_close,
            vec![AuctionPrint { timestamp: 200, printable: true, exec_price: 10_005 }]
        );
        // ladder moved at the resting price, not the print price
        assert_eq!(mgr.book(BOOK).unwrap().asks.best(), Some((10_010, 70)));
        assert_eq!(s.transactions[0].price, 10_010);
        assert_eq!(s.message_counts.order_executed_with_price, 1);
    }

    #[test]
    fn snapshots_overwrite_within_a_second() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.capture_snapshots(30_000);
        mgr.apply(200, add(2, Side::Ask, 50, 10_010));
        mgr.capture_snapshots(30_000);
        mgr.capture_snapshots(30_001);

        let snaps = &streams(&mgr).snapshots;
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].second, 30_000);
        assert_eq!(snaps[0].best_ask, Some(10_010)); // overwritten by the re-capture
        assert_eq!(snaps[1].second, 30_001);
        assert_eq!(snaps[1].best_bid, Some(9990));
        assert_eq!(snaps[1].best_bid_qty, 100);
    }

    #[test]
    fn trading_actions_and_system_events_flow_through() {
        let mut mgr = mgr();
        mgr.apply(
            500,
            ItchMessage::TradingAction(TradingActionMsg {
                ms: 0,
                book: BOOK,
                trading_state: 'H',
                book_condition: 'N',
            }),
        );
        mgr.apply(
            600,
            ItchMessage::SystemEvent(SystemEventMsg {
                ms: 0,
                group: "ACoK".into(),
                event_code: 'O',
                book: BOOK,
            }),
        );

        let s = streams(&mgr);
        assert_eq!(
            s.trading_actions,
            vec![TradingAction { timestamp: 500, trading_state: 'H', book_condition: 'N' }]
        );
        assert_eq!(s.message_counts.orderbook_trading_action, 1);
        assert_eq!(
            s.system_events,
            vec![SystemEvent {
                timestamp: 600,
                group: "ACoK".into(),
                event_code: 'O',
                book: BOOK,
            }]
        );
    }

    #[test]
    fn best_price_stream_never_repeats_a_side_value() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(200, add(2, Side::Bid, 50, 9990));
        mgr.apply(300, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 1 }));
        mgr.apply(400, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 2 }));
        mgr.apply(500, add(3, Side::Bid, 10, 9990));

        let events = &streams(&mgr).best_bid_ask;
        for pair in events.windows(2) {
            if pair[0].side == pair[1].side {
                assert_ne!(pair[0].best_price, pair[1].best_price);
            }
        }
    }

    #[test]
    fn ladder_aggregates_equal_order_residuals() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(100, add(2, Side::Bid, 70, 9990));
        mgr.apply(100, add(3, Side::Bid, 30, 9980));
        mgr.apply(100, add(4, Side::Ask, 20, 10_010));
        mgr.apply(
            200,
            ItchMessage::Executed(OrderExecuted { ms: 0, order_id: 1, qty: 60, match_number: 1 }),
        );
        mgr.apply(300, ItchMessage::Delete(DeleteOrder { ms: 0, order_id: 3 }));

        let book = mgr.book(BOOK).unwrap();
        for (_, order) in mgr.orders().iter() {
            let ladder = book.ladder(route(order.side, order.price));
            let sum: i64 = mgr
                .orders()
                .iter()
                .filter(|(_, o)| {
                    o.book == order.book && o.side == order.side && o.price == order.price
                })
                .map(|(_, o)| o.residual as i64)
                .sum();
            assert_eq!(ladder.qty_at(order.price), sum);
        }
    }

    #[test]
    fn duplicate_directory_resets_book_state() {
        let mut mgr = mgr();
        mgr.apply(100, add(1, Side::Bid, 100, 9990));
        mgr.apply(200, directory(BOOK));

        let book = mgr.book(BOOK).unwrap();
        assert!(book.bids.is_empty());
        assert!(book.streams.best_bid_ask.is_empty());
        assert_eq!(mgr.book_count(), 1);
    }
}

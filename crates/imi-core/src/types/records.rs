//! Stream records — the reconstructed artifacts appended per book.
//!
//! All streams are append-only vectors owned by their book's state; downstream
//! analytics consume them in insertion order as column-oriented inputs. Best
//! prices are `Option<Price>` (`None` = empty side); depth-at-best is the
//! product `price × aggregate quantity` and `0` for an empty side.

use serde::Serialize;

use super::enums::{BookId, Micros, Price, Qty, Side};
use crate::time::fmt_micros_of_day;

/// Change of the best price on one side of a book.
///
/// Emitted only when the best price itself moves; depth-only changes at the
/// best level emit [`BestDepthEvent`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestPriceEvent {
    pub timestamp: Micros,
    pub side: Side,
    pub best_price: Option<Price>,
}

/// Change of the aggregate value resting at the best level of one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BestDepthEvent {
    pub timestamp: Micros,
    pub side: Side,
    /// `best_price × best_quantity`, `0` when the side is empty.
    pub depth_value: i64,
}

/// One execution against a resting order, with the prevailing top of book.
///
/// Best prices are captured before the emptied level (if any) is removed;
/// best quantities already exclude the executed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Execution {
    pub timestamp: Micros,
    pub price: Price,
    pub size: Qty,
    pub aggressor: Side,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub best_bid_qty: i64,
    pub best_ask_qty: i64,
}

impl std::fmt::Display for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Exec({} {}x{} aggr={})",
            fmt_micros_of_day(self.timestamp),
            self.size,
            self.price,
            self.aggressor,
        )
    }
}

/// Top-of-book observation taken on a seconds-timestamp transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub second: u32,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub best_bid_qty: i64,
    pub best_ask_qty: i64,
}

/// Lifecycle statistics of one resting order.
///
/// Created on add (or the add half of a replace); `quantity_filled` grows
/// monotonically, `first_fill_time` is set at most once, `remove_time` on
/// delete, replace-out, or full fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLifecycle {
    pub entry_time: Micros,
    pub price: Price,
    /// Best price on the order's ladder just before this order was added.
    pub best_price_at_entry: Option<Price>,
    pub quantity_entered: Qty,
    pub quantity_filled: Qty,
    pub first_fill_time: Option<Micros>,
    pub remove_time: Option<Micros>,
}

/// Instrument-scoped halt/resume/book-condition change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradingAction {
    pub timestamp: Micros,
    pub trading_state: char,
    pub book_condition: char,
}

/// Exchange-wide event, kept as one day-level stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemEvent {
    pub timestamp: Micros,
    pub group: String,
    pub event_code: char,
    pub book: BookId,
}

/// An opening/closing-cross print with its own execution price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuctionPrint {
    pub timestamp: Micros,
    pub printable: bool,
    pub exec_price: Price,
}

/// Static metadata of one instrument, from its directory (`R`) message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookMetadata {
    pub price_type: char,
    pub isin: String,
    pub currency: String,
    pub group: String,
    pub minimum_quantity: i32,
    pub quantity_tick_table_id: u32,
    pub price_tick_table_id: u32,
    pub price_decimals: i32,
    pub delisting_date: i32,
    pub delisting_time: i32,
}

/// One entry of a price tick-size schedule: `tick_size` applies from
/// `price_start` upwards until the next entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriceTickEntry {
    pub tick_size: i32,
    pub price_start: i32,
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Per-book message counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MessageCounts {
    pub add_order: u64,
    pub delete_order: u64,
    pub replace_order: u64,
    pub order_executed: u64,
    pub order_executed_with_price: u64,
    pub orderbook_trading_action: u64,
}

/// Day-level error summary carried in the result bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    /// Truncated frames (each ends the day).
    pub framing: u64,
    /// Per-record decode failures, logged and skipped.
    pub decode: u64,
    /// References to order ids the index does not know.
    pub unknown_order: u64,
    /// References to book ids the directory has not registered.
    pub unknown_book: u64,
    /// Books whose invariants were violated; their events stop at the
    /// violation but the day continues.
    pub poisoned_books: Vec<BookId>,
}

impl ErrorSummary {
    /// True when the day completed without a single anomaly.
    pub fn is_clean(&self) -> bool {
        self.framing == 0
            && self.decode == 0
            && self.unknown_order == 0
            && self.unknown_book == 0
            && self.poisoned_books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_summary_clean() {
        let mut errors = ErrorSummary::default();
        assert!(errors.is_clean());
        errors.unknown_order += 1;
        assert!(!errors.is_clean());
    }

    #[test]
    fn execution_display() {
        let exec = Execution {
            timestamp: 30_000_000_100,
            price: 9990,
            size: 100,
            aggressor: Side::Ask,
            best_bid: Some(9990),
            best_ask: None,
            best_bid_qty: 100,
            best_ask_qty: 0,
        };
        assert_eq!(format!("{exec}"), "Exec(08:20:00.000100 100x9990 aggr=S)");
    }
}

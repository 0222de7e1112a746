//! Decoded feed messages — the typed form of the binary IMI records.
//!
//! Every payload is big-endian with a fixed per-type layout (field widths in
//! bytes, strings are raw ASCII):
//!
//! | Type | Fields                                                                   |
//! |------|--------------------------------------------------------------------------|
//! | `T`  | seconds:4                                                                |
//! | `R`  | ms:4 book:4 price_type:1 isin:12 currency:3 group:8 min_qty:4 qty_tick:4 price_tick:4 decimals:4 delist_date:4 delist_time:4 |
//! | `A`  | ms:4 order_id:8 side:1 qty:4 book:4 price:4                              |
//! | `D`  | ms:4 order_id:8                                                          |
//! | `U`  | ms:4 old_id:8 new_id:8 qty:4 price:4                                     |
//! | `E`  | ms:4 order_id:8 qty:4 match_no:8                                         |
//! | `C`  | ms:4 order_id:8 qty:4 match_no:8 printable:1 exec_price:4                |
//! | `L`  | ms:4 table_id:4 tick_size:4 price_start:4                                |
//! | `M`  | ms:4 table_id:4 tick_size:4 qty_start:4                                  |
//! | `H`  | ms:4 book:4 trading_state:1 book_condition:1                             |
//! | `S`  | ms:4 group:8 event_code:1 book:4                                         |
//!
//! The `ms` field is the message-local millisecond offset added to the feed
//! clock's second (see `imi_book::clock`).

use super::enums::{BookId, OrderId, Price, Qty, Side};

/// Seconds-timestamp message (`T`). Drives the feed clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampSeconds {
    pub seconds: u32,
}

/// Order book directory entry (`R`). Registers one instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDirectory {
    pub ms: u32,
    pub book: BookId,
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

/// New resting order (`A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOrder {
    pub ms: u32,
    pub order_id: OrderId,
    pub side: Side,
    pub qty: Qty,
    pub book: BookId,
    pub price: Price,
}

/// Removal of a resting order (`D`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOrder {
    pub ms: u32,
    pub order_id: OrderId,
}

/// Atomic delete-and-add keeping book and side of the old order (`U`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOrder {
    pub ms: u32,
    pub old_order_id: OrderId,
    pub new_order_id: OrderId,
    pub qty: Qty,
    pub price: Price,
}

/// Execution against a resting order at its resting price (`E`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecuted {
    pub ms: u32,
    pub order_id: OrderId,
    pub qty: Qty,
    pub match_number: u64,
}

/// Execution with an explicit print price — an auction cross (`C`).
///
/// The resting order is still reduced at its own price; `exec_price` only
/// feeds the open/close print stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderExecutedWithPrice {
    pub ms: u32,
    pub order_id: OrderId,
    pub qty: Qty,
    pub match_number: u64,
    pub printable: bool,
    pub exec_price: Price,
}

/// One entry of a price tick-size schedule (`L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceTickSize {
    pub ms: u32,
    pub table_id: u32,
    pub tick_size: i32,
    pub price_start: i32,
}

/// One entry of a quantity tick-size schedule (`M`). Not needed for book
/// state; decoded for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityTickSize {
    pub ms: u32,
    pub table_id: u32,
    pub tick_size: i32,
    pub quantity_start: i32,
}

/// Instrument-scoped trading state change (`H`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingActionMsg {
    pub ms: u32,
    pub book: BookId,
    pub trading_state: char,
    pub book_condition: char,
}

/// Exchange-wide event (`S`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEventMsg {
    pub ms: u32,
    pub group: String,
    pub event_code: char,
    pub book: BookId,
}

// ---------------------------------------------------------------------------
// ItchMessage — tagged union dispatched by the book manager
// ---------------------------------------------------------------------------

/// A decoded IMI message. The decoder produces the variant, the book manager
/// switch-dispatches on it; there is no dynamic dispatch on the hot path.
#[derive(Debug, Clone, PartialEq)]
pub enum ItchMessage {
    Timestamp(TimestampSeconds),
    Directory(BookDirectory),
    Add(AddOrder),
    Delete(DeleteOrder),
    Replace(ReplaceOrder),
    Executed(OrderExecuted),
    ExecutedWithPrice(OrderExecutedWithPrice),
    PriceTick(PriceTickSize),
    QuantityTick(QuantityTickSize),
    TradingAction(TradingActionMsg),
    SystemEvent(SystemEventMsg),
}

impl ItchMessage {
    /// The message-local millisecond offset, `None` for `T` messages which
    /// carry whole seconds instead.
    pub fn ms(&self) -> Option<u32> {
        match self {
            Self::Timestamp(_) => None,
            Self::Directory(m) => Some(m.ms),
            Self::Add(m) => Some(m.ms),
            Self::Delete(m) => Some(m.ms),
            Self::Replace(m) => Some(m.ms),
            Self::Executed(m) => Some(m.ms),
            Self::ExecutedWithPrice(m) => Some(m.ms),
            Self::PriceTick(m) => Some(m.ms),
            Self::QuantityTick(m) => Some(m.ms),
            Self::TradingAction(m) => Some(m.ms),
            Self::SystemEvent(m) => Some(m.ms),
        }
    }
}

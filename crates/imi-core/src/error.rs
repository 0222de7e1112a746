//! Typed error definitions for the reconstruction system.
//!
//! Provides [`ImiError`] for domain-specific errors. All variants implement
//! `std::error::Error` via `thiserror`, so they integrate seamlessly with
//! `anyhow::Result` at the orchestration boundary.
//!
//! Most variants are *recoverable per record*: the day driver logs them,
//! bumps a counter in the error summary and moves on. Only I/O errors lose
//! the day.

use thiserror::Error;

use crate::types::{BookId, OrderId, Price};

/// Domain-specific errors for IMI reconstruction.
#[derive(Debug, Error)]
pub enum ImiError {
    /// A record's framing ran past the end of the day file.
    #[error("truncated frame at byte offset {offset}")]
    TruncatedFrame { offset: usize },

    /// A payload was too short (or carried invalid field values) for its
    /// message type.
    #[error("cannot decode '{msg_type}' message from {len}-byte payload")]
    Decode { msg_type: char, len: usize },

    /// A message referenced an order id the index does not know.
    #[error("unknown order id {0}")]
    UnknownOrder(OrderId),

    /// A message referenced a book id the directory has not registered.
    #[error("unknown book id {0}")]
    UnknownBook(BookId),

    /// A ladder was asked to shed more quantity than rests at a level.
    #[error("ladder level {price} holds {available} but {requested} was removed")]
    InconsistentLadder {
        price: Price,
        available: i64,
        requested: i64,
    },

    /// An execution consumed more than the order's outstanding quantity.
    #[error("order {order_id} has {residual} outstanding but {executed} executed")]
    NegativeResidual {
        order_id: OrderId,
        residual: u32,
        executed: u32,
    },

    /// An input file name does not end in `_YYYY_MM_DD.bin`.
    #[error("cannot derive a date from file name {0:?}")]
    FileName(String),

    /// Day file could not be opened or mapped.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

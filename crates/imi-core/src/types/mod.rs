//! Core data types for IMI feed reconstruction.
//!
//! Prices, quantities and identifiers keep the exchange's integer units; the
//! decimal scale of a price is per-book metadata (`price_decimals`), applied
//! only by downstream analytics.

pub mod enums;
pub mod messages;
pub mod records;

pub use enums::*;
pub use messages::*;
pub use records::*;

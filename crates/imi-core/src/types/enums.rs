//! Primitive aliases and enumerations shared across the system.

use serde::Serialize;

/// Price in exchange integer units. The decimal scale is per-book metadata.
pub type Price = i32;

/// Quantity in exchange integer units.
pub type Qty = u32;

/// Order identifier, unique within one trading day.
pub type OrderId = u64;

/// Order book identifier, assigned by directory (`R`) messages.
pub type BookId = u32;

/// Microseconds since midnight.
pub type Micros = u64;

/// Sentinel price of unpriced (market) orders.
///
/// Orders carrying this price rest in the auction sink ladder and never
/// participate in best-price tracking.
pub const NO_PRICE: Price = 0x7FFF_FFFF;

// ---------------------------------------------------------------------------
// Book side
// ---------------------------------------------------------------------------

/// Side of an order: buy, sell, or the auction sink.
///
/// Wire codes are `B`, `S` and space respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Bid,
    Ask,
    Auction,
}

impl Side {
    /// Decode the one-byte wire code, `None` for anything unrecognized.
    pub fn from_wire(code: u8) -> Option<Self> {
        match code {
            b'B' => Some(Self::Bid),
            b'S' => Some(Self::Ask),
            b' ' => Some(Self::Auction),
            _ => None,
        }
    }

    /// The contra side. The auction sink has no contra and maps to itself.
    pub fn opposite(self) -> Self {
        match self {
            Self::Bid => Self::Ask,
            Self::Ask => Self::Bid,
            Self::Auction => Self::Auction,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bid => write!(f, "B"),
            Self::Ask => write!(f, "S"),
            Self::Auction => write!(f, " "),
        }
    }
}

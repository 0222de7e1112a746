//! Payload decoding — big-endian fixed layouts into typed messages.
//!
//! Pure functions, no state. Field offsets follow the layout table in
//! [`imi_core::types::messages`]. Types that never affect book state
//! (`I` indicative, `P` off-book trade, `B` broken trade, `G`) and any
//! unrecognized type decode to `None`; a too-short payload or an invalid
//! field value is a per-record [`ImiError::Decode`] that the day driver logs
//! and skips.

use imi_core::error::ImiError;
use imi_core::types::*;

/// Read a big-endian i32.
#[inline]
fn be_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes(data[offset..offset + 4].try_into().unwrap_or([0; 4]))
}

/// Read a big-endian u32.
#[inline]
fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(data[offset..offset + 4].try_into().unwrap_or([0; 4]))
}

/// Read a big-endian u64.
#[inline]
fn be_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_be_bytes(data[offset..offset + 8].try_into().unwrap_or([0; 8]))
}

/// Extract a fixed-width ASCII field, trailing padding stripped.
fn ascii(data: &[u8], offset: usize, width: usize) -> String {
    String::from_utf8_lossy(&data[offset..offset + width]).trim_end().to_string()
}

/// Decode one payload into a typed message.
///
/// Returns `Ok(None)` for types that are irrelevant to reconstruction.
pub fn decode(msg_type: u8, payload: &[u8]) -> Result<Option<ItchMessage>, ImiError> {
    let msg = match msg_type {
        b'T' => {
            let seconds = field_i32(msg_type, payload, 0, 4)?;
            ItchMessage::Timestamp(TimestampSeconds { seconds: seconds as u32 })
        }

        b'A' => {
            need(msg_type, payload, 25)?;
            let side = Side::from_wire(payload[12]).ok_or_else(|| short(msg_type, payload))?;
            let qty = field_i32(msg_type, payload, 13, 25)?;
            ItchMessage::Add(AddOrder {
                ms: be_u32(payload, 0),
                order_id: be_u64(payload, 4),
                side,
                qty: qty as Qty,
                book: be_u32(payload, 17),
                price: be_i32(payload, 21),
            })
        }

        b'D' => {
            need(msg_type, payload, 12)?;
            ItchMessage::Delete(DeleteOrder {
                ms: be_u32(payload, 0),
                order_id: be_u64(payload, 4),
            })
        }

        b'U' => {
            need(msg_type, payload, 28)?;
            let qty = field_i32(msg_type, payload, 20, 28)?;
            ItchMessage::Replace(ReplaceOrder {
                ms: be_u32(payload, 0),
                old_order_id: be_u64(payload, 4),
                new_order_id: be_u64(payload, 12),
                qty: qty as Qty,
                price: be_i32(payload, 24),
            })
        }

        b'E' => {
            need(msg_type, payload, 24)?;
            let qty = field_i32(msg_type, payload, 12, 24)?;
            ItchMessage::Executed(OrderExecuted {
                ms: be_u32(payload, 0),
                order_id: be_u64(payload, 4),
                qty: qty as Qty,
                match_number: be_u64(payload, 16),
            })
        }

        b'C' => {
            need(msg_type, payload, 29)?;
            let qty = field_i32(msg_type, payload, 12, 29)?;
            ItchMessage::ExecutedWithPrice(OrderExecutedWithPrice {
                ms: be_u32(payload, 0),
                order_id: be_u64(payload, 4),
                qty: qty as Qty,
                match_number: be_u64(payload, 16),
                printable: payload[24] == b'Y',
                exec_price: be_i32(payload, 25),
            })
        }

        b'R' => {
            need(msg_type, payload, 56)?;
            ItchMessage::Directory(BookDirectory {
                ms: be_u32(payload, 0),
                book: be_u32(payload, 4),
                price_type: payload[8] as char,
                isin: ascii(payload, 9, 12),
                currency: ascii(payload, 21, 3),
                group: ascii(payload, 24, 8),
                minimum_quantity: be_i32(payload, 32),
                quantity_tick_table_id: be_u32(payload, 36),
                price_tick_table_id: be_u32(payload, 40),
                price_decimals: be_i32(payload, 44),
                delisting_date: be_i32(payload, 48),
                delisting_time: be_i32(payload, 52),
            })
        }

        b'L' => {
            need(msg_type, payload, 16)?;
            ItchMessage::PriceTick(PriceTickSize {
                ms: be_u32(payload, 0),
                table_id: be_u32(payload, 4),
                tick_size: be_i32(payload, 8),
                price_start: be_i32(payload, 12),
            })
        }

        b'M' => {
            need(msg_type, payload, 16)?;
            ItchMessage::QuantityTick(QuantityTickSize {
                ms: be_u32(payload, 0),
                table_id: be_u32(payload, 4),
                tick_size: be_i32(payload, 8),
                quantity_start: be_i32(payload, 12),
            })
        }

        b'H' => {
            need(msg_type, payload, 10)?;
            ItchMessage::TradingAction(TradingActionMsg {
                ms: be_u32(payload, 0),
                book: be_u32(payload, 4),
                trading_state: payload[8] as char,
                book_condition: payload[9] as char,
            })
        }

        b'S' => {
            need(msg_type, payload, 17)?;
            ItchMessage::SystemEvent(SystemEventMsg {
                ms: be_u32(payload, 0),
                group: ascii(payload, 4, 8),
                event_code: payload[12] as char,
                book: be_u32(payload, 13),
            })
        }

        // Off-book trades, broken trades, indicatives: no book state impact.
        _ => return Ok(None),
    };
    Ok(Some(msg))
}

fn short(msg_type: u8, payload: &[u8]) -> ImiError {
    ImiError::Decode { msg_type: msg_type as char, len: payload.len() }
}

fn need(msg_type: u8, payload: &[u8], len: usize) -> Result<(), ImiError> {
    if payload.len() < len {
        return Err(short(msg_type, payload));
    }
    Ok(())
}

/// Read an i32 field that must be non-negative (quantities, seconds).
fn field_i32(msg_type: u8, payload: &[u8], offset: usize, min_len: usize) -> Result<i32, ImiError> {
    need(msg_type, payload, min_len)?;
    let value = be_i32(payload, offset);
    if value < 0 {
        return Err(short(msg_type, payload));
    }
    Ok(value)
}

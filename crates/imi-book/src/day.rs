//! The per-day driver: one file in, one result bundle out.
//!
//! Owns the feed clock and the snapshot schedule; everything book-shaped is
//! delegated to [`BookManager`]. The loop is strictly synchronous — one
//! bounded mmap at open, then no I/O on the per-message path. Workers process
//! whole days; nothing here is shared across threads.

use std::path::Path;

use tracing::{info, warn};

use ahash::AHashMap;
use imi_core::error::ImiError;
use imi_core::types::*;

use crate::clock::FeedClock;
use crate::decode::decode;
use crate::manager::BookManager;
use crate::reader::{DayFile, FrameCursor};

/// First second of the snapshot window (08:00, inclusive).
pub const SNAPSHOT_WINDOW_START: u32 = 8 * 3600;
/// End of the snapshot window (18:00, exclusive).
pub const SNAPSHOT_WINDOW_END: u32 = 18 * 3600;

/// Everything reconstructed from one trading day.
///
/// Moved out of the worker at end of day; field names are load-bearing for
/// downstream analytics.
#[derive(Debug)]
pub struct DayBundle {
    /// Trading date, `YYYY-MM-DD`, derived from the file name.
    pub date: String,
    pub metadata: AHashMap<BookId, BookMetadata>,
    pub price_tick_sizes: AHashMap<u32, Vec<PriceTickEntry>>,
    pub books: AHashMap<BookId, crate::book::BookStreams>,
    pub errors: ErrorSummary,
}

impl DayBundle {
    /// Total executions across all books.
    pub fn transaction_count(&self) -> usize {
        self.books.values().map(|b| b.transactions.len()).sum()
    }

    /// Total best-price plus best-depth events across all books.
    pub fn quote_event_count(&self) -> usize {
        self.books
            .values()
            .map(|b| b.best_bid_ask.len() + b.best_depths.len())
            .sum()
    }

    /// Total per-second snapshots across all books.
    pub fn snapshot_count(&self) -> usize {
        self.books.values().map(|b| b.snapshots.len()).sum()
    }

    /// Total system events across all books.
    pub fn system_event_count(&self) -> usize {
        self.books.values().map(|b| b.system_events.len()).sum()
    }

    /// Total tracked order lifecycles across all books.
    pub fn order_count(&self) -> usize {
        self.books.values().map(|b| b.order_stats.len()).sum()
    }
}

/// Derive the trading date from a file name ending `_YYYY_MM_DD.bin`.
pub fn date_from_file_name(path: &Path) -> Result<String, ImiError> {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let date = name
        .len()
        .checked_sub(14)
        .and_then(|start| name.get(start..name.len() - 4))
        .filter(|_| name.ends_with(".bin"))
        .filter(|slice| is_date_like(slice))
        .ok_or_else(|| ImiError::FileName(name.to_string()))?;
    Ok(date.replace('_', "-"))
}

fn is_date_like(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'_',
            _ => b.is_ascii_digit(),
        })
}

/// Reconstruct one day from its file.
pub fn process_day(path: &Path) -> Result<DayBundle, ImiError> {
    let date = date_from_file_name(path)?;
    let file = DayFile::open(path)?;
    info!(%date, bytes = file.bytes().len(), "processing day file");
    let bundle = process_bytes(&date, file.bytes());
    info!(
        %date,
        books = bundle.books.len(),
        transactions = bundle.transaction_count(),
        clean = bundle.errors.is_clean(),
        "day reconstructed"
    );
    Ok(bundle)
}

/// Reconstruct one day from an in-memory buffer.
///
/// Per-record problems (undecodable payloads, unknown references) are logged,
/// counted and skipped; a truncated frame stops consumption. The bundle
/// always carries whatever was accumulated.
pub fn process_bytes(date: &str, data: &[u8]) -> DayBundle {
    let mut clock = FeedClock::new();
    let mut manager = BookManager::new();

    for frame in FrameCursor::new(data) {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(date, %err, "day file ends in a truncated frame");
                manager.errors_mut().framing += 1;
                break;
            }
        };
        match decode(frame.msg_type, frame.payload) {
            Ok(Some(ItchMessage::Timestamp(t))) => {
                clock.set_seconds(t.seconds);
                if (SNAPSHOT_WINDOW_START..SNAPSHOT_WINDOW_END).contains(&t.seconds) {
                    manager.capture_snapshots(t.seconds);
                }
            }
            Ok(Some(msg)) => {
                let ts = clock.event_time(msg.ms().unwrap_or(0));
                manager.apply(ts, msg);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(date, %err, "skipping undecodable record");
                manager.errors_mut().decode += 1;
            }
        }
    }

    manager.into_bundle(date.to_string())
}

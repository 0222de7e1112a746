//! Static tables — the instrument directory and tick-size schedules.
//!
//! Populated from `R` and `L` messages and carried through to the result
//! bundle unchanged; reconstruction itself only needs the directory to know
//! which books exist.

use ahash::AHashMap;

use imi_core::types::*;

/// Day-level static data.
#[derive(Debug, Default)]
pub struct StaticTables {
    pub metadata: AHashMap<BookId, BookMetadata>,
    pub price_tick_sizes: AHashMap<u32, Vec<PriceTickEntry>>,
}

impl StaticTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a directory entry's metadata.
    pub fn register(&mut self, dir: &BookDirectory) {
        self.metadata.insert(
            dir.book,
            BookMetadata {
                price_type: dir.price_type,
                isin: dir.isin.clone(),
                currency: dir.currency.clone(),
                group: dir.group.clone(),
                minimum_quantity: dir.minimum_quantity,
                quantity_tick_table_id: dir.quantity_tick_table_id,
                price_tick_table_id: dir.price_tick_table_id,
                price_decimals: dir.price_decimals,
                delisting_date: dir.delisting_date,
                delisting_time: dir.delisting_time,
            },
        );
    }

    /// Append one entry to a price tick-size schedule.
    pub fn add_price_tick(&mut self, msg: &PriceTickSize) {
        self.price_tick_sizes.entry(msg.table_id).or_default().push(PriceTickEntry {
            tick_size: msg.tick_size,
            price_start: msg.price_start,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_metadata() {
        let mut tables = StaticTables::new();
        tables.register(&BookDirectory {
            ms: 0,
            book: 42,
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
        });
        let meta = &tables.metadata[&42];
        assert_eq!(meta.isin, "CH0012032048");
        assert_eq!(meta.price_tick_table_id, 7);
    }

    #[test]
    fn tick_entries_append_in_order() {
        let mut tables = StaticTables::new();
        for (tick_size, price_start) in [(1, 0), (5, 10_000), (10, 100_000)] {
            tables.add_price_tick(&PriceTickSize { ms: 0, table_id: 7, tick_size, price_start });
        }
        let entries = &tables.price_tick_sizes[&7];
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], PriceTickEntry { tick_size: 5, price_start: 10_000 });
    }
}

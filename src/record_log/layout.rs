//! Storage layout and header codec
//!
//! ```text
//! byte 0                      reserved
//! byte 1                      write cursor
//! byte 2                      record count
//! bytes 3 .. 3+max_slots      slot table, one offset per pending record
//! bytes 3+max_slots ..        data region: [len][payload] records
//! ```
//!
//! Cursor and slot values are single bytes, so nothing past offset 255 is
//! addressable regardless of capacity.

use super::errors::{LogError, LogResult};
use crate::store::ByteStore;

/// Reserved byte, never written by the log.
pub const RESERVED_ADDR: usize = 0;
/// Write cursor byte.
pub const CURSOR_ADDR: usize = 1;
/// Record count byte.
pub const COUNT_ADDR: usize = 2;
/// First byte of the slot table.
pub const SLOT_TABLE_ADDR: usize = 3;

/// Default store capacity in bytes.
pub const DEFAULT_STORAGE_SIZE: usize = 512;
/// Default slot table size.
pub const DEFAULT_MAX_SLOTS: usize = 10;
/// Longest payload a length byte can describe.
pub const MAX_RECORD_LEN: usize = u8::MAX as usize;
/// Largest value a cursor or slot byte can hold.
pub const MAX_ENCODABLE_OFFSET: usize = u8::MAX as usize;

/// Geometry of a record log inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    capacity: usize,
    max_slots: usize,
}

impl Layout {
    /// Validates `capacity` and `max_slots`.
    ///
    /// The header must end below the data limit, leaving room for at least
    /// one empty record.
    pub fn new(capacity: usize, max_slots: usize) -> LogResult<Self> {
        if max_slots == 0 {
            return Err(LogError::invalid_layout("max_slots must be at least 1"));
        }
        if max_slots > MAX_ENCODABLE_OFFSET {
            return Err(LogError::invalid_layout(format!(
                "max_slots {} does not fit in the record count byte",
                max_slots
            )));
        }
        let layout = Self {
            capacity,
            max_slots,
        };
        if layout.header_end() + 1 > layout.data_limit() {
            return Err(LogError::invalid_layout(format!(
                "capacity {} leaves no data region after a {}-slot header",
                capacity, max_slots
            )));
        }
        Ok(layout)
    }

    /// Store capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slot table size.
    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// First byte of the data region (`max_slots + 3`).
    pub fn header_end(&self) -> usize {
        SLOT_TABLE_ADDR + self.max_slots
    }

    /// Exclusive end of the usable data region.
    pub fn data_limit(&self) -> usize {
        self.capacity.min(MAX_ENCODABLE_OFFSET)
    }

    /// Address of slot `index`.
    pub fn slot_addr(&self, index: usize) -> usize {
        debug_assert!(index < self.max_slots);
        SLOT_TABLE_ADDR + index
    }
}

/// In-memory copy of the persisted header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Offset of the next free data byte
    pub write_cursor: usize,
    /// Offsets of pending records in append order
    pub slots: Vec<usize>,
}

impl Header {
    /// Header of an empty log.
    pub fn empty(layout: &Layout) -> Self {
        Self {
            write_cursor: layout.header_end(),
            slots: Vec::with_capacity(layout.max_slots()),
        }
    }

    /// Decodes and validates the header stored in `store`.
    ///
    /// A zero cursor means virgin storage and decodes to the empty header.
    pub fn read_from<S: ByteStore + ?Sized>(store: &S, layout: &Layout) -> LogResult<Self> {
        let raw_cursor = store.read(CURSOR_ADDR)? as usize;
        let count = store.read(COUNT_ADDR)? as usize;

        let write_cursor = if raw_cursor == 0 {
            layout.header_end()
        } else {
            raw_cursor
        };

        if write_cursor < layout.header_end() || write_cursor > layout.data_limit() {
            return Err(LogError::corruption_at_offset(
                CURSOR_ADDR,
                format!("write cursor {} outside the data region", write_cursor),
            ));
        }
        if count > layout.max_slots() {
            return Err(LogError::corruption_at_offset(
                COUNT_ADDR,
                format!(
                    "record count {} exceeds {} slots",
                    count,
                    layout.max_slots()
                ),
            ));
        }

        let mut slots = Vec::with_capacity(layout.max_slots());
        let mut next_free = layout.header_end();
        for index in 0..count {
            let addr = layout.slot_addr(index);
            let offset = store.read(addr)? as usize;
            // Records are laid out back to back in append order
            if offset < next_free || offset >= write_cursor {
                return Err(LogError::corruption_at_offset(
                    addr,
                    format!("slot {} points at {} outside pending data", index, offset),
                ));
            }
            let len = store.read(offset)? as usize;
            let end = offset + 1 + len;
            if end > write_cursor {
                return Err(LogError::corruption_at_offset(
                    offset,
                    format!("record at {} runs past the write cursor", offset),
                ));
            }
            slots.push(offset);
            next_free = end;
        }

        Ok(Self {
            write_cursor,
            slots,
        })
    }

    /// Writes cursor, count and the full slot table into the working buffer.
    ///
    /// Unused slots are zeroed. Does not commit.
    pub fn write_to<S: ByteStore + ?Sized>(&self, store: &mut S, layout: &Layout) -> LogResult<()> {
        debug_assert!(self.write_cursor <= MAX_ENCODABLE_OFFSET);
        debug_assert!(self.slots.len() <= layout.max_slots());
        store.write(CURSOR_ADDR, self.write_cursor as u8)?;
        store.write(COUNT_ADDR, self.slots.len() as u8)?;
        for index in 0..layout.max_slots() {
            let value = self.slots.get(index).copied().unwrap_or(0);
            store.write(layout.slot_addr(index), value as u8)?;
        }
        Ok(())
    }
}

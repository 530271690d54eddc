//! Record log: the durable store-and-forward buffer
//!
//! Packs length-prefixed payloads into the data region of a ByteStore and
//! tracks them through a bounded slot table in a fixed header.
//!
//! # Invariants
//!
//! - The write cursor never drops below the end of the header and never
//!   exceeds the data limit
//! - The record count never exceeds the slot table size
//! - Every pending slot points at a record that ends at or before the cursor
//! - A rejected append leaves header, slots and store bytes unchanged
//! - Each mutation reaches the medium in exactly one commit

mod errors;
mod layout;
mod log;

pub use errors::{LogError, LogErrorCode, LogResult};
pub use layout::{
    Header, Layout, COUNT_ADDR, CURSOR_ADDR, DEFAULT_MAX_SLOTS, DEFAULT_STORAGE_SIZE,
    MAX_ENCODABLE_OFFSET, MAX_RECORD_LEN, RESERVED_ADDR, SLOT_TABLE_ADDR,
};
pub use log::{LogOptions, RecordLog};

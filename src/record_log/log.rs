//! RecordLog: append-only record arena over a ByteStore
//!
//! Every mutation follows the same protocol:
//! 1. Validate against the in-memory header; reject without touching the store
//! 2. Write record bytes, then header bytes, into the working buffer
//! 3. Commit once
//! 4. Only after the commit succeeds, update the in-memory header
//!
//! A power loss before step 3 leaves the previous committed image, whose
//! header never points at the half-written bytes.

use super::errors::{LogError, LogResult};
use super::layout::{Header, Layout, DEFAULT_MAX_SLOTS, MAX_RECORD_LEN};
use crate::crash_point::{maybe_crash, points};
use crate::observability::{Event, Logger};
use crate::store::ByteStore;

/// Options applied when a log is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Slot table size
    pub max_slots: usize,
    /// Zero the whole store before reading the header
    pub erase_on_boot: bool,
    /// Erase and start empty instead of failing on a corrupt header
    pub reset_on_corruption: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            erase_on_boot: false,
            reset_on_corruption: false,
        }
    }
}

/// Durable log of pending records.
#[derive(Debug)]
pub struct RecordLog<S: ByteStore> {
    store: S,
    layout: Layout,
    header: Header,
}

impl<S: ByteStore> RecordLog<S> {
    /// Loads the log from `store` without erasing.
    ///
    /// # Errors
    ///
    /// - `InvalidLayout` if the store is too small for `max_slots`
    /// - `Corruption` if the persisted header is inconsistent
    pub fn load(store: S, max_slots: usize) -> LogResult<Self> {
        Self::open(
            store,
            &LogOptions {
                max_slots,
                ..LogOptions::default()
            },
        )
    }

    /// Loads the log, erasing first when `erase_override` is set.
    pub fn load_with(store: S, max_slots: usize, erase_override: bool) -> LogResult<Self> {
        Self::open(
            store,
            &LogOptions {
                max_slots,
                erase_on_boot: erase_override,
                ..LogOptions::default()
            },
        )
    }

    /// Opens the log with explicit options.
    pub fn open(mut store: S, options: &LogOptions) -> LogResult<Self> {
        let layout = Layout::new(store.capacity(), options.max_slots)?;

        if options.erase_on_boot {
            erase_store(&mut store)?;
            Logger::info(Event::LogErased.as_str(), &[("reason", "erase_on_boot")]);
        }

        let header = match Header::read_from(&store, &layout) {
            Ok(header) => header,
            Err(e) if e.is_corruption() && options.reset_on_corruption => {
                Logger::warn(
                    Event::LogCorruption.as_str(),
                    &[
                        ("action", "erase"),
                        ("details", e.details().unwrap_or("")),
                        ("error", e.message()),
                    ],
                );
                erase_store(&mut store)?;
                Header::empty(&layout)
            }
            Err(e) => return Err(e),
        };

        let cursor = header.write_cursor.to_string();
        let count = header.slots.len().to_string();
        Logger::info(
            Event::LogLoaded.as_str(),
            &[("record_count", count.as_str()), ("write_cursor", cursor.as_str())],
        );

        Ok(Self {
            store,
            layout,
            header,
        })
    }

    /// Appends `payload` as a new record and returns its offset.
    ///
    /// # Errors
    ///
    /// - `RecordTooLong` if the payload exceeds 255 bytes
    /// - `StorageFull` if the slot table or data region is exhausted
    /// - `StoreFailed` if the commit fails
    ///
    /// On any error the log state is unchanged.
    pub fn append(&mut self, payload: &[u8]) -> LogResult<usize> {
        if payload.len() > MAX_RECORD_LEN {
            return Err(LogError::record_too_long(payload.len()));
        }
        if self.header.slots.len() >= self.layout.max_slots() {
            return Err(LogError::storage_full_slots(self.layout.max_slots()));
        }
        let needed = 1 + payload.len();
        if needed > self.free_bytes() {
            return Err(LogError::storage_full_bytes(needed, self.free_bytes()));
        }

        let offset = self.header.write_cursor;
        let mut next = self.header.clone();
        next.write_cursor = offset + needed;
        next.slots.push(offset);

        self.store.write(offset, payload.len() as u8)?;
        self.store.write_range(offset + 1, payload)?;
        self.persist(next, points::LOG_APPEND_BEFORE_COMMIT)?;

        Ok(offset)
    }

    /// Reads the payload of the record at `offset`.
    ///
    /// # Errors
    ///
    /// `AddressOutOfRange` if `offset` is outside the written data region or
    /// the record would run past the write cursor.
    pub fn read_at(&self, offset: usize) -> LogResult<Vec<u8>> {
        let start = self.layout.header_end();
        let end = self.header.write_cursor;
        if offset < start || offset >= end {
            return Err(LogError::out_of_range(offset, start, end));
        }
        let len = self.store.read(offset)? as usize;
        if offset + 1 + len > end {
            return Err(LogError::out_of_range(offset + 1 + len, start, end));
        }
        Ok(self.store.read_range(offset + 1, len)?)
    }

    /// Offsets of pending records, in append order.
    pub fn pending_offsets(&self) -> &[usize] {
        &self.header.slots
    }

    /// Pending records as `(offset, payload)` pairs, in append order.
    pub fn pending_records(&self) -> LogResult<Vec<(usize, Vec<u8>)>> {
        self.header
            .slots
            .iter()
            .map(|&offset| Ok((offset, self.read_at(offset)?)))
            .collect()
    }

    /// Drops every pending record and rewinds the cursor.
    pub fn clear(&mut self) -> LogResult<()> {
        let next = Header::empty(&self.layout);
        self.persist(next, points::LOG_RETIRE_BEFORE_COMMIT)
    }

    /// Removes the first `count` pending records.
    ///
    /// Survivors are moved to the start of the data region so their space
    /// is reclaimed. Record bytes and header go out in a single commit.
    pub fn retire(&mut self, count: usize) -> LogResult<()> {
        if count == 0 {
            return Ok(());
        }
        if count >= self.header.slots.len() {
            return self.clear();
        }

        let survivors = self.header.slots[count..]
            .iter()
            .map(|&offset| self.read_at(offset))
            .collect::<LogResult<Vec<_>>>()?;

        // Compaction overwrites committed record bytes; keep them to undo.
        let start = self.layout.header_end();
        let committed = self
            .store
            .read_range(start, self.header.write_cursor - start)?;

        let result = self
            .compact(&survivors)
            .and_then(|next| self.persist(next, points::LOG_RETIRE_BEFORE_COMMIT));
        if result.is_err() {
            let _ = self.store.write_range(start, &committed);
        }
        result
    }

    fn compact(&mut self, survivors: &[Vec<u8>]) -> LogResult<Header> {
        let mut next = Header::empty(&self.layout);
        for payload in survivors {
            let offset = next.write_cursor;
            self.store.write(offset, payload.len() as u8)?;
            self.store.write_range(offset + 1, payload)?;
            next.slots.push(offset);
            next.write_cursor = offset + 1 + payload.len();
        }
        Ok(next)
    }

    /// Zeroes every byte of the store and resets the log.
    pub fn erase_all(&mut self) -> LogResult<()> {
        erase_store(&mut self.store)?;
        self.header = Header::empty(&self.layout);
        Logger::info(Event::LogErased.as_str(), &[("reason", "erase_all")]);
        Ok(())
    }

    /// Number of pending records.
    pub fn len(&self) -> usize {
        self.header.slots.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.header.slots.is_empty()
    }

    /// Offset of the next free data byte.
    pub fn write_cursor(&self) -> usize {
        self.header.write_cursor
    }

    /// Bytes left in the data region, including length prefixes.
    pub fn free_bytes(&self) -> usize {
        self.layout.data_limit() - self.header.write_cursor
    }

    /// Unused slot table entries.
    pub fn free_slots(&self) -> usize {
        self.layout.max_slots() - self.header.slots.len()
    }

    /// Geometry of this log.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the log, returning the store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self, next: Header, crash_point: &str) -> LogResult<()> {
        let result = next
            .write_to(&mut self.store, &self.layout)
            .and_then(|_| {
                maybe_crash(crash_point);
                self.store.commit().map_err(LogError::from)
            });

        match result {
            Ok(()) => {
                self.header = next;
                Ok(())
            }
            Err(e) => {
                // Put the committed header back in the working buffer so a
                // later commit cannot publish the abandoned one.
                let _ = self.header.write_to(&mut self.store, &self.layout);
                Err(e)
            }
        }
    }
}

fn erase_store<S: ByteStore + ?Sized>(store: &mut S) -> LogResult<()> {
    store.fill(0)?;
    store.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_log::LogErrorCode;
    use crate::store::MemoryStore;

    fn small_log() -> RecordLog<MemoryStore> {
        RecordLog::load(MemoryStore::new(32), 2).unwrap()
    }

    #[test]
    fn test_virgin_log_is_empty() {
        let log = RecordLog::load(MemoryStore::new(512), 10).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.write_cursor(), 13);
        assert_eq!(log.free_bytes(), 255 - 13);
        assert_eq!(log.free_slots(), 10);
    }

    #[test]
    fn test_append_returns_cursor_and_advances() {
        let mut log = small_log();
        let offset = log.append(b"hi").unwrap();
        assert_eq!(offset, 5);
        assert_eq!(log.write_cursor(), 8);
        assert_eq!(log.pending_offsets(), &[5]);
        assert_eq!(log.read_at(offset).unwrap(), b"hi".to_vec());
    }

    #[test]
    fn test_append_commits_exactly_once() {
        let mut log = small_log();
        log.append(b"hello").unwrap();
        assert_eq!(log.store().commit_count(), 1);
        assert!(!log.store().is_dirty());
    }

    #[test]
    fn test_append_persists_header_bytes() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        let image = log.store().durable_image();
        assert_eq!(image[1], 8);
        assert_eq!(image[2], 1);
        assert_eq!(image[3], 5);
        assert_eq!(&image[5..8], &[2, b'h', b'i']);
    }

    #[test]
    fn test_empty_payload_is_a_record() {
        let mut log = small_log();
        let offset = log.append(b"").unwrap();
        assert_eq!(log.read_at(offset).unwrap(), Vec::<u8>::new());
        assert_eq!(log.write_cursor(), offset + 1);
    }

    #[test]
    fn test_record_too_long_rejected() {
        let mut log = RecordLog::load(MemoryStore::new(512), 10).unwrap();
        let err = log.append(&[b'x'; 256]).unwrap_err();
        assert_eq!(err.code(), LogErrorCode::RecordTooLong);
        assert!(log.is_empty());
        assert_eq!(log.store().commit_count(), 0);
    }

    #[test]
    fn test_slot_exhaustion_is_storage_full() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        log.append(b"bye").unwrap();
        let err = log.append(b"nope").unwrap_err();
        assert!(err.is_storage_full());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_byte_exhaustion_is_storage_full() {
        let mut log = RecordLog::load(MemoryStore::new(16), 4).unwrap();
        // header_end = 7, nine bytes of data
        log.append(b"abcdefg").unwrap();
        let before = log.store().durable_image().to_vec();
        let err = log.append(b"z").unwrap_err();
        assert!(err.is_storage_full());
        assert_eq!(log.write_cursor(), 15);
        assert_eq!(log.store().durable_image(), &before[..]);
        // Exactly one byte left: an empty record still fits
        log.append(b"").unwrap();
        assert_eq!(log.free_bytes(), 0);
    }

    #[test]
    fn test_read_outside_data_region() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        assert_eq!(
            log.read_at(2).unwrap_err().code(),
            LogErrorCode::AddressOutOfRange
        );
        assert_eq!(
            log.read_at(8).unwrap_err().code(),
            LogErrorCode::AddressOutOfRange
        );
        assert_eq!(
            log.read_at(400).unwrap_err().code(),
            LogErrorCode::AddressOutOfRange
        );
    }

    #[test]
    fn test_clear_rewinds_cursor() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        log.append(b"bye").unwrap();
        log.clear().unwrap();
        assert!(log.pending_offsets().is_empty());
        assert_eq!(log.append(b"again").unwrap(), 5);
    }

    #[test]
    fn test_retire_compacts_survivors() {
        let mut log = RecordLog::load(MemoryStore::new(64), 4).unwrap();
        log.append(b"A").unwrap();
        log.append(b"BB").unwrap();
        log.append(b"CCC").unwrap();

        log.retire(1).unwrap();

        assert_eq!(log.pending_offsets(), &[7, 10]);
        assert_eq!(log.read_at(7).unwrap(), b"BB".to_vec());
        assert_eq!(log.read_at(10).unwrap(), b"CCC".to_vec());
        assert_eq!(log.write_cursor(), 14);
        assert_eq!(log.free_slots(), 2);
    }

    #[test]
    fn test_retire_zero_and_all() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        let commits = log.store().commit_count();
        log.retire(0).unwrap();
        assert_eq!(log.store().commit_count(), commits);
        log.retire(5).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.write_cursor(), 5);
    }

    #[test]
    fn test_erase_all_zeroes_store() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        log.erase_all().unwrap();
        assert!(log.is_empty());
        assert!(log.store().durable_image().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_load_with_erase_override() {
        let mut log = small_log();
        log.append(b"hi").unwrap();
        let store = log.into_store();

        let log = RecordLog::load_with(store, 2, true).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_reset_on_corruption() {
        let mut store = MemoryStore::new(32);
        store.write(2, 9).unwrap();
        store.commit().unwrap();

        let strict = RecordLog::load(store.clone(), 2).unwrap_err();
        assert!(strict.is_corruption());

        let options = LogOptions {
            max_slots: 2,
            reset_on_corruption: true,
            ..LogOptions::default()
        };
        let log = RecordLog::open(store, &options).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.store().durable_image()[2], 0);
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let err = RecordLog::load(MemoryStore::new(8), 10).unwrap_err();
        assert_eq!(err.code(), LogErrorCode::InvalidLayout);
    }
}

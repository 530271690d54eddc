//! ByteStore: raw access to a fixed-size persistent byte array
//!
//! Models the EEPROM emulation of the sensor board. Writes land in a working
//! buffer and only become durable on `commit()`. Callers group all writes of
//! one logical mutation and commit once, so a power loss either keeps the
//! previous committed image or the new one.
//!
//! Implementations:
//! - `MemoryStore`: RAM-backed, can simulate a power cycle
//! - `FileStore`: file-backed image with CRC32 trailer and atomic replace

mod checksum;
mod errors;
mod file;
mod memory;

pub use checksum::{compute_checksum, verify_checksum, CHECKSUM_SIZE};
pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;

/// Fixed-capacity, byte-addressable persistent storage.
pub trait ByteStore {
    /// Number of addressable bytes. Never changes after construction.
    fn capacity(&self) -> usize;

    /// Reads the byte at `address`.
    ///
    /// Fails with `AddressOutOfRange` when `address >= capacity`.
    fn read(&self, address: usize) -> StoreResult<u8>;

    /// Writes `value` at `address` into the working buffer.
    ///
    /// The write is not durable until `commit()`.
    fn write(&mut self, address: usize, value: u8) -> StoreResult<()>;

    /// Makes every pending write durable.
    fn commit(&mut self) -> StoreResult<()>;

    /// Returns `true` if there are writes not yet committed.
    fn is_dirty(&self) -> bool;

    /// Reads `len` bytes starting at `address`.
    fn read_range(&self, address: usize, len: usize) -> StoreResult<Vec<u8>> {
        check_range(address, len, self.capacity())?;
        (address..address + len).map(|a| self.read(a)).collect()
    }

    /// Writes `bytes` starting at `address`.
    ///
    /// The whole range is validated before the first byte is written.
    fn write_range(&mut self, address: usize, bytes: &[u8]) -> StoreResult<()> {
        check_range(address, bytes.len(), self.capacity())?;
        for (i, b) in bytes.iter().enumerate() {
            self.write(address + i, *b)?;
        }
        Ok(())
    }

    /// Sets every byte of the store to `value`.
    fn fill(&mut self, value: u8) -> StoreResult<()> {
        for address in 0..self.capacity() {
            self.write(address, value)?;
        }
        Ok(())
    }
}

fn check_range(address: usize, len: usize, capacity: usize) -> StoreResult<()> {
    match address.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StoreError::out_of_range(address.saturating_add(len), capacity)),
    }
}

impl<S: ByteStore + ?Sized> ByteStore for Box<S> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, address: usize) -> StoreResult<u8> {
        (**self).read(address)
    }

    fn write(&mut self, address: usize, value: u8) -> StoreResult<()> {
        (**self).write(address, value)
    }

    fn commit(&mut self) -> StoreResult<()> {
        (**self).commit()
    }

    fn is_dirty(&self) -> bool {
        (**self).is_dirty()
    }
}

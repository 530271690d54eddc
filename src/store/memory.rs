//! RAM-backed ByteStore
//!
//! Keeps two images: the working buffer that reads and writes see, and the
//! durable image that only `commit()` updates. `power_cycle()` rebuilds a
//! store from the durable image alone, which is what the board would see
//! after losing power.

use super::errors::{StoreError, StoreResult};
use super::ByteStore;

/// In-memory store with commit semantics.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    working: Vec<u8>,
    durable: Vec<u8>,
    dirty: bool,
    commits: u64,
}

impl MemoryStore {
    /// Creates a zeroed (virgin) store of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::from_image(vec![0; capacity])
    }

    /// Creates a store whose durable contents are `image`.
    pub fn from_image(image: Vec<u8>) -> Self {
        Self {
            working: image.clone(),
            durable: image,
            dirty: false,
            commits: 0,
        }
    }

    /// Returns the committed bytes.
    pub fn durable_image(&self) -> &[u8] {
        &self.durable
    }

    /// Simulates power loss: uncommitted writes are gone.
    pub fn power_cycle(&self) -> MemoryStore {
        MemoryStore::from_image(self.durable.clone())
    }

    /// Number of commits that reached the durable image.
    pub fn commit_count(&self) -> u64 {
        self.commits
    }
}

impl ByteStore for MemoryStore {
    fn capacity(&self) -> usize {
        self.working.len()
    }

    fn read(&self, address: usize) -> StoreResult<u8> {
        self.working
            .get(address)
            .copied()
            .ok_or_else(|| StoreError::out_of_range(address, self.working.len()))
    }

    fn write(&mut self, address: usize, value: u8) -> StoreResult<()> {
        let capacity = self.working.len();
        let slot = self
            .working
            .get_mut(address)
            .ok_or_else(|| StoreError::out_of_range(address, capacity))?;
        *slot = value;
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.durable.copy_from_slice(&self.working);
        self.dirty = false;
        self.commits += 1;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

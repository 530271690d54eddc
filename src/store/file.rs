//! File-backed ByteStore
//!
//! On-disk format: `capacity` raw bytes followed by a 4-byte little-endian
//! CRC32 of those bytes.
//!
//! Commit protocol:
//! 1. Write the sealed image to `<path>.tmp`
//! 2. fsync the temp file
//! 3. Rename over `<path>`
//! 4. fsync the parent directory (unix)
//!
//! A crash at any point leaves either the previous image or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::checksum::{seal, unseal, CHECKSUM_SIZE};
use super::errors::{StoreError, StoreResult};
use super::ByteStore;
use crate::crash_point::{maybe_crash, points};

/// Persistent store backed by a single image file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    image: Vec<u8>,
    dirty: bool,
}

impl FileStore {
    /// Opens the image at `path`.
    ///
    /// A missing file yields a zeroed image; the file is created on the first
    /// commit. An existing file must hold exactly `capacity` bytes plus the
    /// checksum trailer.
    ///
    /// # Errors
    ///
    /// - `OpenFailed` if the file exists but cannot be read
    /// - `Corruption` on a length or checksum mismatch
    pub fn open(path: &Path, capacity: usize) -> StoreResult<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Self {
                    path: path.to_path_buf(),
                    image: vec![0; capacity],
                    dirty: false,
                });
            }
            Err(e) => {
                return Err(StoreError::open_failed(
                    format!("Failed to read store image: {}", path.display()),
                    e,
                ))
            }
        };

        if bytes.len() != capacity + CHECKSUM_SIZE {
            return Err(StoreError::corruption(format!(
                "store image {} is {} bytes, expected {}",
                path.display(),
                bytes.len(),
                capacity + CHECKSUM_SIZE
            )));
        }

        let image = unseal(&bytes).ok_or_else(|| {
            StoreError::corruption(format!("checksum mismatch in {}", path.display()))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            image: image.to_vec(),
            dirty: false,
        })
    }

    /// Zeroed image for `path` that ignores whatever is on disk.
    ///
    /// The existing file, corrupt or not, is replaced on the first commit.
    pub fn blank(path: &Path, capacity: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            image: vec![0; capacity],
            dirty: true,
        }
    }

    /// Returns `true` if an image file already exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Path of the image file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_temp(&self, temp: &Path) -> io::Result<()> {
        let mut file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(temp)?;
        file.write_all(&seal(&self.image))?;
        file.sync_all()
    }

    #[cfg(unix)]
    fn sync_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => File::open(parent)?.sync_all(),
            _ => File::open(".")?.sync_all(),
        }
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> io::Result<()> {
        Ok(())
    }
}

impl ByteStore for FileStore {
    fn capacity(&self) -> usize {
        self.image.len()
    }

    fn read(&self, address: usize) -> StoreResult<u8> {
        self.image
            .get(address)
            .copied()
            .ok_or_else(|| StoreError::out_of_range(address, self.image.len()))
    }

    fn write(&mut self, address: usize, value: u8) -> StoreResult<()> {
        let capacity = self.image.len();
        let slot = self
            .image
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

        maybe_crash(points::STORE_BEFORE_COMMIT);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::commit_failed(
                        format!("Failed to create store directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let temp = self.temp_path();
        self.write_temp(&temp).map_err(|e| {
            StoreError::commit_failed(
                format!("Failed to write store image: {}", temp.display()),
                e,
            )
        })?;

        maybe_crash(points::STORE_AFTER_TEMP_WRITE);

        fs::rename(&temp, &self.path).map_err(|e| {
            StoreError::commit_failed(
                format!("Failed to replace store image: {}", self.path.display()),
                e,
            )
        })?;

        self.sync_parent().map_err(|e| {
            StoreError::commit_failed(
                format!("Failed to sync store directory: {}", self.path.display()),
                e,
            )
        })?;

        maybe_crash(points::STORE_AFTER_COMMIT);

        self.dirty = false;
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }
}

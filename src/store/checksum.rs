//! CRC32 trailer for persisted store images
//!
//! The image file carries a CRC32 (IEEE) of the raw bytes so a torn or
//! bit-rotted image is detected at open instead of being replayed as a header.

use crc32fast::Hasher;

/// Size of the little-endian checksum trailer appended to an image.
pub const CHECKSUM_SIZE: usize = 4;

/// Computes the CRC32 of an image.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Returns `true` if `data` hashes to `expected`.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

/// Appends the checksum trailer to an image, producing the on-disk bytes.
pub fn seal(image: &[u8]) -> Vec<u8> {
    let mut sealed = Vec::with_capacity(image.len() + CHECKSUM_SIZE);
    sealed.extend_from_slice(image);
    sealed.extend_from_slice(&compute_checksum(image).to_le_bytes());
    sealed
}

/// Splits on-disk bytes into the image, verifying the trailer.
///
/// Returns `None` if the bytes are too short or the checksum does not match.
pub fn unseal(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() < CHECKSUM_SIZE {
        return None;
    }
    let (image, trailer) = bytes.split_at(bytes.len() - CHECKSUM_SIZE);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if verify_checksum(image, expected) {
        Some(image)
    } else {
        None
    }
}

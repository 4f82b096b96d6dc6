//! The `#Blob` and `#US` heaps.
//!
//! Both heaps store length-prefixed byte runs (ECMA-335 II.24.2.4). The prefix is a
//! compressed unsigned integer of 1, 2 or 4 bytes. `#US` entries additionally hold UTF-16LE
//! code units followed by one flag byte, which is set when any character needs more than
//! trivial handling.

use widestring::U16String;

use crate::{file::parser::Parser, Error, Result};

/// Decoded `#Blob` or `#US` heap.
///
/// ```rust
/// use cilmeta::metadata::streams::BlobHeap;
///
/// let heap = BlobHeap::from(vec![0x00, 0x03, 0x0A, 0x0B, 0x0C, 0x05, b'H', 0, b'i', 0, 0])?;
/// assert_eq!(heap.lookup(1)?, &[0x0A, 0x0B, 0x0C]);
/// assert_eq!(heap.user_string(5)?.to_string_lossy(), "Hi");
/// # Ok::<(), cilmeta::Error>(())
/// ```
pub struct BlobHeap {
    data: Vec<u8>,
}

impl BlobHeap {
    /// Create a `BlobHeap` from the bytes of a `#Blob` or `#US` stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadMetadataHeap`] if the heap is empty or does not start with
    /// the empty blob.
    pub fn from(data: Vec<u8>) -> Result<BlobHeap> {
        if data.first() != Some(&0) {
            return Err(bad_heap!("Blob heap must start with the empty blob"));
        }

        Ok(BlobHeap { data })
    }

    /// Get the blob at byte `offset`, without its length prefix.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfBounds`] if the offset or the declared length run
    /// past the heap, or [`crate::Error::BadMetadataHeap`] for an invalid length prefix.
    pub fn lookup(&self, offset: usize) -> Result<&[u8]> {
        let out_of_bounds = |index: usize| Error::IndexOutOfBounds {
            heap: "#Blob",
            index,
            len: self.data.len(),
        };

        if offset >= self.data.len() {
            return Err(out_of_bounds(offset));
        }

        let mut parser = Parser::new(&self.data[offset..]);
        let len = parser
            .read_compressed_uint()
            .map_err(|error| match error {
                Error::OutOfBounds => out_of_bounds(offset),
                other => other,
            })? as usize;

        let data_start = offset + parser.pos();
        let Some(data_end) = data_start.checked_add(len) else {
            return Err(out_of_bounds(usize::MAX));
        };

        self.data
            .get(data_start..data_end)
            .ok_or_else(|| out_of_bounds(data_end))
    }

    /// Interpret the blob at `offset` as a `#US` entry and decode its UTF-16 text.
    ///
    /// The trailing flag byte is dropped. Unpaired surrogates are preserved, as
    /// [`U16String`] does not require well-formed UTF-16.
    ///
    /// # Errors
    /// Returns the errors of [`BlobHeap::lookup`], or [`crate::Error::BadMetadataHeap`] if the
    /// entry length is not an odd number of bytes.
    pub fn user_string(&self, offset: usize) -> Result<U16String> {
        let blob = self.lookup(offset)?;
        if blob.is_empty() {
            return Ok(U16String::new());
        }

        if blob.len() % 2 != 1 {
            return Err(bad_heap!(
                "User string at offset {:#x} has even length {}",
                offset,
                blob.len()
            ));
        }

        let units: Vec<u16> = blob[..blob.len() - 1]
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(U16String::from_vec(units))
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds only the mandatory empty blob.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// Iterate over consecutive blobs as `(offset, bytes)`, skipping the empty blob at
    /// offset 0. Iteration stops at the first blob that cannot be decoded.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        let mut position = 1;
        std::iter::from_fn(move || {
            if position >= self.data.len() {
                return None;
            }

            let start = position;
            let blob = self.lookup(start).ok()?;
            let mut parser = Parser::new(&self.data[start..]);
            parser.read_compressed_uint().ok()?;
            position = start + parser.pos() + blob.len();

            Some((start, blob))
        })
    }
}

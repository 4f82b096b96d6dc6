//! The `#Strings` heap.
//!
//! Identifier strings (type, member and namespace names) are stored as null-terminated
//! UTF-8 runs, back to back, starting with the empty string at offset 0 (ECMA-335 II.24.2.3).
//! Table columns refer to them by byte offset. An offset may point into the middle of a run,
//! in which case it denotes that run's tail; compilers use this to share common suffixes.

use crate::{Error, Result};

/// Decoded `#Strings` heap.
///
/// Construction records the start offset of every run in ascending order. A lookup at a
/// recorded start returns that run; any other offset resolves to the run with the greatest
/// start below it, and returns the suffix beginning at the offset.
///
/// ```rust
/// use cilmeta::metadata::streams::StringsHeap;
///
/// let heap = StringsHeap::from(b"\0Hello\0World\0".to_vec())?;
/// assert_eq!(heap.lookup(0)?, "");
/// assert_eq!(heap.lookup(1)?, "Hello");
/// assert_eq!(heap.lookup(3)?, "llo");
/// assert_eq!(heap.lookup(7)?, "World");
/// # Ok::<(), cilmeta::Error>(())
/// ```
pub struct StringsHeap {
    data: Vec<u8>,
    /// `(start, end)` of every run, `end` being the position of its terminator
    runs: Vec<(usize, usize)>,
}

impl StringsHeap {
    /// Create a `StringsHeap` from the bytes of the `#Strings` stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadMetadataHeap`] if the heap is empty or does not start with
    /// a null byte.
    pub fn from(data: Vec<u8>) -> Result<StringsHeap> {
        if data.first() != Some(&0) {
            return Err(bad_heap!("#Strings heap must start with a null byte"));
        }

        let mut runs = Vec::new();
        let mut start = 0;
        for (position, byte) in data.iter().enumerate() {
            if *byte == 0 {
                runs.push((start, position));
                start = position + 1;
            }
        }

        if start < data.len() {
            log::warn!(
                "#Strings heap ends with an unterminated run at offset {start:#x}"
            );
            runs.push((start, data.len()));
        }

        log::debug!("#Strings heap: {} bytes, {} strings", data.len(), runs.len());

        Ok(StringsHeap { data, runs })
    }

    /// Get the string at byte `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfBounds`] if `offset` is beyond the heap, or
    /// [`crate::Error::BadMetadataHeap`] if the addressed bytes are not valid UTF-8 (which
    /// includes an offset splitting a multi-byte character).
    pub fn lookup(&self, offset: usize) -> Result<&str> {
        if offset >= self.data.len() {
            return Err(Error::IndexOutOfBounds {
                heap: "#Strings",
                index: offset,
                len: self.data.len(),
            });
        }

        let run = self.runs.partition_point(|(start, _)| *start <= offset);
        let Some((_, end)) = run.checked_sub(1).and_then(|index| self.runs.get(index)) else {
            return Err(bad_heap!("No string run covers offset {:#x}", offset));
        };

        std::str::from_utf8(&self.data[offset..*end])
            .map_err(|error| bad_heap!("Invalid UTF-8 string at offset {:#x} - {}", offset, error))
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds only the mandatory empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() <= 1
    }

    /// Number of recorded runs, including the empty string at offset 0.
    #[must_use]
    pub fn count(&self) -> usize {
        self.runs.len()
    }

    /// Iterate over every recorded run as `(offset, string)` in ascending offset order.
    /// Runs that are not valid UTF-8 are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.runs.iter().filter_map(|(start, end)| {
            std::str::from_utf8(&self.data[*start..*end])
                .ok()
                .map(|string| (*start, string))
        })
    }
}

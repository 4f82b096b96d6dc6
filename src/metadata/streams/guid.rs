//! The `#GUID` heap: a flat array of 16-byte GUIDs (ECMA-335 II.24.2.5).

use crate::{Error, Result};

/// Decoded `#GUID` heap.
///
/// [`GuidHeap::lookup`] addresses GUIDs by byte offset. Table columns such as `Module.Mvid`
/// store 1-based GUID numbers instead; [`GuidHeap::ordinal`] resolves those.
pub struct GuidHeap {
    data: Vec<u8>,
}

impl GuidHeap {
    /// Create a `GuidHeap` from the bytes of the `#GUID` stream.
    ///
    /// Trailing bytes that do not form a complete GUID are kept but cannot be looked up.
    #[must_use]
    pub fn from(data: Vec<u8>) -> GuidHeap {
        if data.len() % 16 != 0 {
            log::warn!(
                "#GUID heap size {} is not a multiple of 16, trailing bytes are unreachable",
                data.len()
            );
        }

        GuidHeap { data }
    }

    /// Get the GUID stored at byte `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfBounds`] if `offset + 16` exceeds the heap.
    pub fn lookup(&self, offset: usize) -> Result<uguid::Guid> {
        let out_of_bounds = || Error::IndexOutOfBounds {
            heap: "#GUID",
            index: offset,
            len: self.data.len(),
        };

        let end = offset.checked_add(16).ok_or_else(out_of_bounds)?;
        let Some(bytes) = self.data.get(offset..end) else {
            return Err(out_of_bounds());
        };

        let mut buffer = [0u8; 16];
        buffer.copy_from_slice(bytes);

        Ok(uguid::Guid::from_bytes(buffer))
    }

    /// Get the GUID with the 1-based number `index`, as stored in table columns.
    /// Index 0 is the null GUID reference and yields `None`.
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexOutOfBounds`] if the GUID lies beyond the heap.
    pub fn ordinal(&self, index: u32) -> Result<Option<uguid::Guid>> {
        if index == 0 {
            return Ok(None);
        }

        let offset = (index as usize - 1)
            .checked_mul(16)
            .ok_or(Error::IndexOutOfBounds {
                heap: "#GUID",
                index: index as usize,
                len: self.data.len(),
            })?;

        self.lookup(offset).map(Some)
    }

    /// Number of complete GUIDs in the heap.
    #[must_use]
    pub fn count(&self) -> usize {
        self.data.len() / 16
    }

    /// Size of the heap in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the heap holds no complete GUID.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Iterate over all GUIDs as `(ordinal, guid)`, starting at ordinal 1.
    pub fn iter(&self) -> impl Iterator<Item = (u32, uguid::Guid)> + '_ {
        self.data.chunks_exact(16).zip(1_u32..).map(|(chunk, index)| {
            let mut buffer = [0u8; 16];
            buffer.copy_from_slice(chunk);
            (index, uguid::Guid::from_bytes(buffer))
        })
    }
}

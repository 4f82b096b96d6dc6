//! Byte access for metadata decoding.
//!
//! The decoder consumes a metadata blob the caller has already located, and only reaches
//! back into the surrounding executable image to read method bodies. That access goes
//! through the narrow [`ImageProvider`] interface defined here:
//!
//! - [`ImageProvider::rva_to_offset`] translates a relative virtual address to a file offset
//! - [`ImageProvider::read_bytes`] serves a bounds-checked byte range at a file offset
//!
//! Two providers ship with the crate. [`Memory`] owns its buffer, [`Physical`] memory-maps a
//! file from disk. Both translate addresses through a [`SectionMap`], which is the identity
//! mapping when no sections are registered (useful for raw dumps and synthetic images).
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::file::{ImageProvider, Memory, Section, SectionMap};
//!
//! let sections = SectionMap::new(vec![Section {
//!     virtual_address: 0x2000,
//!     virtual_size: 0x100,
//!     pointer_to_raw_data: 0x200,
//!     size_of_raw_data: 0x100,
//! }]);
//!
//! let image = Memory::with_sections(vec![0u8; 0x300], sections);
//! assert_eq!(image.rva_to_offset(0x2010)?, 0x210);
//! assert_eq!(image.read_bytes(0x210, 4)?, &[0, 0, 0, 0]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

mod memory;
mod physical;

pub mod io;
pub mod parser;

pub use memory::Memory;
pub use physical::Physical;

use crate::{Error, Result};

/// The collaborator interface through which method bodies are read from an image.
///
/// Implementations must be thread-safe, as a [`crate::MetadataRoot`] may be shared between
/// threads while bodies are decoded.
pub trait ImageProvider: Send + Sync {
    /// Translate a relative virtual address into a file offset.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidRva`] if no section maps the address.
    fn rva_to_offset(&self, rva: u32) -> Result<u64>;

    /// Return `len` bytes starting at file `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the range exceeds the image.
    fn read_bytes(&self, offset: u64, len: usize) -> Result<&[u8]>;

    /// Return the bytes available from file `offset` up to the end of the image.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `offset` is past the end of the image.
    fn read_to_end(&self, offset: u64) -> Result<&[u8]> {
        let total = self.image_len();
        let start = usize::try_from(offset).map_err(|_| Error::OutOfBounds)?;
        if start > total {
            return Err(Error::OutOfBounds);
        }

        self.read_bytes(offset, total - start)
    }

    /// Total size of the underlying image in bytes.
    fn image_len(&self) -> usize;
}

/// Raw storage behind a provider.
///
/// Separates how bytes are held (owned vector, mapped file) from how addresses are
/// translated, so both providers share the same bounds checks.
pub(crate) trait Backend: Send + Sync {
    /// Get a slice of the data at `offset` with `len` bytes.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(end) = offset.checked_add(len) else {
            return Err(Error::OutOfBounds);
        };

        if end > data.len() {
            return Err(Error::OutOfBounds);
        }

        Ok(&data[offset..end])
    }

    /// The complete backing buffer.
    fn data(&self) -> &[u8];
}

/// One section header of an executable image, as needed for address translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// RVA at which the section is loaded
    pub virtual_address: u32,
    /// Size of the section once loaded
    pub virtual_size: u32,
    /// File offset of the section's raw data
    pub pointer_to_raw_data: u32,
    /// Size of the section's raw data in the file
    pub size_of_raw_data: u32,
}

impl Section {
    fn extent(&self) -> u32 {
        if self.virtual_size == 0 {
            self.size_of_raw_data
        } else {
            self.virtual_size
        }
    }
}

/// RVA to file offset translation over a list of sections.
///
/// An empty map translates every RVA to the identical file offset.
#[derive(Debug, Clone, Default)]
pub struct SectionMap {
    sections: Vec<Section>,
}

impl SectionMap {
    /// Create a map from the image's section headers.
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        SectionMap { sections }
    }

    /// The identity mapping, where every RVA equals its file offset.
    #[must_use]
    pub fn identity() -> Self {
        SectionMap::default()
    }

    /// All registered sections in declaration order.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Converts a relative virtual address to a file offset.
    ///
    /// An address inside a section's virtual extent but past its raw data lies in the
    /// zero-filled tail of the loaded section and has no file offset. Sections whose extent
    /// overflows the 32-bit address space are skipped.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidRva`] if no section holds file data for the address.
    pub fn rva_to_offset(&self, rva: u32) -> Result<u64> {
        if self.sections.is_empty() {
            return Ok(u64::from(rva));
        }

        for section in &self.sections {
            let Some(section_max) = section.virtual_address.checked_add(section.extent()) else {
                log::warn!(
                    "section at rva {:#x} overflows the address space, skipping",
                    section.virtual_address
                );
                continue;
            };

            if section.virtual_address <= rva && rva < section_max {
                let delta = rva - section.virtual_address;
                if delta >= section.size_of_raw_data {
                    return Err(Error::InvalidRva(rva));
                }

                return Ok(u64::from(delta) + u64::from(section.pointer_to_raw_data));
            }
        }

        Err(Error::InvalidRva(rva))
    }
}

fn backend_read<B: Backend + ?Sized>(backend: &B, offset: u64, len: usize) -> Result<&[u8]> {
    let offset = usize::try_from(offset).map_err(|_| Error::OutOfBounds)?;
    backend.data_slice(offset, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_and_rsrc() -> SectionMap {
        SectionMap::new(vec![
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x1000,
                pointer_to_raw_data: 0x400,
                size_of_raw_data: 0x1000,
            },
            Section {
                virtual_address: 0x4000,
                virtual_size: 0,
                pointer_to_raw_data: 0x1400,
                size_of_raw_data: 0x200,
            },
        ])
    }

    #[test]
    fn identity_mapping() {
        let map = SectionMap::identity();
        assert_eq!(map.rva_to_offset(0).unwrap(), 0);
        assert_eq!(map.rva_to_offset(0x1234).unwrap(), 0x1234);
    }

    #[test]
    fn section_mapping() {
        let map = text_and_rsrc();
        assert_eq!(map.rva_to_offset(0x2000).unwrap(), 0x400);
        assert_eq!(map.rva_to_offset(0x2FFF).unwrap(), 0x13FF);
        assert_eq!(map.rva_to_offset(0x4010).unwrap(), 0x1410);
    }

    #[test]
    fn unmapped_rva() {
        let map = text_and_rsrc();
        assert!(matches!(map.rva_to_offset(0x1000), Err(Error::InvalidRva(0x1000))));
        assert!(matches!(map.rva_to_offset(0x3000), Err(Error::InvalidRva(0x3000))));
        assert!(matches!(map.rva_to_offset(0x4200), Err(Error::InvalidRva(0x4200))));
    }

    #[test]
    fn overflowing_section() {
        let map = SectionMap::new(vec![Section {
            virtual_address: u32::MAX - 4,
            virtual_size: 0x100,
            pointer_to_raw_data: 0,
            size_of_raw_data: 0x100,
        }]);
        assert!(map.rva_to_offset(u32::MAX - 2).is_err());
    }

    #[test]
    fn overflowing_section_is_skipped() {
        let map = SectionMap::new(vec![
            Section {
                virtual_address: 0xFFFF_FF00,
                virtual_size: 0x200,
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x200,
            },
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0x400,
                size_of_raw_data: 0x100,
            },
        ]);
        assert_eq!(map.rva_to_offset(0x2010).unwrap(), 0x410);
        assert!(matches!(
            map.rva_to_offset(0xFFFF_FF10),
            Err(Error::InvalidRva(0xFFFF_FF10))
        ));
    }

    #[test]
    fn uninitialized_tail() {
        // Virtual size exceeds the raw data, the next section's bytes follow in the file
        let map = SectionMap::new(vec![
            Section {
                virtual_address: 0x2000,
                virtual_size: 0x200,
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x100,
            },
            Section {
                virtual_address: 0x4000,
                virtual_size: 0x100,
                pointer_to_raw_data: 0x300,
                size_of_raw_data: 0x100,
            },
        ]);
        assert_eq!(map.rva_to_offset(0x20FF).unwrap(), 0x2FF);
        assert!(matches!(map.rva_to_offset(0x2100), Err(Error::InvalidRva(0x2100))));
        assert!(matches!(map.rva_to_offset(0x2150), Err(Error::InvalidRva(0x2150))));
        assert_eq!(map.rva_to_offset(0x4000).unwrap(), 0x300);
    }
}

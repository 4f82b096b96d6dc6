//! Memory-mapped image provider.
//!
//! [`Physical`] maps an executable image from disk into the address space instead of reading
//! it up front. Method bodies are scattered across the `.text` section, so only the pages
//! actually touched while decoding them are ever loaded.
//!
//! ```rust,no_run
//! use cilmeta::file::{ImageProvider, Physical};
//!
//! let image = Physical::new("MyAssembly.dll")?;
//! let dos = image.read_bytes(0, 2)?;
//! assert_eq!(dos, b"MZ");
//! # Ok::<(), cilmeta::Error>(())
//! ```

use super::{backend_read, Backend, ImageProvider, SectionMap};
use crate::{Error::Error, Result};

use memmap2::Mmap;
use std::{fs, path::Path};

/// An image provider that uses memory-mapped I/O to access a file on disk.
///
/// All reads are bounds-checked against the mapped length.
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped file data
    data: Mmap,
    sections: SectionMap,
}

impl Physical {
    /// Create a new physical provider by memory-mapping the specified file. RVAs are
    /// translated with the identity mapping until [`Physical::set_sections`] is called.
    ///
    /// # Arguments
    /// * `path` - Path to the image on disk
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path)?;
        Self::from_std_file(file)
    }

    /// Creates a new physical provider from an opened [`std::fs::File`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if memory mapping fails.
    #[allow(clippy::needless_pass_by_value)]
    pub fn from_std_file(file: fs::File) -> Result<Physical> {
        // The file must not be modified while mapped; the mapping is read-only and shared.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|error| Error(error.to_string()))?;

        log::debug!("mapped image of {} bytes", mmap.len());

        Ok(Physical {
            data: mmap,
            sections: SectionMap::identity(),
        })
    }

    /// Replace the section map used for RVA translation.
    pub fn set_sections(&mut self, sections: SectionMap) {
        self.sections = sections;
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}

impl ImageProvider for Physical {
    fn rva_to_offset(&self, rva: u32) -> Result<u64> {
        self.sections.rva_to_offset(rva)
    }

    fn read_bytes(&self, offset: u64, len: usize) -> Result<&[u8]> {
        backend_read(self, offset, len)
    }

    fn image_len(&self) -> usize {
        self.data.len()
    }
}

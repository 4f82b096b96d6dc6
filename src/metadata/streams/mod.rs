//! Metadata streams and the heaps decoded from them.
//!
//! The metadata root names each stream, and the name decides the heap built from its body:
//!
//! - **`#~`** / **`#-`** - the metadata tables, see [`TablesHeap`]
//! - **`#Strings`** - null-terminated UTF-8 identifiers, see [`StringsHeap`]
//! - **`#GUID`** - 16-byte GUIDs, see [`GuidHeap`]
//! - **`#Blob`** / **`#US`** - length-prefixed byte runs, see [`BlobHeap`]
//!
//! A [`Stream`] decodes its heap on first access and keeps it for the lifetime of the
//! metadata root.
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::MetadataRoot;
//!
//! let blob = std::fs::read("metadata.bin")?;
//! let root = MetadataRoot::read(&blob)?;
//! for stream in root.streams() {
//!     println!("{:<10} {:#x} {} bytes", stream.name(), stream.header().offset, stream.data().len());
//! }
//!
//! let strings = root.strings()?;
//! println!("{}", strings.lookup(1)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod blob;
mod guid;
mod streamheader;
mod strings;
mod tablesheader;

pub use blob::BlobHeap;
pub use guid::GuidHeap;
pub use streamheader::{Stream, StreamHeader, StreamKind, MAX_STREAM_NAME};
pub use strings::StringsHeap;
pub use tablesheader::{TablesHeap, TABLES_HEADER_SIZE};

/// A heap decoded from a stream body.
pub enum Heap {
    /// Decoded `#~` or `#-` stream
    Tables(TablesHeap),
    /// Decoded `#Strings` stream
    Strings(StringsHeap),
    /// Decoded `#GUID` stream
    Guid(GuidHeap),
    /// Decoded `#Blob` or `#US` stream
    Blob(BlobHeap),
}

impl Heap {
    /// The tables heap, if this is one.
    #[must_use]
    pub fn as_tables(&self) -> Option<&TablesHeap> {
        match self {
            Heap::Tables(tables) => Some(tables),
            _ => None,
        }
    }

    /// The strings heap, if this is one.
    #[must_use]
    pub fn as_strings(&self) -> Option<&StringsHeap> {
        match self {
            Heap::Strings(strings) => Some(strings),
            _ => None,
        }
    }

    /// The GUID heap, if this is one.
    #[must_use]
    pub fn as_guids(&self) -> Option<&GuidHeap> {
        match self {
            Heap::Guid(guids) => Some(guids),
            _ => None,
        }
    }

    /// The blob heap, if this is one.
    #[must_use]
    pub fn as_blobs(&self) -> Option<&BlobHeap> {
        match self {
            Heap::Blob(blobs) => Some(blobs),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Heap::Tables(tables) => write!(f, "Tables({} tables)", tables.table_count()),
            Heap::Strings(strings) => write!(f, "Strings({} bytes)", strings.len()),
            Heap::Guid(guids) => write!(f, "Guid({} guids)", guids.count()),
            Heap::Blob(blobs) => write!(f, "Blob({} bytes)", blobs.len()),
        }
    }
}

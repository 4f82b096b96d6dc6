use std::sync::OnceLock;

use crate::{
    file::parser::Parser,
    metadata::{
        config::LoaderConfig,
        streams::{BlobHeap, GuidHeap, Heap, StringsHeap, TablesHeap},
    },
    Result,
};

/// Longest stream name accepted, excluding the terminator.
pub const MAX_STREAM_NAME: usize = 32;

/// A stream header, as found in the stream directory of the metadata root.
///
/// ```text
/// Offset  Size  Field
/// 0       4     Offset of the stream body, relative to the metadata root
/// 4       4     Size of the stream body in bytes
/// 8       n     Name, null terminated and padded to a multiple of 4
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream body from the start of the metadata root
    pub offset: u32,
    /// Size of the stream body in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Read a stream header at the parser's position and skip the name padding.
    ///
    /// The padding is measured from the start of the parser's data, which must be the start
    /// of the metadata root.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the header is truncated, or
    /// [`crate::Error::BadMetadataHeap`] if the name is not terminated within
    /// [`MAX_STREAM_NAME`] characters or is not ASCII.
    pub fn read(parser: &mut Parser) -> Result<StreamHeader> {
        let offset = parser.read_le::<u32>()?;
        let size = parser.read_le::<u32>()?;

        let name_start = parser.pos();
        let window = &parser.data()[name_start..];
        let window = &window[..window.len().min(MAX_STREAM_NAME + 1)];
        let Some(name_len) = window.iter().position(|b| *b == 0) else {
            return Err(bad_heap!(
                "Stream name at offset {:#x} is not terminated within {} bytes",
                name_start,
                MAX_STREAM_NAME
            ));
        };

        let name_bytes = parser.read_bytes(name_len + 1)?;
        if !name_bytes[..name_len].is_ascii() {
            return Err(bad_heap!("Stream name at offset {:#x} is not ASCII", name_start));
        }

        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();
        parser.align(4)?;

        Ok(StreamHeader { offset, size, name })
    }

    /// The kind of heap implied by the stream name.
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        StreamKind::from_name(&self.name)
    }
}

/// The heap kind a stream name stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamKind {
    /// `#~`, optimized tables
    Tables,
    /// `#-`, unoptimized tables
    UncompressedTables,
    /// `#Strings`
    Strings,
    /// `#GUID`
    Guid,
    /// `#Blob`
    Blob,
    /// `#US`
    UserStrings,
    /// Any other name
    Unknown,
}

impl StreamKind {
    /// Map a stream name to its kind.
    #[must_use]
    pub fn from_name(name: &str) -> StreamKind {
        match name {
            "#~" => StreamKind::Tables,
            "#-" => StreamKind::UncompressedTables,
            "#Strings" => StreamKind::Strings,
            "#GUID" => StreamKind::Guid,
            "#Blob" => StreamKind::Blob,
            "#US" => StreamKind::UserStrings,
            _ => StreamKind::Unknown,
        }
    }

    /// Returns true for `#~` and `#-`.
    #[must_use]
    pub fn is_tables(&self) -> bool {
        matches!(self, StreamKind::Tables | StreamKind::UncompressedTables)
    }
}

/// A stream of the metadata root: its header, a copy of its body, and the heap decoded from
/// that body.
///
/// The heap is built on the first call to [`Stream::heap`] and memoized, including a
/// failure. Concurrent first calls block until a single decode completes and then observe
/// the same result.
pub struct Stream {
    header: StreamHeader,
    data: Vec<u8>,
    config: LoaderConfig,
    heap: OnceLock<Result<Heap>>,
}

impl Stream {
    /// Create a stream owning `data`.
    #[must_use]
    pub fn new(header: StreamHeader, data: Vec<u8>, config: LoaderConfig) -> Stream {
        Stream {
            header,
            data,
            config,
            heap: OnceLock::new(),
        }
    }

    /// The stream header.
    #[must_use]
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    /// The stream name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// The raw stream body.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The heap kind implied by the name.
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.header.kind()
    }

    /// The heap of this stream, decoded on first use.
    ///
    /// # Errors
    /// Returns the error of the heap decode, or [`crate::Error::BadMetadataHeap`] for a stream
    /// name that does not denote a heap. The same error is returned on every call.
    pub fn heap(&self) -> Result<&Heap> {
        self.heap
            .get_or_init(|| self.decode())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Returns true once the heap has been decoded, successfully or not.
    #[must_use]
    pub fn is_decoded(&self) -> bool {
        self.heap.get().is_some()
    }

    fn decode(&self) -> Result<Heap> {
        log::debug!(
            "decoding stream {} ({} bytes)",
            self.header.name,
            self.data.len()
        );

        let data = &self.data;
        match self.kind() {
            StreamKind::Tables | StreamKind::UncompressedTables => {
                let tables = if self.config.lenient_tables {
                    TablesHeap::read_lenient(data)?
                } else {
                    TablesHeap::read(data)?
                };
                Ok(Heap::Tables(tables))
            }
            StreamKind::Strings => Ok(Heap::Strings(StringsHeap::from(data.clone())?)),
            StreamKind::Guid => Ok(Heap::Guid(GuidHeap::from(data.clone()))),
            StreamKind::Blob | StreamKind::UserStrings => {
                Ok(Heap::Blob(BlobHeap::from(data.clone())?))
            }
            StreamKind::Unknown => Err(bad_heap!(
                "Stream {} does not denote a heap",
                self.header.name
            )),
        }
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("header", &self.header)
            .field("decoded", &self.is_decoded())
            .finish_non_exhaustive()
    }
}

//! Metadata root header and stream directory.
//!
//! The metadata root is the entry point for reading CLI metadata. It carries the version
//! string and the directory of streams (`#~`, `#Strings`, `#Blob`, ...), each given as an
//! offset and size relative to the root itself.
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Signature, 0x424A5342 ("BSJB")
//! 4       2     MajorVersion
//! 6       2     MinorVersion
//! 8       4     Reserved
//! 12      4     Length of the version string, padded to a multiple of 4
//! 16      n     Version string, null terminated
//! 16+n    2     Flags
//! 18+n    2     Number of streams
//! 20+n    ...   Stream headers
//! ```
//!
//! # References
//!
//! - [ECMA-335 II.24.2.1: Metadata root](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use crate::{
    file::{parser::Parser, ImageProvider},
    metadata::{
        config::LoaderConfig,
        method::MethodBody,
        streams::{
            BlobHeap, GuidHeap, Heap, Stream, StreamHeader, StreamKind, StringsHeap, TablesHeap,
        },
        tables::{dump_row, DumpHeaps, TableId},
    },
    Error, Result,
};

/// The MAGIC value indicating the CIL header
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

/// Size of the root header up to the version string
const ROOT_HEADER_SIZE: usize = 16;

/// The metadata root: header fields and every stream it declares.
///
/// The root owns a copy of every stream body. Heaps are decoded from those copies on first
/// access, except for the tables heap which is decoded while loading.
///
/// # Example
///
/// ```rust,no_run
/// use cilmeta::{metadata::tables::TableId, MetadataRoot};
///
/// let blob = std::fs::read("metadata.bin")?;
/// let root = MetadataRoot::read(&blob)?;
/// println!("Metadata version: {}", root.version);
///
/// let strings = root.strings()?;
/// if let Some(types) = root.tables()?.table(TableId::TypeDef) {
///     for row in types.iter() {
///         println!("{}", strings.lookup(row.get_by_name("TypeName")? as usize)?);
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MetadataRoot {
    /// Magic signature for physical metadata: 0x424A5342
    pub signature: u32,
    /// `MajorVersion`
    pub major_version: u16,
    /// `MinorVersion`
    pub minor_version: u16,
    /// Reserved, always 0
    pub reserved: u32,
    /// Version string without terminator and padding, e.g. `v4.0.30319`
    pub version: String,
    /// Reserved, always 0
    pub flags: u16,
    streams: Vec<Stream>,
    config: LoaderConfig,
}

impl MetadataRoot {
    /// Read a metadata root from `data`, which must start at the root signature, with the
    /// default [`LoaderConfig`].
    ///
    /// # Errors
    /// See [`MetadataRoot::read_with_config`].
    pub fn read(data: &[u8]) -> Result<MetadataRoot> {
        Self::read_with_config(data, LoaderConfig::default())
    }

    /// Read a metadata root from `data` with an explicit configuration.
    ///
    /// Stream bodies are copied out of `data`. The tables heap is always decoded here; the
    /// other heaps only if [`LoaderConfig::eager_heaps`] is set.
    ///
    /// # Errors
    /// - [`crate::Error::BadMetadataSignature`] if the signature is not `BSJB`
    /// - [`crate::Error::TruncatedMetadata`] if the header, the directory or a stream body
    ///   runs past the end of `data`
    /// - [`crate::Error::BadMetadataHeap`] for too many streams, a malformed stream name, a
    ///   missing `#~`/`#-` stream, or an invalid tables heap
    /// - any error of the tables heap decode, and with `eager_heaps` of the other heaps
    pub fn read_with_config(data: &[u8], config: LoaderConfig) -> Result<MetadataRoot> {
        let mut parser = Parser::new(data);
        let truncated = |parser: &Parser, needed: usize| Error::TruncatedMetadata {
            table: None,
            offset: parser.pos(),
            needed,
            available: parser.remaining(),
        };

        if data.len() < 4 {
            return Err(truncated(&parser, ROOT_HEADER_SIZE));
        }

        let signature = parser.read_le::<u32>()?;
        if signature != CIL_HEADER_MAGIC {
            return Err(Error::BadMetadataSignature(signature));
        }

        if data.len() < ROOT_HEADER_SIZE {
            return Err(truncated(&parser, ROOT_HEADER_SIZE - parser.pos()));
        }

        let major_version = parser.read_le::<u16>()?;
        let minor_version = parser.read_le::<u16>()?;
        let reserved = parser.read_le::<u32>()?;
        let version_length = parser.read_le::<u32>()? as usize;

        let version_bytes = parser
            .read_bytes(version_length)
            .map_err(|_| truncated(&parser, version_length))?;
        let version_end = version_bytes
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_end]).into_owned();

        // The declared length is padded already, but producers are not required to comply
        parser.align(4).map_err(|_| truncated(&parser, 4))?;

        if parser.remaining() < 4 {
            return Err(truncated(&parser, 4));
        }
        let flags = parser.read_le::<u16>()?;
        let stream_count = parser.read_le::<u16>()?;

        if stream_count > config.max_streams {
            return Err(bad_heap!(
                "Metadata root declares {} streams, at most {} are accepted",
                stream_count,
                config.max_streams
            ));
        }

        log::debug!(
            "metadata root {version} v{major_version}.{minor_version}, {stream_count} streams"
        );

        let mut streams: Vec<Stream> = Vec::with_capacity(usize::from(stream_count));
        for _ in 0..stream_count {
            let header = StreamHeader::read(&mut parser).map_err(|error| match error {
                Error::OutOfBounds => truncated(&parser, 8),
                other => other,
            })?;

            let start = header.offset as usize;
            let size = header.size as usize;
            let Some(body) = start
                .checked_add(size)
                .and_then(|end| data.get(start..end))
            else {
                return Err(Error::TruncatedMetadata {
                    table: None,
                    offset: start,
                    needed: size,
                    available: data.len().saturating_sub(start),
                });
            };

            match header.kind() {
                StreamKind::Unknown => log::warn!(
                    "unknown stream {} at {:#x}, {} bytes",
                    header.name,
                    header.offset,
                    header.size
                ),
                _ => log::debug!(
                    "stream {} at {:#x}, {} bytes",
                    header.name,
                    header.offset,
                    header.size
                ),
            }

            if streams.iter().any(|stream| stream.name() == header.name) {
                log::warn!("duplicate stream {}, the first one is used", header.name);
            }

            streams.push(Stream::new(header, body.to_vec(), config));
        }

        let root = MetadataRoot {
            signature,
            major_version,
            minor_version,
            reserved,
            version,
            flags,
            streams,
            config,
        };

        root.tables()?;
        if config.eager_heaps {
            for stream in root.streams() {
                if stream.kind() != StreamKind::Unknown {
                    stream.heap()?;
                }
            }
        }

        Ok(root)
    }

    /// Read the metadata root of an image through `provider`.
    ///
    /// ## Arguments
    /// * 'provider' - The image holding the metadata
    /// * 'rva'      - RVA of the metadata root, as given by the CLI header
    /// * 'size'     - Size of the metadata, as given by the CLI header
    /// * 'config'   - Loader configuration
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidRva`] or [`crate::Error::OutOfBounds`] if the provider
    /// cannot serve the range, or any error of [`MetadataRoot::read_with_config`].
    pub fn load(
        provider: &dyn ImageProvider,
        rva: u32,
        size: usize,
        config: LoaderConfig,
    ) -> Result<MetadataRoot> {
        let offset = provider.rva_to_offset(rva)?;
        let data = provider.read_bytes(offset, size)?;

        Self::read_with_config(data, config)
    }

    /// The configuration the root was loaded with.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// All streams in directory order.
    pub fn streams(&self) -> impl Iterator<Item = &Stream> {
        self.streams.iter()
    }

    /// Number of streams in the directory.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// The first stream called `name`.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&Stream> {
        self.streams.iter().find(|stream| stream.name() == name)
    }

    fn heap(&self, name: &'static str) -> Result<&Heap> {
        self.stream(name).ok_or(Error::StreamNotFound(name))?.heap()
    }

    /// The tables heap of the `#~` stream, or of the `#-` stream if there is no `#~`.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadMetadataHeap`] if neither stream exists.
    pub fn tables(&self) -> Result<&TablesHeap> {
        let stream = self
            .stream("#~")
            .or_else(|| self.stream("#-"))
            .ok_or_else(|| bad_heap!("Metadata root has no #~ or #- stream"))?;

        stream
            .heap()?
            .as_tables()
            .ok_or_else(|| bad_heap!("Stream {} is not a tables heap", stream.name()))
    }

    /// The `#Strings` heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::StreamNotFound`] if there is no `#Strings` stream, or the error
    /// of decoding it.
    pub fn strings(&self) -> Result<&StringsHeap> {
        self.heap("#Strings")?
            .as_strings()
            .ok_or_else(|| bad_heap!("#Strings is not a strings heap"))
    }

    /// The `#GUID` heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::StreamNotFound`] if there is no `#GUID` stream.
    pub fn guids(&self) -> Result<&GuidHeap> {
        self.heap("#GUID")?
            .as_guids()
            .ok_or_else(|| bad_heap!("#GUID is not a GUID heap"))
    }

    /// The `#Blob` heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::StreamNotFound`] if there is no `#Blob` stream, or the error
    /// of decoding it.
    pub fn blobs(&self) -> Result<&BlobHeap> {
        self.heap("#Blob")?
            .as_blobs()
            .ok_or_else(|| bad_heap!("#Blob is not a blob heap"))
    }

    /// The `#US` heap, read with [`BlobHeap::user_string`].
    ///
    /// # Errors
    /// Returns [`crate::Error::StreamNotFound`] if there is no `#US` stream, or the error of
    /// decoding it.
    pub fn user_strings(&self) -> Result<&BlobHeap> {
        self.heap("#US")?
            .as_blobs()
            .ok_or_else(|| bad_heap!("#US is not a blob heap"))
    }

    /// Decode the body of method `rid` of the `MethodDef` table, reading it from `provider`.
    ///
    /// Returns `None` for methods without a body (RVA 0), such as abstract or runtime
    /// implemented methods. The body is measured first, so only its own bytes are read.
    ///
    /// # Errors
    /// - [`crate::Error::RowOutOfRange`] if there is no such method
    /// - [`crate::Error::InvalidRva`] if the provider cannot map the method's RVA
    /// - [`crate::Error::TruncatedMethodBody`] if the image ends inside the body
    /// - [`crate::Error::MalformedMethodBody`] for an invalid header
    pub fn method_body(
        &self,
        rid: u32,
        provider: &dyn ImageProvider,
    ) -> Result<Option<MethodBody>> {
        let methods = self
            .tables()?
            .table(TableId::MethodDef)
            .ok_or(Error::RowOutOfRange {
                table: TableId::MethodDef,
                rid,
            })?;

        let rva = methods.value(rid, "RVA")?;
        if rva == 0 {
            return Ok(None);
        }

        let offset = provider.rva_to_offset(rva)?;
        let available = usize::try_from(offset)
            .map(|start| provider.image_len().saturating_sub(start))
            .unwrap_or(0);
        let read = |len: usize| {
            provider
                .read_bytes(offset, len)
                .map_err(|_| Error::TruncatedMethodBody {
                    needed: len,
                    available,
                })
        };

        let extent = MethodBody::extent(read)?;
        log::debug!("method {rid}: body at rva {rva:#x}, offset {offset:#x}, {extent} bytes");

        MethodBody::from(read(extent)?).map(Some)
    }

    /// Render row `rid` of `table` as `Column : value` lines, resolving heap references
    /// through the heaps of this root where they are available.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowOutOfRange`] if the table is absent or has no such row.
    pub fn dump_row(&self, table: TableId, rid: u32) -> Result<String> {
        let store = self
            .tables()?
            .table(table)
            .ok_or(Error::RowOutOfRange { table, rid })?;
        let row = store.row(rid)?;

        let heaps = DumpHeaps {
            strings: self.strings().ok(),
            guids: self.guids().ok(),
            blobs: self.blobs().ok(),
        };

        Ok(dump_row(&row, heaps))
    }
}

impl std::fmt::Debug for MetadataRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRoot")
            .field("version", &self.version)
            .field("major_version", &self.major_version)
            .field("minor_version", &self.minor_version)
            .field("flags", &self.flags)
            .field("streams", &self.streams)
            .finish()
    }
}

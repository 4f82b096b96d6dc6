use std::sync::Arc;

use thiserror::Error;

use crate::metadata::tables::{CodedIndexType, TableId};

macro_rules! bad_heap {
    // Single string version
    ($msg:expr) => {
        crate::Error::BadMetadataHeap {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::BadMetadataHeap {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// None of these failures is retryable: decoding operates on static data. Low-level heap and
/// table functions return them instead of aborting a whole load, so a caller can keep working
/// with the parts of the metadata that did decode.
///
/// # Error Categories
///
/// ## Structural
/// - [`Error::BadMetadataSignature`] - The metadata root does not start with `BSJB`
/// - [`Error::BadMetadataHeap`] - A heap or stream violates a structural invariant
/// - [`Error::StreamNotFound`] - A requested stream is not part of the root
///
/// ## Truncation
/// - [`Error::TruncatedMetadata`] - A table or header runs past the end of its stream
/// - [`Error::TruncatedMethodBody`] - A method body is shorter than its header declares
/// - [`Error::OutOfBounds`] - A raw read went past the end of its buffer
///
/// ## References
/// - [`Error::MalformedToken`] - A coded index carries a tag outside its union
/// - [`Error::IndexOutOfBounds`] - A heap lookup beyond the heap's extent
/// - [`Error::RowOutOfRange`] - A row id that is 0 or beyond its table
///
/// # Examples
///
/// ```rust
/// use cilmeta::{Error, MetadataRoot};
///
/// match MetadataRoot::read(&[0u8; 64]) {
///     Err(Error::BadMetadataSignature(found)) => println!("not metadata: {found:#x}"),
///     Err(e) => println!("other failure: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// The 4-byte magic at the start of the metadata root is not `0x424A5342` ("BSJB").
    #[error("Bad metadata signature - expected 0x424A5342, found {0:#010x}")]
    BadMetadataSignature(u32),

    /// A structural invariant of a heap or stream was violated.
    ///
    /// Examples are a `#Strings` heap that does not start with a null byte, or a root
    /// without a `#~`/`#-` stream. The source location that detected the problem is
    /// recorded for debugging purposes.
    #[error("Bad metadata heap - {file}:{line}: {message}")]
    BadMetadataHeap {
        /// Description of the violated invariant
        message: String,
        /// The source file in which this error occurred
        file: &'static str,
        /// The source line in which this error occurred
        line: u32,
    },

    /// The read cursor of the tables heap would have passed the end of the stream.
    ///
    /// `table` is `None` while the header and row-count array are read.
    #[error("Truncated metadata in {table:?} at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedMetadata {
        /// The table being decoded, if any
        table: Option<TableId>,
        /// Offset within the tables stream at which the read was attempted
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
        /// Number of bytes left in the stream
        available: usize,
    },

    /// A method body declares more header or code bytes than are available.
    #[error("Truncated method body: needed {needed} bytes, {available} available")]
    TruncatedMethodBody {
        /// Bytes required by the header and code size
        needed: usize,
        /// Bytes actually present
        available: usize,
    },

    /// A method body header is neither Tiny nor Fat, or its Fat header is too small.
    #[error("Malformed method body - {0}")]
    MalformedMethodBody(String),

    /// A coded index carries a tag outside the range of its union, or a tag reserved as unused.
    #[error("Malformed {kind:?} token - tag {tag} in raw value {raw:#x}")]
    MalformedToken {
        /// The coded index union being decoded
        kind: CodedIndexType,
        /// The offending tag
        tag: u32,
        /// The raw coded value
        raw: u32,
    },

    /// A heap was accessed at an offset beyond its extent.
    #[error("Index {index} is out of bounds for the {heap} heap of {len} bytes")]
    IndexOutOfBounds {
        /// Name of the heap, e.g. `#Strings`
        heap: &'static str,
        /// The requested offset
        index: usize,
        /// The heap size in bytes
        len: usize,
    },

    /// A row id of 0, or beyond the row count of its table, was requested.
    #[error("Row {rid} is out of range for table {table:?}")]
    RowOutOfRange {
        /// The table being accessed
        table: TableId,
        /// The requested 1-based row id
        rid: u32,
    },

    /// A stream required for the requested operation is not present.
    #[error("Stream not found - {0}")]
    StreamNotFound(&'static str),

    /// The image provider could not translate a relative virtual address.
    #[error("RVA {0:#x} could not be converted to a file offset")]
    InvalidRva(u32),

    /// An out of bound access was attempted while reading raw bytes.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// File I/O error while opening an image.
    #[error("{0}")]
    FileError(Arc<std::io::Error>),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileError(Arc::new(error))
    }
}

//! Metadata tokens and the compressed integer encoding.
//!
//! A [`Token`] is the 32-bit identifier of a metadata row: the table index in the high byte
//! and the 1-based row id in the low 24 bits. Inside blobs (signatures, custom attribute
//! values) references and lengths are stored as compressed unsigned integers
//! (ECMA-335 II.23.2), which this module can produce and consume.
//!
//! ```rust
//! use cilmeta::metadata::{tables::TableId, token::{compress_uint, decompress_uint, Token}};
//!
//! let encoded = compress_uint(0x80)?;
//! assert_eq!(encoded.as_bytes(), &[0x80, 0x80]);
//! assert_eq!(decompress_uint(encoded.as_bytes())?, (0x80, 2));
//!
//! // TypeRef row 0x12 becomes (0x12 << 2) | 1
//! let type_ref = Token::from_parts(TableId::TypeRef, 0x12);
//! assert_eq!(type_ref.compress()?.as_bytes(), &[0x49]);
//! # Ok::<(), cilmeta::Error>(())
//! ```

use std::fmt;

use crate::{file::parser::Parser, metadata::tables::TableId, Error, Result};

/// Largest value representable as a compressed unsigned integer.
pub const MAX_COMPRESSED_UINT: u32 = 0x1FFF_FFFF;

/// A metadata token: table index in bits 24..31, row id in bits 0..23.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from its raw value.
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Create the token for row `row` of `table`. Row bits beyond 24 are discarded.
    #[must_use]
    pub fn from_parts(table: TableId, row: u32) -> Self {
        Token((u32::from(table as u8) << 24) | (row & 0x00FF_FFFF))
    }

    /// The raw 32-bit value.
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// The table index byte.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The table kind, if the table byte names a known table.
    #[must_use]
    pub fn table_id(&self) -> Option<TableId> {
        TableId::from_repr(self.table())
    }

    /// The row id.
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true for a null reference, i.e. row id 0 in any table.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.row() == 0
    }

    /// Compress this token for embedding in a blob.
    ///
    /// `TypeDef`, `TypeRef` and `TypeSpec` tokens are encoded as `TypeDefOrRefOrSpecEncoded`,
    /// the row id shifted left by two with the table selected by the low bits. Tokens of any
    /// other table compress their row id alone, as their table is implied by the context.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if the resulting value exceeds the 29-bit range.
    pub fn compress(&self) -> Result<CompressedUint> {
        let tag = match self.table_id() {
            Some(TableId::TypeDef) => Some(0),
            Some(TableId::TypeRef) => Some(1),
            Some(TableId::TypeSpec) => Some(2),
            _ => None,
        };

        match tag {
            Some(tag) => compress_uint((self.row() << 2) | tag),
            None => compress_uint(self.row()),
        }
    }

    /// Decode a compressed `TypeDefOrRefOrSpecEncoded` token from the start of `data`.
    /// Returns the token and the number of bytes consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated input, or
    /// [`crate::Error::BadMetadataHeap`] for an invalid encoding or the reserved tag 3.
    pub fn decompress_type(data: &[u8]) -> Result<(Token, usize)> {
        let mut parser = Parser::new(data);
        let token = parser.read_compressed_token()?;
        Ok((token, parser.pos()))
    }

    /// Decode a compressed row id of `table` from the start of `data`.
    /// Returns the token and the number of bytes consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] for truncated input, or
    /// [`crate::Error::BadMetadataHeap`] for an invalid encoding.
    pub fn decompress_row(data: &[u8], table: TableId) -> Result<(Token, usize)> {
        let (row, len) = decompress_uint(data)?;
        Ok((Token::from_parts(table, row), len))
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table_id() {
            Some(table) => write!(f, "Token(0x{:08x}, {table}[{}])", self.0, self.row()),
            None => write!(
                f,
                "Token(0x{:08x}, table: 0x{:02x}, row: {})",
                self.0,
                self.table(),
                self.row()
            ),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// A compressed unsigned integer of 1, 2 or 4 bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct CompressedUint {
    bytes: [u8; 4],
    len: u8,
}

impl CompressedUint {
    /// The encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Number of encoded bytes: 1, 2 or 4.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    /// Always false, an encoding has at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Debug for CompressedUint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompressedUint({:02x?})", self.as_bytes())
    }
}

/// Encode `value` as a compressed unsigned integer (ECMA-335 II.23.2).
///
/// Values below `0x80` take one byte, below `0x4000` two bytes with the prefix `10`, and up
/// to `0x1FFF_FFFF` four bytes with the prefix `110`; multi-byte forms are big-endian.
///
/// # Errors
/// Returns [`crate::Error::Error`] if `value` exceeds [`MAX_COMPRESSED_UINT`].
#[allow(clippy::cast_possible_truncation)]
pub fn compress_uint(value: u32) -> Result<CompressedUint> {
    if value < 0x80 {
        return Ok(CompressedUint {
            bytes: [value as u8, 0, 0, 0],
            len: 1,
        });
    }

    if value < 0x4000 {
        return Ok(CompressedUint {
            bytes: [0x80 | (value >> 8) as u8, value as u8, 0, 0],
            len: 2,
        });
    }

    if value <= MAX_COMPRESSED_UINT {
        return Ok(CompressedUint {
            bytes: (value | 0xC000_0000).to_be_bytes(),
            len: 4,
        });
    }

    Err(Error::Error(format!(
        "Value {value:#x} exceeds the compressed integer range"
    )))
}

/// Decode a compressed unsigned integer from the start of `data`.
/// Returns the value and the number of bytes consumed.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] for truncated input, or
/// [`crate::Error::BadMetadataHeap`] for a lead byte with the `111` prefix.
pub fn decompress_uint(data: &[u8]) -> Result<(u32, usize)> {
    let mut parser = Parser::new(data);
    let value = parser.read_compressed_uint()?;
    Ok((value, parser.pos()))
}

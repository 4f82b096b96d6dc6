//! Cursor-based byte parser for metadata structures.
//!
//! [`Parser`] keeps a position within a borrowed byte slice and offers bounds-checked reads
//! of little-endian primitives and ECMA-335 compressed integers (II.23.2). It is used for the
//! metadata root, stream headers, blob length prefixes and compressed tokens.
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::Parser;
//!
//! let data = [0x01, 0x02, 0x81, 0x00, b'#', b'~', 0x00, 0x00];
//! let mut parser = Parser::new(&data);
//!
//! assert_eq!(parser.read_le::<u16>()?, 0x0201);
//! assert_eq!(parser.read_compressed_uint()?, 0x100);
//! assert_eq!(parser.read_bytes(2)?, b"#~");
//! parser.align(4)?;
//! assert_eq!(parser.remaining(), 0);
//! # Ok::<(), cilmeta::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CilIO},
    metadata::{tables::TableId, token::Token},
    Error::OutOfBounds,
    Result,
};

/// A bounds-checked cursor over a byte slice.
///
/// Every read either succeeds and advances the position, or fails with
/// [`crate::Error::OutOfBounds`] (or a [`crate::Error::BadMetadataHeap`] for malformed
/// encodings) and leaves the data untouched.
pub struct Parser<'a> {
    /// The data to be parsed
    data: &'a [u8],
    /// The current position of the parser
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Move the position forward by `step` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        let end = self.calc_end_position(step)?;
        self.position = end;
        Ok(())
    }

    /// The current position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// The complete underlying data, independent of the position.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Peek at the byte at the current position without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if no data remains.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data.get(self.position).copied().ok_or(OutOfBounds)
    }

    /// Advance to the next multiple of `alignment`, measured from the start of the data.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the padding would exceed the data length.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Read a `T` in little-endian byte order and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_le<T: CilIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Read a compressed unsigned integer as defined in ECMA-335 II.23.2.
    ///
    /// - `0xxxxxxx` - one byte, 7 bits of value
    /// - `10xxxxxx xxxxxxxx` - two bytes, 14 bits, most significant byte first
    /// - `110xxxxx xxxxxxxx xxxxxxxx xxxxxxxx` - four bytes, 29 bits
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length, or
    /// [`crate::Error::BadMetadataHeap`] for a lead byte with the `111` prefix.
    pub fn read_compressed_uint(&mut self) -> Result<u32> {
        let first_byte = self.peek_byte()?;

        if (first_byte & 0x80) == 0 {
            self.position += 1;
            return Ok(u32::from(first_byte));
        }

        if (first_byte & 0xC0) == 0x80 {
            let bytes = self.read_bytes(2)?;
            return Ok((u32::from(bytes[0] & 0x3F) << 8) | u32::from(bytes[1]));
        }

        if (first_byte & 0xE0) == 0xC0 {
            let bytes = self.read_bytes(4)?;
            return Ok((u32::from(bytes[0] & 0x1F) << 24)
                | (u32::from(bytes[1]) << 16)
                | (u32::from(bytes[2]) << 8)
                | u32::from(bytes[3]));
        }

        Err(bad_heap!("Invalid compressed uint - {:#04x}", first_byte))
    }

    /// Read a compressed `TypeDefOrRefOrSpecEncoded` token (ECMA-335 II.23.2.8).
    ///
    /// The low two bits select TypeDef, TypeRef or TypeSpec, the remaining bits are the row.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length, or
    /// [`crate::Error::BadMetadataHeap`] for the reserved tag value 3.
    pub fn read_compressed_token(&mut self) -> Result<Token> {
        let compressed_token = self.read_compressed_uint()?;

        let table = match compressed_token & 0x3 {
            0x0 => TableId::TypeDef,
            0x1 => TableId::TypeRef,
            0x2 => TableId::TypeSpec,
            _ => {
                return Err(bad_heap!(
                    "Invalid compressed token - {:#x}",
                    compressed_token
                ))
            }
        };

        Ok(Token::from_parts(table, compressed_token >> 2))
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Compute the position `length` bytes ahead, checking bounds and overflow.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the end position exceeds the data length.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let Some(end) = self.position.checked_add(length) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(end)
    }

    /// Read `length` raw bytes and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading would exceed the data length.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.peek_byte().unwrap(), 0x01);
        assert_eq!(parser.read_le::<u32>().unwrap(), 0x0403_0201);
        assert_eq!(parser.pos(), 4);
        assert_eq!(parser.remaining(), 1);
        assert!(parser.read_le::<u16>().is_err());
        assert_eq!(parser.pos(), 4);
        assert_eq!(parser.read_le::<u8>().unwrap(), 0x05);
        assert_eq!(parser.remaining(), 0);
        assert!(parser.peek_byte().is_err());
    }

    #[test]
    fn compressed_uint() {
        #[rustfmt::skip]
        let data = [
            0x03,
            0x7F,
            0x80, 0x80,
            0xAE, 0x57,
            0xBF, 0xFF,
            0xC0, 0x00, 0x40, 0x00,
            0xDF, 0xFF, 0xFF, 0xFF,
        ];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_compressed_uint().unwrap(), 0x03);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x7F);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x80);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x2E57);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x3FFF);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x4000);
        assert_eq!(parser.read_compressed_uint().unwrap(), 0x1FFF_FFFF);
    }

    #[test]
    fn compressed_uint_invalid() {
        let mut parser = Parser::new(&[0xE0, 0x00, 0x00, 0x00]);
        assert!(matches!(
            parser.read_compressed_uint(),
            Err(Error::BadMetadataHeap { .. })
        ));

        let mut truncated = Parser::new(&[0xC0, 0x00]);
        assert!(matches!(truncated.read_compressed_uint(), Err(OutOfBounds)));
        assert_eq!(truncated.pos(), 0);
    }

    #[test]
    fn compressed_token() {
        let data = [0x49, 0x06, 0x0B];
        let mut parser = Parser::new(&data);

        let token = parser.read_compressed_token().unwrap();
        assert_eq!(token.value(), 0x0100_0012);

        let token = parser.read_compressed_token().unwrap();
        assert_eq!(token.value(), 0x1B00_0001);

        assert!(parser.read_compressed_token().is_err());
    }

    #[test]
    fn alignment_to_end() {
        let data = [0u8; 8];
        let mut parser = Parser::new(&data);

        parser.advance_by(7).unwrap();
        assert!(parser.advance_by(2).is_err());
        assert_eq!(parser.pos(), 7);

        // One byte of padding ends exactly at the end of the data
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 8);
        parser.align(8).unwrap();
        assert_eq!(parser.pos(), 8);
        assert!(parser.read_bytes(1).is_err());
    }

    #[test]
    fn alignment_past_end() {
        let data = [0u8; 6];
        let mut parser = Parser::new(&data);

        parser.advance_by(5).unwrap();
        assert!(matches!(parser.align(4), Err(OutOfBounds)));
        assert_eq!(parser.pos(), 5);
    }

    #[test]
    fn read_bytes_bounds() {
        let data = [0x0A, 0x0B, 0x0C];
        let mut parser = Parser::new(&data);

        assert!(parser.read_bytes(usize::MAX).is_err());
        assert_eq!(parser.read_bytes(2).unwrap(), &[0x0A, 0x0B]);
        assert!(parser.read_bytes(2).is_err());
        assert_eq!(parser.read_bytes(1).unwrap(), &[0x0C]);
        assert_eq!(parser.data(), &data);
    }
}

//! Decoding of CIL method bodies.
//!
//! A method body starts with a tiny or a fat header, selected by the two low bits of its
//! first byte. The code follows the header. Fat bodies may be followed by data sections
//! holding exception handling clauses, each aligned to 4 bytes.
//!
//! ```text
//! Tiny:  [size_code << 2 | 0b10] [code ...]
//!
//! Fat:   u16 flags (low 12 bits) | header size in words (high 4 bits)
//!        u16 max_stack
//!        u32 size_code
//!        u32 local_var_sig_token
//!        ... reserved header words
//!        [code ...]
//!        [aligned data sections ...]
//! ```
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::method::{MethodBody, MethodBodyFormat};
//!
//! // Tiny header declaring 2 code bytes: nop, ret
//! let body = MethodBody::from(&[0x0A, 0x00, 0x2A])?;
//! assert_eq!(body.format, MethodBodyFormat::Tiny);
//! assert_eq!(body.size_code, 2);
//! assert_eq!(body.max_stack, 8);
//! assert_eq!(body.code, vec![0x00, 0x2A]);
//! # Ok::<(), cilmeta::Error>(())
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Common Intermediate Language physical layout

use crate::{
    file::io::{read_le, read_le_at},
    metadata::{
        method::{
            ExceptionHandler, ExceptionHandlerFlags, MethodBodyFlags, MethodBodyFormat,
            SectionFlags, FAT_FLAGS_MASK, FAT_HEADER_MIN_WORDS, TINY_MAX_STACK,
        },
        token::Token,
    },
    Error, Result,
};

/// Size of a data section header
const SECTION_HEADER_SIZE: usize = 4;
/// Size of a clause in a small data section
const SMALL_CLAUSE_SIZE: usize = 12;
/// Size of a clause in a fat data section
const FAT_CLAUSE_SIZE: usize = 24;

/// Describes one method that has been compiled to CIL bytecode.
///
/// The code is copied out of the image, the body does not borrow from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    /// Header encoding
    pub format: MethodBodyFormat,
    /// Raw header flags; `TINY_FORMAT` for tiny bodies
    pub flags: MethodBodyFlags,
    /// Size of the method header in bytes, reserved header words included
    pub size_header: usize,
    /// Size of the method (length of all instructions, not counting the header) in bytes
    pub size_code: usize,
    /// Maximum number of items on the operand stack, 8 for tiny bodies
    pub max_stack: usize,
    /// Flag, indicating to call default constructor on all local variables
    pub init_locals: bool,
    /// `StandAloneSig` token describing the local variables; 0 if there are none
    pub local_var_sig_token: u32,
    /// The CIL code
    pub code: Vec<u8>,
    /// Exception handling clauses from the data sections
    pub exception_handlers: Vec<ExceptionHandler>,
}

impl MethodBody {
    /// Create a `MethodBody` from a sequence of bytes starting at the method header.
    ///
    /// Data sections that cannot be decoded are logged and skipped; the body itself is still
    /// returned.
    ///
    /// # Arguments
    /// * `data` - The byte slice from which this object shall be created
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedMethodBody`] if `data` ends before the header or the
    /// code, or [`crate::Error::MalformedMethodBody`] if the format bits select neither
    /// encoding or a fat header is shorter than 3 words.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        let Some(first_byte) = data.first().copied() else {
            return Err(Error::TruncatedMethodBody {
                needed: 1,
                available: 0,
            });
        };

        match MethodBodyFormat::from_first_byte(first_byte) {
            Some(MethodBodyFormat::Tiny) => {
                let size_code = usize::from(first_byte >> 2);
                let code = code_slice(data, 1, size_code)?;

                Ok(MethodBody {
                    format: MethodBodyFormat::Tiny,
                    flags: MethodBodyFlags::TINY_FORMAT,
                    size_header: 1,
                    size_code,
                    max_stack: TINY_MAX_STACK,
                    init_locals: false,
                    local_var_sig_token: 0,
                    code: code.to_vec(),
                    exception_handlers: Vec::new(),
                })
            }
            Some(MethodBodyFormat::Fat) => Self::read_fat(data),
            None => Err(not_a_header(first_byte)),
        }
    }

    fn read_fat(data: &[u8]) -> Result<MethodBody> {
        let fixed = FAT_HEADER_MIN_WORDS * 4;
        if data.len() < fixed {
            return Err(Error::TruncatedMethodBody {
                needed: fixed,
                available: data.len(),
            });
        }

        let first_duo = read_le::<u16>(data)?;
        let size_header = fat_header_size(first_duo)?;
        let flags = MethodBodyFlags::from_bits_retain(first_duo & FAT_FLAGS_MASK);
        let max_stack = usize::from(read_le_at::<u16>(data, &mut 2)?);
        let size_code = read_le_at::<u32>(data, &mut 4)? as usize;
        let local_var_sig_token = read_le_at::<u32>(data, &mut 8)?;

        let code = code_slice(data, size_header, size_code)?;

        // Exception Handling -> II.25.4.6
        let exception_handlers = if flags.contains(MethodBodyFlags::MORE_SECTS) {
            read_sections(data, size_header + size_code)
        } else {
            Vec::new()
        };

        Ok(MethodBody {
            format: MethodBodyFormat::Fat,
            flags,
            size_header,
            size_code,
            max_stack,
            init_locals: flags.contains(MethodBodyFlags::INIT_LOCALS),
            local_var_sig_token,
            code: code.to_vec(),
            exception_handlers,
        })
    }

    /// Measure a method body, header through last data section, reading only what is needed.
    ///
    /// `read(len)` must return the first `len` bytes of the body. It is called with growing
    /// lengths: the first header byte, the fixed fat header, then each section header. A data
    /// section header that cannot be read ends the measurement at the preceding section.
    ///
    /// # Errors
    /// Returns the error of `read` for the header, or [`crate::Error::MalformedMethodBody`]
    /// for an invalid header.
    pub fn extent<'a, F>(read: F) -> Result<usize>
    where
        F: Fn(usize) -> Result<&'a [u8]>,
    {
        let first_byte = read_le::<u8>(read(1)?)?;
        match MethodBodyFormat::from_first_byte(first_byte) {
            Some(MethodBodyFormat::Tiny) => Ok(1 + usize::from(first_byte >> 2)),
            Some(MethodBodyFormat::Fat) => {
                let header = read(FAT_HEADER_MIN_WORDS * 4)?;
                let first_duo = read_le::<u16>(header)?;
                let size_header = fat_header_size(first_duo)?;
                let size_code = read_le_at::<u32>(header, &mut 4)? as usize;

                let mut end = size_header.saturating_add(size_code);
                if first_duo & MethodBodyFlags::MORE_SECTS.bits() == 0 {
                    return Ok(end);
                }

                loop {
                    let start = align4(end);
                    let Ok(prefix) = read(start + SECTION_HEADER_SIZE) else {
                        break;
                    };

                    let (kind, size) = section_header(&prefix[start..]);
                    if size < SECTION_HEADER_SIZE {
                        break;
                    }

                    end = start + size;
                    if !kind.contains(SectionFlags::MORE_SECTS) {
                        break;
                    }
                }

                Ok(end)
            }
            None => Err(not_a_header(first_byte)),
        }
    }

    /// Get the full size of this method, header and code
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// The local variable signature token, if the method has locals.
    #[must_use]
    pub fn local_var_sig(&self) -> Option<Token> {
        (self.local_var_sig_token != 0).then_some(Token::new(self.local_var_sig_token))
    }
}

fn not_a_header(first_byte: u8) -> Error {
    Error::MalformedMethodBody(format!(
        "Method header is neither fat nor tiny - {first_byte:#04x}"
    ))
}

fn fat_header_size(first_duo: u16) -> Result<usize> {
    let words = usize::from(first_duo >> 12);
    if words < FAT_HEADER_MIN_WORDS {
        return Err(Error::MalformedMethodBody(format!(
            "Fat method header declares {words} words, at least {FAT_HEADER_MIN_WORDS} are required"
        )));
    }

    Ok(words * 4)
}

fn code_slice(data: &[u8], start: usize, size_code: usize) -> Result<&[u8]> {
    let end = start.saturating_add(size_code);
    data.get(start..end).ok_or(Error::TruncatedMethodBody {
        needed: end,
        available: data.len(),
    })
}

fn align4(position: usize) -> usize {
    position.saturating_add(3) & !3
}

/// Kind and total size of the data section starting at `data[0]`; `data` holds at least the
/// 4-byte section header.
fn section_header(data: &[u8]) -> (SectionFlags, usize) {
    let kind = SectionFlags::from_bits_truncate(data[0]);
    let size = if kind.contains(SectionFlags::FAT_FORMAT) {
        usize::from(data[1]) | usize::from(data[2]) << 8 | usize::from(data[3]) << 16
    } else {
        usize::from(data[1])
    };

    (kind, size)
}

fn read_sections(data: &[u8], code_end: usize) -> Vec<ExceptionHandler> {
    let mut exception_handlers = Vec::new();
    let mut cursor = align4(code_end);

    loop {
        let Some(header) = data.get(cursor..cursor + SECTION_HEADER_SIZE) else {
            log::warn!("method data section at {cursor:#x} is truncated");
            break;
        };

        let (kind, size) = section_header(header);
        if size < SECTION_HEADER_SIZE || cursor + size > data.len() {
            log::warn!(
                "method data section at {cursor:#x} has invalid size {size} ({} bytes left)",
                data.len() - cursor
            );
            break;
        }

        if kind.contains(SectionFlags::EHTABLE) {
            let fat = kind.contains(SectionFlags::FAT_FORMAT);
            let clause_size = if fat { FAT_CLAUSE_SIZE } else { SMALL_CLAUSE_SIZE };
            let mut clause_cursor = cursor + SECTION_HEADER_SIZE;
            for _ in 0..(size - SECTION_HEADER_SIZE) / clause_size {
                match read_clause(data, &mut clause_cursor, fat) {
                    Ok(handler) => exception_handlers.push(handler),
                    Err(error) => {
                        log::warn!("exception clause at {clause_cursor:#x}: {error}");
                        return exception_handlers;
                    }
                }
            }
        } else {
            log::debug!("skipping method data section {kind:?} at {cursor:#x}");
        }

        if !kind.contains(SectionFlags::MORE_SECTS) {
            break;
        }

        cursor = align4(cursor + size);
    }

    exception_handlers
}

#[allow(clippy::cast_possible_truncation)]
fn read_clause(data: &[u8], cursor: &mut usize, fat: bool) -> Result<ExceptionHandler> {
    if fat {
        Ok(ExceptionHandler {
            // Clause flags are a 32-bit field of which only the low bits are defined
            flags: ExceptionHandlerFlags::from_bits_truncate(read_le_at::<u32>(data, cursor)? as u16),
            try_offset: read_le_at::<u32>(data, cursor)?,
            try_length: read_le_at::<u32>(data, cursor)?,
            handler_offset: read_le_at::<u32>(data, cursor)?,
            handler_length: read_le_at::<u32>(data, cursor)?,
            class_token_or_filter: read_le_at::<u32>(data, cursor)?,
        })
    } else {
        Ok(ExceptionHandler {
            flags: ExceptionHandlerFlags::from_bits_truncate(read_le_at::<u16>(data, cursor)?),
            try_offset: u32::from(read_le_at::<u16>(data, cursor)?),
            try_length: u32::from(read_le_at::<u8>(data, cursor)?),
            handler_offset: u32::from(read_le_at::<u16>(data, cursor)?),
            handler_length: u32::from(read_le_at::<u8>(data, cursor)?),
            class_token_or_filter: read_le_at::<u32>(data, cursor)?,
        })
    }
}

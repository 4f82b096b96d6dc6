//! Method header formats and flag sets (ECMA-335 II.25.4).

use bitflags::bitflags;

/// Mask of the format bits in the first header byte
pub const METHOD_FORMAT_MASK: u8 = 0b11;
/// Mask of the flag bits in the first word of a fat header
pub const FAT_FLAGS_MASK: u16 = 0x0FFF;
/// Implicit `max_stack` of a tiny method
pub const TINY_MAX_STACK: usize = 8;
/// Size in 4-byte words of the fixed fields of a fat header
pub const FAT_HEADER_MIN_WORDS: usize = 3;

/// The two encodings of a method header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodBodyFormat {
    /// One header byte holding the code size; no locals, no extra sections
    Tiny,
    /// Twelve or more header bytes with flags, `max_stack`, code size and locals token
    Fat,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Flags that a method body can have
    ///
    /// Bits not named here are kept as read. `FAT_FORMAT` includes the `TINY_FORMAT` bit, so
    /// `contains(TINY_FORMAT)` holds for fat bodies too; use [`MethodBodyFormat`] for the format.
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Flag of the fat method header, showing that there are more data sections appended to the body
        const MORE_SECTS = 0x8;
        /// Flag to indicate that this method should call the default constructor on all local variables
        const INIT_LOCALS = 0x10;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    /// Flags that a method body section can have
    pub struct SectionFlags: u8 {
        /// Indicates that this section contains exception handling data
        const EHTABLE = 0x1;
        /// Reserved, shall be 0
        const OPT_ILTABLE = 0x2;
        /// Indicates that the data section format is fat
        const FAT_FORMAT = 0x40;
        /// Indicates that the data section is followed by another one
        const MORE_SECTS = 0x80;
    }
}

impl MethodBodyFormat {
    /// Select the format from the low two bits of the first header byte.
    #[must_use]
    pub fn from_first_byte(byte: u8) -> Option<MethodBodyFormat> {
        match byte & METHOD_FORMAT_MASK {
            0b10 => Some(MethodBodyFormat::Tiny),
            0b11 => Some(MethodBodyFormat::Fat),
            _ => None,
        }
    }
}

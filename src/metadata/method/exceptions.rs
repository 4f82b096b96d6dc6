//! Exception handling clauses of method data sections (ECMA-335 II.25.4.6).

use bitflags::bitflags;

use crate::metadata::token::Token;

bitflags! {
    /// Exception handler flags defining the type of exception handling clause.
    ///
    /// A typed catch clause has no bit set; test for it with [`ExceptionHandler::is_catch`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExceptionHandlerFlags: u16 {
        /// A typed exception clause
        const EXCEPTION = 0x0000;
        /// An exception filter and handler clause
        const FILTER = 0x0001;
        /// A finally clause
        const FINALLY = 0x0002;
        /// A fault clause, a finally that runs only on exception
        const FAULT = 0x0004;
    }
}

/// One protected region and its handler.
///
/// Offsets are relative to the first byte of the method's code. The small clause layout
/// stores offsets in 16 bits and lengths in 8 bits; both layouts are widened here.
///
/// ```text
/// try {
///     // try_offset .. try_offset + try_length
/// }
/// catch (ExceptionType) {
///     // handler_offset .. handler_offset + handler_length
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// Kind of clause
    pub flags: ExceptionHandlerFlags,
    /// Start of the try block
    pub try_offset: u32,
    /// Length of the try block in bytes
    pub try_length: u32,
    /// Start of the handler
    pub handler_offset: u32,
    /// Length of the handler in bytes
    pub handler_length: u32,
    /// Type token of a catch clause, or the filter offset of a filter clause
    pub class_token_or_filter: u32,
}

impl ExceptionHandler {
    /// Returns true for a typed catch clause.
    #[must_use]
    pub fn is_catch(&self) -> bool {
        self.flags.is_empty()
    }

    /// The caught exception type of a typed catch clause.
    #[must_use]
    pub fn class_token(&self) -> Option<Token> {
        self.is_catch()
            .then_some(Token::new(self.class_token_or_filter))
    }

    /// Start of the filter code of a filter clause.
    #[must_use]
    pub fn filter_offset(&self) -> Option<u32> {
        self.flags
            .contains(ExceptionHandlerFlags::FILTER)
            .then_some(self.class_token_or_filter)
    }
}

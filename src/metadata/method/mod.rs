//! Method bodies: header formats, CIL code and exception handling clauses.
//!
//! The entry point is [`MethodBody::from`], which decodes a body from the bytes at its
//! header. [`crate::MetadataRoot::method_body`] locates those bytes through the `RVA` column
//! of the `MethodDef` table.

mod body;
mod exceptions;
mod types;

pub use body::MethodBody;
pub use exceptions::{ExceptionHandler, ExceptionHandlerFlags};
pub use types::*;

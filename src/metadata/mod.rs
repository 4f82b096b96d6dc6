//! Metadata parsing for CLI images.
//!
//! This module turns the metadata blob of a managed executable into typed, navigable data
//! according to ECMA-335 Partition II.
//!
//! # Key Components
//!
//! - [`root`] - The metadata root header and stream directory, entry point of decoding
//! - [`streams`] - Stream headers and the heaps decoded from them
//! - [`tables`] - Table kinds, column schemas, width resolution and decoded rows
//! - [`token`] - Metadata tokens and the compressed integer encoding
//! - [`method`] - Method headers, CIL code and exception handling clauses
//! - [`config`] - How strictly damaged input is treated
//!
//! # Examples
//!
//! ```rust,no_run
//! use cilmeta::{metadata::tables::TableId, MetadataRoot};
//!
//! let blob = std::fs::read("metadata.bin")?;
//! let root = MetadataRoot::read(&blob)?;
//!
//! let tables = root.tables()?;
//! println!("Types: {}", tables.row_count(TableId::TypeDef));
//! println!("Methods: {}", tables.row_count(TableId::MethodDef));
//! println!("{}", root.dump_row(TableId::Module, 1)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Loader configuration
pub mod config;
/// Implementation of the method body of CIL
pub mod method;
/// Implementation of the root metadata structure
pub mod root;
/// Implementation of all metadata streams (tables, heaps, etc.)
pub mod streams;
/// Implementation of the metadata tables
pub mod tables;
/// Commonly used metadata token type
pub mod token;

// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # cilmeta
//!
//! A decoder for the ECMA-335 CLI metadata format embedded in managed executable images.
//!
//! `cilmeta` turns a raw metadata blob (already located inside a PE/COFF image by the caller)
//! into typed, navigable rows: it reads the metadata root and its stream directory, builds the
//! `#Strings`, `#GUID`, `#Blob` and `#US` heaps, and decodes every table of the `#~` stream,
//! resolving variable-width columns and coded (tagged-union) cross-table references.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cilmeta::prelude::*;
//!
//! let blob: Vec<u8> = std::fs::read("metadata.bin")?;
//! let root = MetadataRoot::read(&blob)?;
//! println!("Runtime version: {}", root.version);
//!
//! let tables = root.tables()?;
//! if let Some(types) = tables.table(TableId::TypeDef) {
//!     let strings = root.strings()?;
//!     for row in types.iter() {
//!         let name = strings.lookup(row.get_by_name("TypeName")? as usize)?;
//!         println!("{:08x} {}", row.token().value(), name);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Method bodies
//!
//! Method bodies live outside of the metadata blob. They are reached through an
//! [`ImageProvider`] which maps RVAs to file offsets and hands out byte ranges:
//!
//! ```rust,no_run
//! use cilmeta::prelude::*;
//!
//! # fn run(root: &MetadataRoot, image: &Memory) -> cilmeta::Result<()> {
//! if let Some(body) = root.method_body(1, image)? {
//!     println!("{} bytes of IL, max stack {}", body.size_code, body.max_stack);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Bounds-checked byte access, the cursor parser, and image providers
//! - [`metadata`] - Root, streams, heaps, tables, tokens and method bodies
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Standards Compliance
//!
//! The table schemas, coded index unions and heap formats follow the **ECMA-335 specification**
//! (6th edition), Partition II, sections 22-25.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// Byte access: endian-aware reads, the cursor [`Parser`], and image providers.
///
/// The decoder itself never locates metadata inside a PE image. Callers hand it a metadata
/// blob, and, for method bodies, an [`ImageProvider`] which resolves RVAs and serves raw bytes.
///
/// # Key Types
///
/// - [`file::Parser`] - Cursor over a byte slice with compressed integer support
/// - [`file::ImageProvider`] - The collaborator interface used for method bodies
/// - [`file::Memory`] / [`file::Physical`] - Owned-buffer and memory-mapped providers
/// - [`file::SectionMap`] - RVA to file offset translation
pub mod file;

/// Decoding of CLI metadata based on ECMA-335.
///
/// # Key Components
///
/// - [`metadata::root`] - The metadata root and its stream directory
/// - [`metadata::streams`] - Streams and the `#Strings`, `#GUID`, `#Blob` and `#~` heaps
/// - [`metadata::tables`] - Table kinds, column schemas, coded indices and row storage
/// - [`metadata::token`] - Metadata tokens and their compressed encoding
/// - [`metadata::method`] - Tiny and Fat method body decoding
pub mod metadata;

/// `cilmeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `cilmeta` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Main entry point for decoding metadata.
///
/// See [`metadata::root::MetadataRoot`].
pub use metadata::root::MetadataRoot;

/// Loader configuration.
pub use metadata::config::LoaderConfig;

/// Cursor-based byte parser.
pub use file::parser::Parser;

/// Image access used to resolve method bodies.
pub use file::{ImageProvider, Memory, Physical, Section, SectionMap};

//! Convenient re-exports of the most commonly used types and traits.
//!
//! ```rust,no_run
//! use cilmeta::prelude::*;
//!
//! let root = MetadataRoot::read(&std::fs::read("metadata.bin")?)?;
//! let tables = root.tables()?;
//! println!("{} tables present", tables.table_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use crate::{
    file::{ImageProvider, Memory, Physical, Section, SectionMap},
    metadata::{
        config::LoaderConfig,
        method::{
            ExceptionHandler, ExceptionHandlerFlags, MethodBody, MethodBodyFlags, MethodBodyFormat,
        },
        root::MetadataRoot,
        streams::{
            BlobHeap, GuidHeap, Heap, Stream, StreamHeader, StreamKind, StringsHeap, TablesHeap,
        },
        tables::{
            CodedIndex, CodedIndexType, ColumnKind, HeapSizes, Row, RowStore, TableId, TableInfo,
            TableSet,
        },
        token::{compress_uint, decompress_uint, CompressedUint, Token},
    },
    Error, Parser, Result,
};

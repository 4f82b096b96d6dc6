//! Metadata tables of the `#~` stream.
//!
//! Every table kind is described by a static [`TableSchema`]; rows of all kinds are decoded by
//! the same routine into a [`RowStore`]. Column widths are not known up front: they are
//! resolved by [`TableInfo`] from the row counts of all tables and the heap-size flags.
//!
//! # Key Components
//!
//! - [`TableId`] - The table kinds, in the order of the `valid` bit-vector
//! - [`TableSet`] - A set of table kinds, backing the `valid` and `sorted` vectors
//! - [`width`] - Width arithmetic for heap, table and coded indices
//! - [`TableInfo`] - Row counts and the resolved width of every index kind
//! - [`CodedIndex`] / [`CodedIndexType`] - Tagged references to one of several tables
//! - [`schema`] - Column layout of each table kind
//! - [`RowStore`] / [`Row`] - Decoded rows of one table
//!
//! # Examples
//!
//! ```rust
//! use cilmeta::metadata::tables::{schema, HeapSizes, TableId, TableInfo};
//!
//! let info = TableInfo::from_counts(&[(TableId::TypeDef, 10)], HeapSizes::WIDE_STRINGS);
//! let row_size: u32 = schema(TableId::TypeDef)
//!     .columns
//!     .iter()
//!     .map(|column| u32::from(info.column_bytes(column.kind)))
//!     .sum();
//! assert_eq!(row_size, 18);
//! ```

mod codedindex;
mod dump;
mod rowstore;
mod schema;
mod tableid;
mod tableinfo;
mod tableset;
pub mod width;

pub use codedindex::{CodedIndex, CodedIndexType};
pub(crate) use dump::{dump_row, DumpHeaps};
pub use rowstore::{Row, RowStore};
pub use schema::{schema, Column, ColumnKind, TableSchema};
pub use tableid::{TableId, TABLE_COUNT};
pub(crate) use tableinfo::present_counts;
pub use tableinfo::{HeapSizes, TableInfo};
pub use tableset::TableSet;

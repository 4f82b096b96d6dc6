//! The tables heap (`#~` or `#-` stream).
//!
//! Layout (ECMA-335 II.24.2.6):
//!
//! | Offset | Size | Field                                    |
//! |--------|------|------------------------------------------|
//! | 0      | 4    | Reserved, 0                              |
//! | 4      | 1    | MajorVersion                             |
//! | 5      | 1    | MinorVersion                             |
//! | 6      | 1    | HeapSizes                                |
//! | 7      | 1    | Reserved, 1                              |
//! | 8      | 8    | Valid, bit-vector of present tables      |
//! | 16     | 8    | Sorted, bit-vector of sorted tables      |
//! | 24     | 4*n  | Row counts, one per set bit of Valid     |
//! | ...    | ...  | Rows of every present table, ascending   |
//!
//! Decoding runs in two passes. All row counts are read first, because the width of a column
//! in one table may depend on the row count of any other table, including later ones. Only
//! then are the rows decoded, with a single cursor running through the whole stream.

use std::collections::BTreeMap;

use crate::{
    file::io::read_le_at,
    metadata::tables::{
        present_counts, HeapSizes, RowStore, TableId, TableInfo, TableSet, TABLE_COUNT,
    },
    Error, Result,
};

/// Size of the fixed header preceding the row counts.
pub const TABLES_HEADER_SIZE: usize = 24;

/// The decoded tables heap.
///
/// ```rust,no_run
/// use cilmeta::metadata::{streams::TablesHeap, tables::TableId};
///
/// # fn run(stream: &[u8]) -> cilmeta::Result<()> {
/// let tables = TablesHeap::read(stream)?;
/// println!("{} TypeDef rows", tables.row_count(TableId::TypeDef));
/// for store in tables.tables() {
///     println!("{}: {} rows of {} bytes", store.id(), store.len(), store.row_size());
/// }
/// # Ok(())
/// # }
/// ```
pub struct TablesHeap {
    /// Major version of the table schema, 2 for current images
    pub major_version: u8,
    /// Minor version of the table schema
    pub minor_version: u8,
    /// Width flags of heap indices
    pub heap_sizes: HeapSizes,
    /// Tables present in the stream
    pub valid: TableSet,
    /// Tables sorted by their key column
    pub sorted: TableSet,
    info: TableInfo,
    tables: BTreeMap<TableId, RowStore>,
    decode_error: Option<Error>,
}

impl TablesHeap {
    /// Decode a tables heap, failing on any truncated table.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedMetadata`] if the header, row counts or any table run
    /// past the end of `data`, or [`crate::Error::BadMetadataHeap`] if `valid` names a table
    /// kind that does not exist.
    pub fn read(data: &[u8]) -> Result<TablesHeap> {
        Self::read_with(data, false)
    }

    /// Decode a tables heap, keeping every table decoded before the first truncated one.
    ///
    /// The failure is available from [`TablesHeap::decode_error`].
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedMetadata`] if the header or the row counts are
    /// truncated, or [`crate::Error::BadMetadataHeap`] for unknown tables in `valid`.
    pub fn read_lenient(data: &[u8]) -> Result<TablesHeap> {
        Self::read_with(data, true)
    }

    fn read_with(data: &[u8], lenient: bool) -> Result<TablesHeap> {
        if data.len() < TABLES_HEADER_SIZE {
            return Err(Error::TruncatedMetadata {
                table: None,
                offset: 0,
                needed: TABLES_HEADER_SIZE,
                available: data.len(),
            });
        }

        let major_version = data[4];
        let minor_version = data[5];
        let heap_sizes = HeapSizes::from_bits_retain(data[6]);
        let valid = TableSet::from_bits(read_le_at::<u64>(data, &mut 8)?);
        let sorted = TableSet::from_bits(read_le_at::<u64>(data, &mut 16)?);

        if valid.unknown_bits() != 0 {
            return Err(bad_heap!(
                "Tables heap declares unknown tables - valid {:#018x}",
                valid.bits()
            ));
        }

        let mut cursor = TABLES_HEADER_SIZE;
        let mut rows = [0_u32; TABLE_COUNT];
        for table in valid.iter() {
            let offset = cursor;
            rows[table as usize] =
                read_le_at::<u32>(data, &mut cursor).map_err(|_| Error::TruncatedMetadata {
                    table: None,
                    offset,
                    needed: 4,
                    available: data.len() - offset,
                })?;
        }

        let info = TableInfo::new(rows, heap_sizes);

        log::debug!(
            "tables heap v{major_version}.{minor_version}, heap sizes {heap_sizes:?}, {} tables",
            valid.len()
        );

        let mut tables = BTreeMap::new();
        let mut decode_error = None;
        for table in valid.iter() {
            let count = rows[table as usize];
            match RowStore::decode(table, data, &mut cursor, count, &info) {
                Ok(store) => {
                    log::debug!(
                        "{table}: {count} rows of {} bytes",
                        store.row_size()
                    );
                    tables.insert(table, store);
                }
                Err(error) if lenient => {
                    log::warn!("stopped decoding tables at {table}: {error}");
                    decode_error = Some(error);
                    break;
                }
                Err(error) => return Err(error),
            }
        }

        Ok(TablesHeap {
            major_version,
            minor_version,
            heap_sizes,
            valid,
            sorted,
            info,
            tables,
            decode_error,
        })
    }

    /// Declared row count of `table`; 0 for absent tables.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.info.rows(table)
    }

    /// The decoded rows of `table`, if it is present and was decoded.
    #[must_use]
    pub fn table(&self, table: TableId) -> Option<&RowStore> {
        self.tables.get(&table)
    }

    /// All decoded tables in ascending table index order.
    pub fn tables(&self) -> impl Iterator<Item = &RowStore> {
        self.tables.values()
    }

    /// Number of decoded tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if the `sorted` vector marks `table` as sorted.
    #[must_use]
    pub fn is_sorted(&self, table: TableId) -> bool {
        self.sorted.contains(table)
    }

    /// Row counts and resolved column widths.
    #[must_use]
    pub fn info(&self) -> &TableInfo {
        &self.info
    }

    /// The failure that stopped a lenient decode, if any.
    #[must_use]
    pub fn decode_error(&self) -> Option<&Error> {
        self.decode_error.as_ref()
    }
}

impl std::fmt::Debug for TablesHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rows: BTreeMap<TableId, u32> = present_counts(&self.info).collect();
        f.debug_struct("TablesHeap")
            .field("version", &(self.major_version, self.minor_version))
            .field("heap_sizes", &self.heap_sizes)
            .field("sorted", &self.sorted)
            .field("rows", &rows)
            .field("decode_error", &self.decode_error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TablesBuilder;

    #[test]
    fn header_fields() {
        let data = TablesBuilder::new()
            .heap_sizes(0x05)
            .sorted(0x0000_1600_3301_FA00)
            .table(TableId::Module, 1)
            .build();
        let heap = TablesHeap::read(&data).unwrap();

        assert_eq!(heap.major_version, 2);
        assert_eq!(heap.minor_version, 0);
        assert_eq!(heap.heap_sizes, HeapSizes::WIDE_STRINGS | HeapSizes::WIDE_BLOB);
        assert_eq!(heap.valid.bits(), 1);
        assert!(heap.is_sorted(TableId::Constant));
        assert!(!heap.is_sorted(TableId::Module));
        assert_eq!(heap.table_count(), 1);
        // Module with wide strings: 2 + 4 + 2 * 3
        assert_eq!(heap.table(TableId::Module).unwrap().row_size(), 12);
        assert!(heap.decode_error().is_none());
        assert!(format!("{heap:?}").contains("rows: {Module: 1}"));
    }

    #[test]
    fn row_counts_follow_valid_bits() {
        let data = TablesBuilder::new()
            .table(TableId::TypeDef, 3)
            .table(TableId::MethodDef, 5)
            .table(TableId::AssemblyRef, 7)
            .build();

        // Header + 3 counts + rows: TypeDef 14, MethodDef 14, AssemblyRef 20
        assert_eq!(data.len(), 24 + 12 + 3 * 14 + 5 * 14 + 7 * 20);
        assert_eq!(&data[24..36], &[3, 0, 0, 0, 5, 0, 0, 0, 7, 0, 0, 0]);

        let heap = TablesHeap::read(&data).unwrap();
        assert_eq!(heap.valid.bits(), (1 << 2) | (1 << 6) | (1 << 35));
        assert_eq!(heap.row_count(TableId::TypeDef), 3);
        assert_eq!(heap.row_count(TableId::MethodDef), 5);
        assert_eq!(heap.row_count(TableId::AssemblyRef), 7);
        assert_eq!(heap.row_count(TableId::Field), 0);
        assert_eq!(heap.row_count(TableId::Module), 0);
        assert!(heap.table(TableId::Field).is_none());

        let ids: Vec<_> = heap.tables().map(RowStore::id).collect();
        assert_eq!(ids, vec![TableId::TypeDef, TableId::MethodDef, TableId::AssemblyRef]);
        assert_eq!(heap.table(TableId::TypeDef).unwrap().row_size(), 14);
        assert_eq!(heap.table(TableId::MethodDef).unwrap().row_size(), 14);
        assert_eq!(heap.table(TableId::AssemblyRef).unwrap().row_size(), 20);
    }

    #[test]
    fn rows_are_decoded_in_order() {
        #[rustfmt::skip]
        let data = TablesBuilder::new()
            .table(TableId::TypeRef, 2)
            .rows(&[
                // ResolutionScope, TypeName, TypeNamespace
                0x06, 0x00,  0x10, 0x00,  0x20, 0x00,
                0x0A, 0x00,  0x30, 0x00,  0x20, 0x00,
            ])
            .build();
        let heap = TablesHeap::read(&data).unwrap();
        let type_refs = heap.table(TableId::TypeRef).unwrap();

        let second = type_refs.row(2).unwrap();
        assert_eq!(second.values(), &[0x0A, 0x30, 0x20]);
        assert_eq!(
            second.table_ref("ResolutionScope").unwrap(),
            (TableId::AssemblyRef, 2)
        );
    }

    #[test]
    fn truncated_rows() {
        let mut data = TablesBuilder::new()
            .table(TableId::TypeRef, 2)
            .table(TableId::TypeDef, 4)
            .build();
        data.truncate(data.len() - 1);

        assert!(matches!(
            TablesHeap::read(&data),
            Err(Error::TruncatedMetadata {
                table: Some(TableId::TypeDef),
                needed: 56,
                available: 55,
                ..
            })
        ));

        let heap = TablesHeap::read_lenient(&data).unwrap();
        assert!(heap.table(TableId::TypeRef).is_some());
        assert!(heap.table(TableId::TypeDef).is_none());
        assert_eq!(heap.row_count(TableId::TypeDef), 4);
        assert!(matches!(
            heap.decode_error(),
            Some(Error::TruncatedMetadata { table: Some(TableId::TypeDef), .. })
        ));
    }

    #[test]
    fn truncated_header() {
        let data = TablesBuilder::new().table(TableId::Module, 1).build();

        assert!(matches!(
            TablesHeap::read_lenient(&data[..20]),
            Err(Error::TruncatedMetadata { table: None, needed: 24, available: 20, .. })
        ));
        assert!(matches!(
            TablesHeap::read_lenient(&data[..26]),
            Err(Error::TruncatedMetadata { table: None, offset: 24, needed: 4, .. })
        ));
    }

    #[test]
    fn unknown_table_bit() {
        let mut data = TablesBuilder::new().table(TableId::Module, 1).build();
        data[8 + 5] |= 0x20;

        assert!(matches!(
            TablesHeap::read(&data),
            Err(Error::BadMetadataHeap { .. })
        ));
    }

    #[test]
    fn wide_simple_index() {
        let data = TablesBuilder::new()
            .table(TableId::TypeDef, 1)
            .table(TableId::Field, 0x1_0000)
            .build();
        let heap = TablesHeap::read(&data).unwrap();

        // FieldList is widened to 4 bytes by the later Field table
        assert_eq!(heap.table(TableId::TypeDef).unwrap().row_size(), 16);
        assert_eq!(heap.table(TableId::Field).unwrap().len(), 0x1_0000);
    }
}

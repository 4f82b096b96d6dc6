use bitflags::bitflags;
use strum::{EnumCount, IntoEnumIterator};

use crate::metadata::tables::{
    width::{coded_index_width, custom_attribute_string_bound, heap_index_width, simple_index_width},
    CodedIndexType, ColumnKind, TableId, TABLE_COUNT,
};

bitflags! {
    /// The `heap_sizes` byte of the tables heap header.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct HeapSizes: u8 {
        /// Indices into `#Strings` are 4 bytes wide
        const WIDE_STRINGS = 0x01;
        /// Indices into `#GUID` are 4 bytes wide
        const WIDE_GUID = 0x02;
        /// Indices into `#Blob` are 4 bytes wide
        const WIDE_BLOB = 0x04;
    }
}

/// `TableInfo` holds the row count of every table kind together with the resolved width of
/// every index column kind.
///
/// It is computed once, after all row counts have been read and before any row is decoded,
/// since the width of a column in one table may depend on the row count of any other.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TableInfo {
    rows: [u32; TABLE_COUNT],
    coded_widths: [u8; CodedIndexType::COUNT],
    heap_sizes: HeapSizes,
}

impl TableInfo {
    /// Build a new `TableInfo` struct
    ///
    /// ## Arguments
    /// * 'rows'       - Row count per table kind, indexed by [`TableId`]; absent tables are 0
    /// * 'heap_sizes' - The `heap_sizes` flags of the tables heap header
    #[must_use]
    pub fn new(rows: [u32; TABLE_COUNT], heap_sizes: HeapSizes) -> Self {
        let mut info = TableInfo {
            rows,
            coded_widths: [2; CodedIndexType::COUNT],
            heap_sizes,
        };

        for kind in CodedIndexType::iter() {
            info.coded_widths[kind as usize] = info.calculate_coded_index_width(kind);
        }

        info
    }

    /// Build a `TableInfo` from `(table, rows)` pairs; every other table has 0 rows.
    #[must_use]
    pub fn from_counts(counts: &[(TableId, u32)], heap_sizes: HeapSizes) -> Self {
        let mut rows = [0; TABLE_COUNT];
        for (table, count) in counts {
            rows[*table as usize] = *count;
        }

        TableInfo::new(rows, heap_sizes)
    }

    /// Row count of `table`; 0 for absent tables.
    #[must_use]
    pub fn rows(&self, table: TableId) -> u32 {
        self.rows[table as usize]
    }

    /// The heap-size flags these widths were computed for.
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        self.heap_sizes
    }

    /// Width of an index into `#Strings`.
    #[must_use]
    pub fn str_bytes(&self) -> u8 {
        heap_index_width(self.heap_sizes.contains(HeapSizes::WIDE_STRINGS))
    }

    /// Width of an index into `#GUID`.
    #[must_use]
    pub fn guid_bytes(&self) -> u8 {
        heap_index_width(self.heap_sizes.contains(HeapSizes::WIDE_GUID))
    }

    /// Width of an index into `#Blob`.
    #[must_use]
    pub fn blob_bytes(&self) -> u8 {
        heap_index_width(self.heap_sizes.contains(HeapSizes::WIDE_BLOB))
    }

    /// Width of a simple index into `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u8 {
        simple_index_width(self.rows(table))
    }

    /// Width of a coded index of the union `kind`.
    #[must_use]
    pub fn coded_index_bytes(&self, kind: CodedIndexType) -> u8 {
        self.coded_widths[kind as usize]
    }

    /// On-disk width of a column of the given kind.
    #[must_use]
    pub fn column_bytes(&self, kind: ColumnKind) -> u8 {
        match kind {
            ColumnKind::Fixed(width) => width,
            ColumnKind::StringIndex => self.str_bytes(),
            ColumnKind::GuidIndex => self.guid_bytes(),
            ColumnKind::BlobIndex => self.blob_bytes(),
            ColumnKind::TableIndex(table) => self.table_index_bytes(table),
            ColumnKind::CodedIndex(kind) => self.coded_index_bytes(kind),
        }
    }

    fn calculate_coded_index_width(&self, kind: CodedIndexType) -> u8 {
        let mut max_rows = kind.tables().map(|table| self.rows(table)).max().unwrap_or(0);

        if kind == CodedIndexType::CustomAttributeType {
            let bound =
                custom_attribute_string_bound(self.heap_sizes.contains(HeapSizes::WIDE_STRINGS));
            max_rows = max_rows.max(bound);
        }

        coded_index_width(kind.tag_bits(), max_rows)
    }
}

impl Default for TableInfo {
    fn default() -> Self {
        TableInfo::new([0; TABLE_COUNT], HeapSizes::empty())
    }
}

/// Iterate over all table kinds together with their row counts, ascending.
pub(crate) fn present_counts(info: &TableInfo) -> impl Iterator<Item = (TableId, u32)> + '_ {
    TableId::iter()
        .map(|id| (id, info.rows(id)))
        .filter(|(_, rows)| *rows > 0)
}

use crate::{
    file::io::read_le_at_width,
    metadata::{
        tables::{schema, CodedIndex, ColumnKind, TableId, TableInfo, TableSchema},
        token::Token,
    },
    Error, Result,
};

/// The decoded rows of one metadata table.
///
/// Rows are stored as a flat array of column values. Every value is widened to `u32`,
/// whatever its on-disk width was, so access does not depend on the heap-size flags or
/// row counts that were in effect while decoding.
///
/// ```rust,no_run
/// use cilmeta::prelude::*;
///
/// # fn run(tables: &TablesHeap) -> cilmeta::Result<()> {
/// if let Some(methods) = tables.table(TableId::MethodDef) {
///     for row in methods.iter() {
///         println!("{} rva={:#x}", row.token(), row.get_by_name("RVA")?);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct RowStore {
    schema: TableSchema,
    widths: Vec<u8>,
    values: Vec<u32>,
    rows: u32,
}

impl RowStore {
    /// Decode `rows` rows of table `id` from `data`, starting at `offset` and advancing it
    /// past the last row.
    ///
    /// ## Arguments
    /// * 'id'     - The table kind to decode
    /// * 'data'   - The complete `#~` stream
    /// * 'offset' - Position of the first row; updated to the end of the table
    /// * 'rows'   - The row count declared in the header
    /// * 'info'   - Resolved column widths
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedMetadata`] if the table extends past the end of `data`.
    /// `offset` is left unchanged in that case.
    pub fn decode(
        id: TableId,
        data: &[u8],
        offset: &mut usize,
        rows: u32,
        info: &TableInfo,
    ) -> Result<RowStore> {
        let schema = schema(id);
        let widths: Vec<u8> = schema
            .columns
            .iter()
            .map(|column| info.column_bytes(column.kind))
            .collect();
        let row_size: usize = widths.iter().map(|w| usize::from(*w)).sum();

        let available = data.len().saturating_sub(*offset);
        let truncated = |needed: usize| Error::TruncatedMetadata {
            table: Some(id),
            offset: *offset,
            needed,
            available,
        };

        let Some(needed) = row_size.checked_mul(rows as usize) else {
            return Err(truncated(usize::MAX));
        };
        if needed > available {
            return Err(truncated(needed));
        }

        let mut values = Vec::with_capacity(schema.columns.len() * rows as usize);
        let mut cursor = *offset;
        for _ in 0..rows {
            for width in &widths {
                values.push(read_le_at_width(data, &mut cursor, *width)?);
            }
        }

        *offset = cursor;

        Ok(RowStore {
            schema,
            widths,
            values,
            rows,
        })
    }

    /// The table kind of this store.
    #[must_use]
    pub fn id(&self) -> TableId {
        self.schema.id
    }

    /// The column schema.
    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows as usize
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// On-disk size of one row under the widths used while decoding.
    #[must_use]
    pub fn row_size(&self) -> usize {
        self.widths.iter().map(|w| usize::from(*w)).sum()
    }

    /// On-disk width of each column, in schema order.
    #[must_use]
    pub fn column_widths(&self) -> &[u8] {
        &self.widths
    }

    /// Position of the column called `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    /// The row with the 1-based id `rid`.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowOutOfRange`] for row id 0 or beyond the row count.
    pub fn row(&self, rid: u32) -> Result<Row<'_>> {
        if rid == 0 || rid > self.rows {
            return Err(Error::RowOutOfRange {
                table: self.id(),
                rid,
            });
        }

        Ok(Row { store: self, rid })
    }

    /// Value of column `name` in row `rid`.
    ///
    /// # Errors
    /// Returns [`crate::Error::RowOutOfRange`] for an invalid row id, or
    /// [`crate::Error::Error`] if the table has no such column.
    pub fn value(&self, rid: u32, name: &str) -> Result<u32> {
        self.row(rid)?.get_by_name(name)
    }

    /// All rows in ascending row id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Row<'_>> + '_ {
        (0..self.rows).map(move |index| Row {
            store: self,
            rid: index + 1,
        })
    }

    fn row_values(&self, rid: u32) -> &[u32] {
        let width = self.schema.columns.len();
        let start = (rid as usize - 1) * width;
        &self.values[start..start + width]
    }
}

/// A view of one row of a [`RowStore`].
#[derive(Clone, Copy)]
pub struct Row<'a> {
    store: &'a RowStore,
    rid: u32,
}

impl<'a> Row<'a> {
    /// The 1-based row id.
    #[must_use]
    pub fn rid(&self) -> u32 {
        self.rid
    }

    /// The metadata token identifying this row.
    #[must_use]
    pub fn token(&self) -> Token {
        Token::from_parts(self.store.id(), self.rid)
    }

    /// The table this row belongs to.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.store.id()
    }

    /// All column values in schema order.
    #[must_use]
    pub fn values(&self) -> &'a [u32] {
        self.store.row_values(self.rid)
    }

    /// Value of the column at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<u32> {
        self.values().get(index).copied()
    }

    /// Value of the column called `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Error`] if the table has no such column.
    pub fn get_by_name(&self, name: &str) -> Result<u32> {
        let index = self.index_of(name)?;
        Ok(self.values()[index])
    }

    /// Decode the coded index column called `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedToken`] if the stored tag is outside the column's union,
    /// or [`crate::Error::Error`] if `name` is not a coded index column.
    pub fn coded(&self, name: &str) -> Result<CodedIndex> {
        let index = self.index_of(name)?;
        match self.store.schema.columns[index].kind {
            ColumnKind::CodedIndex(kind) => CodedIndex::decode(kind, self.values()[index]),
            other => Err(Error::Error(format!(
                "Column {}.{} is {:?}, not a coded index",
                self.store.id(),
                name,
                other
            ))),
        }
    }

    /// Resolve the simple or coded table reference in column `name` to `(table, rid)`.
    /// A row id of 0 is a null reference.
    ///
    /// # Errors
    /// Returns [`crate::Error::MalformedToken`] for a coded index with an invalid tag, or
    /// [`crate::Error::Error`] if `name` is not a reference column.
    pub fn table_ref(&self, name: &str) -> Result<(TableId, u32)> {
        let index = self.index_of(name)?;
        let value = self.values()[index];
        match self.store.schema.columns[index].kind {
            ColumnKind::TableIndex(table) => Ok((table, value)),
            ColumnKind::CodedIndex(kind) => {
                let coded = CodedIndex::decode(kind, value)?;
                Ok((coded.tag, coded.row))
            }
            other => Err(Error::Error(format!(
                "Column {}.{} is {:?}, not a table reference",
                self.store.id(),
                name,
                other
            ))),
        }
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.store.column_index(name).ok_or_else(|| {
            Error::Error(format!("Table {} has no column {}", self.store.id(), name))
        })
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (column, value) in self.store.schema.columns.iter().zip(self.values()) {
            map.entry(&column.name, value);
        }
        map.finish()
    }
}

//! Byte builders for synthetic metadata used by the unit tests.

use crate::metadata::{
    method::{ExceptionHandler, MethodBodyFlags, SectionFlags},
    tables::{schema, HeapSizes, TableId, TableInfo},
};

/// Builds the bytes of a `#~` stream. Rows are zero-filled unless given explicitly.
pub struct TablesBuilder {
    heap_sizes: u8,
    sorted: u64,
    tables: Vec<(TableId, u32)>,
    rows: Option<Vec<u8>>,
}

impl TablesBuilder {
    pub fn new() -> Self {
        TablesBuilder {
            heap_sizes: 0,
            sorted: 0,
            tables: Vec::new(),
            rows: None,
        }
    }

    pub fn heap_sizes(mut self, heap_sizes: u8) -> Self {
        self.heap_sizes = heap_sizes;
        self
    }

    pub fn sorted(mut self, sorted: u64) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn table(mut self, table: TableId, rows: u32) -> Self {
        self.tables.push((table, rows));
        self
    }

    /// Raw row data of all tables, replacing the zero-filled rows.
    pub fn rows(mut self, rows: &[u8]) -> Self {
        self.rows = Some(rows.to_vec());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut tables = self.tables.clone();
        tables.sort_by_key(|(table, _)| *table);

        let valid = tables.iter().fold(0_u64, |bits, (table, _)| bits | table.bit());

        let mut data = Vec::new();
        data.extend_from_slice(&0_u32.to_le_bytes());
        data.extend_from_slice(&[2, 0, self.heap_sizes, 1]);
        data.extend_from_slice(&valid.to_le_bytes());
        data.extend_from_slice(&self.sorted.to_le_bytes());
        for (_, rows) in &tables {
            data.extend_from_slice(&rows.to_le_bytes());
        }

        match &self.rows {
            Some(rows) => data.extend_from_slice(rows),
            None => {
                let info = TableInfo::from_counts(
                    &tables,
                    HeapSizes::from_bits_retain(self.heap_sizes),
                );
                for (table, rows) in &tables {
                    data.resize(data.len() + row_size(&info, *table) * *rows as usize, 0);
                }
            }
        }

        data
    }
}

/// On-disk row size of `table` under `info`.
pub fn row_size(info: &TableInfo, table: TableId) -> usize {
    schema(table)
        .columns
        .iter()
        .map(|column| usize::from(info.column_bytes(column.kind)))
        .sum()
}

/// Builds a metadata root: header, stream directory and stream bodies.
pub struct RootBuilder {
    signature: u32,
    version: String,
    flags: u16,
    streams: Vec<(String, Vec<u8>)>,
}

impl RootBuilder {
    pub fn new() -> Self {
        RootBuilder {
            signature: 0x424A_5342,
            version: "v4.0.30319".to_string(),
            flags: 0,
            streams: Vec::new(),
        }
    }

    pub fn signature(mut self, signature: u32) -> Self {
        self.signature = signature;
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn stream(mut self, name: &str, data: &[u8]) -> Self {
        self.streams.push((name.to_string(), data.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&self.signature.to_le_bytes());
        data.extend_from_slice(&1_u16.to_le_bytes());
        data.extend_from_slice(&1_u16.to_le_bytes());
        data.extend_from_slice(&0_u32.to_le_bytes());

        let version_len = align4(self.version.len() + 1);
        data.extend_from_slice(&(version_len as u32).to_le_bytes());
        data.extend_from_slice(self.version.as_bytes());
        data.resize(data.len() + version_len - self.version.len(), 0);

        data.extend_from_slice(&self.flags.to_le_bytes());
        data.extend_from_slice(&(self.streams.len() as u16).to_le_bytes());

        let directory: usize = self
            .streams
            .iter()
            .map(|(name, _)| 8 + align4(name.len() + 1))
            .sum();

        let mut offset = data.len() + directory;
        let mut offsets = Vec::new();
        for (name, body) in &self.streams {
            offsets.push(offset);
            data.extend_from_slice(&(offset as u32).to_le_bytes());
            data.extend_from_slice(&(body.len() as u32).to_le_bytes());
            data.extend_from_slice(name.as_bytes());
            data.resize(data.len() + align4(name.len() + 1) - name.len(), 0);
            offset = align4(offset + body.len());
        }

        for ((_, body), offset) in self.streams.iter().zip(offsets) {
            data.resize(offset, 0);
            data.extend_from_slice(body);
        }

        data
    }
}

fn align4(value: usize) -> usize {
    (value + 3) & !3
}

/// RVA of the body of `MethodDef` row 1 in [`sample_tables`].
pub const SAMPLE_METHOD_RVA: u32 = 0x2050;

/// `#Strings` of the sample root: "<Module>" at 1, "Program" at 10, "Main" at 18,
/// "Sample.dll" at 23.
pub const SAMPLE_STRINGS: &[u8] = b"\0<Module>\0Program\0Main\0Sample.dll\0";

/// A `#~` stream with one `Module`, two `TypeDef` and two `MethodDef` rows. The second method
/// has no body.
pub fn sample_tables() -> Vec<u8> {
    #[rustfmt::skip]
    let rows = [
        // Module: Generation, Name, Mvid, EncId, EncBaseId
        0x00, 0x00,  0x17, 0x00,  0x01, 0x00,  0x00, 0x00,  0x00, 0x00,
        // TypeDef: Flags, TypeName, TypeNamespace, Extends, FieldList, MethodList
        0x00, 0x00, 0x00, 0x00,  0x01, 0x00,  0x00, 0x00,  0x00, 0x00,  0x01, 0x00,  0x01, 0x00,
        0x01, 0x00, 0x10, 0x00,  0x0A, 0x00,  0x00, 0x00,  0x00, 0x00,  0x01, 0x00,  0x01, 0x00,
        // MethodDef: RVA, ImplFlags, Flags, Name, Signature, ParamList
        0x50, 0x20, 0x00, 0x00,  0x00, 0x00,  0x96, 0x00,  0x12, 0x00,  0x01, 0x00,  0x01, 0x00,
        0x00, 0x00, 0x00, 0x00,  0x00, 0x00,  0x46, 0x04,  0x12, 0x00,  0x01, 0x00,  0x01, 0x00,
    ];

    TablesBuilder::new()
        .table(TableId::Module, 1)
        .table(TableId::TypeDef, 2)
        .table(TableId::MethodDef, 2)
        .rows(&rows)
        .build()
}

/// A complete metadata root around [`sample_tables`] with all four heaps.
pub fn sample_root() -> RootBuilder {
    let guids: Vec<u8> = (1..=16).collect();

    RootBuilder::new()
        .stream("#~", &sample_tables())
        .stream("#Strings", SAMPLE_STRINGS)
        .stream("#US", &[0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00])
        .stream("#GUID", &guids)
        .stream("#Blob", &[0x00, 0x03, 0x00, 0x00, 0x01])
}

/// A tiny method header followed by `code`, which must be shorter than 64 bytes.
pub fn tiny_method(code: &[u8]) -> Vec<u8> {
    let mut data = vec![((code.len() as u8) << 2) | 0b10];
    data.extend_from_slice(code);
    data
}

/// Builds a fat method body with optional exception sections.
pub struct FatMethod {
    code: Vec<u8>,
    max_stack: u16,
    init_locals: bool,
    header_words: u16,
    local_var_sig: u32,
    sections: Vec<(bool, Vec<ExceptionHandler>)>,
}

impl FatMethod {
    pub fn new(code: &[u8]) -> Self {
        FatMethod {
            code: code.to_vec(),
            max_stack: 8,
            init_locals: false,
            header_words: 3,
            local_var_sig: 0,
            sections: Vec::new(),
        }
    }

    pub fn max_stack(mut self, max_stack: u16) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn init_locals(mut self) -> Self {
        self.init_locals = true;
        self
    }

    pub fn header_words(mut self, words: u16) -> Self {
        self.header_words = words;
        self
    }

    pub fn local_var_sig(mut self, token: u32) -> Self {
        self.local_var_sig = token;
        self
    }

    pub fn small_clauses(mut self, clauses: &[ExceptionHandler]) -> Self {
        self.sections.push((false, clauses.to_vec()));
        self
    }

    pub fn fat_clauses(mut self, clauses: &[ExceptionHandler]) -> Self {
        self.sections.push((true, clauses.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut flags = MethodBodyFlags::FAT_FORMAT;
        if self.init_locals {
            flags |= MethodBodyFlags::INIT_LOCALS;
        }
        if !self.sections.is_empty() {
            flags |= MethodBodyFlags::MORE_SECTS;
        }

        let mut data = Vec::new();
        data.extend_from_slice(&(flags.bits() | (self.header_words << 12)).to_le_bytes());
        data.extend_from_slice(&self.max_stack.to_le_bytes());
        data.extend_from_slice(&(self.code.len() as u32).to_le_bytes());
        data.extend_from_slice(&self.local_var_sig.to_le_bytes());
        data.resize(12.max(usize::from(self.header_words) * 4), 0);
        data.extend_from_slice(&self.code);

        for (index, (fat, clauses)) in self.sections.iter().enumerate() {
            data.resize(align4(data.len()), 0);

            let mut kind = SectionFlags::EHTABLE;
            if *fat {
                kind |= SectionFlags::FAT_FORMAT;
            }
            if index + 1 < self.sections.len() {
                kind |= SectionFlags::MORE_SECTS;
            }

            let clause_size = if *fat { 24 } else { 12 };
            let size = (4 + clauses.len() * clause_size) as u32;
            data.push(kind.bits());
            if *fat {
                data.extend_from_slice(&size.to_le_bytes()[..3]);
            } else {
                data.extend_from_slice(&[size as u8, 0, 0]);
            }

            for clause in clauses {
                if *fat {
                    data.extend_from_slice(&u32::from(clause.flags.bits()).to_le_bytes());
                    data.extend_from_slice(&clause.try_offset.to_le_bytes());
                    data.extend_from_slice(&clause.try_length.to_le_bytes());
                    data.extend_from_slice(&clause.handler_offset.to_le_bytes());
                    data.extend_from_slice(&clause.handler_length.to_le_bytes());
                } else {
                    data.extend_from_slice(&clause.flags.bits().to_le_bytes());
                    data.extend_from_slice(&(clause.try_offset as u16).to_le_bytes());
                    data.push(clause.try_length as u8);
                    data.extend_from_slice(&(clause.handler_offset as u16).to_le_bytes());
                    data.push(clause.handler_length as u8);
                }
                data.extend_from_slice(&clause.class_token_or_filter.to_le_bytes());
            }
        }

        data
    }
}

//! Human-readable rendering of table rows.

use std::fmt::Write;

use crate::metadata::{
    streams::{BlobHeap, GuidHeap, StringsHeap},
    tables::{CodedIndex, ColumnKind, Row},
};

/// Number of blob bytes shown before the preview is cut off.
const BLOB_PREVIEW: usize = 16;

/// The heaps available for resolving row values. A missing heap leaves its columns raw.
#[derive(Clone, Copy, Default)]
pub(crate) struct DumpHeaps<'a> {
    pub strings: Option<&'a StringsHeap>,
    pub guids: Option<&'a GuidHeap>,
    pub blobs: Option<&'a BlobHeap>,
}

/// Render `row` as one `Column : value` line per column.
pub(crate) fn dump_row(row: &Row<'_>, heaps: DumpHeaps<'_>) -> String {
    let mut out = String::new();
    let schema = crate::metadata::tables::schema(row.table());

    for (column, value) in schema.columns.iter().zip(row.values()) {
        let rendered = match column.kind {
            ColumnKind::Fixed(_) => format!("0x{value:X}"),
            ColumnKind::StringIndex => render_string(*value, heaps.strings),
            ColumnKind::GuidIndex => render_guid(*value, heaps.guids),
            ColumnKind::BlobIndex => render_blob(*value, heaps.blobs),
            ColumnKind::TableIndex(table) => format!("{table}[{value}]"),
            ColumnKind::CodedIndex(kind) => match CodedIndex::decode(kind, *value) {
                Ok(coded) if coded.is_null() => format!("{}[0] (null)", coded.tag),
                Ok(coded) => format!("{}[{}] ({})", coded.tag, coded.row, coded.token),
                Err(_) => format!("<malformed {kind:?} 0x{value:X}>"),
            },
        };

        let _ = writeln!(out, "{:<18}: {}", column.name, rendered);
    }

    out
}

fn render_string(offset: u32, strings: Option<&StringsHeap>) -> String {
    match strings.map(|heap| heap.lookup(offset as usize)) {
        Some(Ok(text)) => format!("\"{text}\" (#Strings[0x{offset:X}])"),
        _ => format!("#Strings[0x{offset:X}]"),
    }
}

fn render_guid(index: u32, guids: Option<&GuidHeap>) -> String {
    match guids.map(|heap| heap.ordinal(index)) {
        Some(Ok(Some(guid))) => format!("#GUID[{guid}]"),
        Some(Ok(None)) => "#GUID[null]".to_string(),
        _ => format!("#GUID[{index}]"),
    }
}

fn render_blob(offset: u32, blobs: Option<&BlobHeap>) -> String {
    let Some(Ok(blob)) = blobs.map(|heap| heap.lookup(offset as usize)) else {
        return format!("#Blob[0x{offset:X}]");
    };

    let mut preview = String::new();
    for byte in blob.iter().take(BLOB_PREVIEW) {
        let _ = write!(preview, " {byte:02X}");
    }
    if blob.len() > BLOB_PREVIEW {
        preview.push_str(" ..");
    }

    format!("#Blob[0x{offset:X}] ({} bytes){preview}", blob.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tables::{HeapSizes, RowStore, TableId, TableInfo};

    #[rustfmt::skip]
    const MODULE: [u8; 10] = [
        // Generation, Name, Mvid, EncId, EncBaseId
        0x00, 0x00,  0x01, 0x00,  0x01, 0x00,  0x00, 0x00,  0x00, 0x00,
    ];

    fn module() -> RowStore {
        let info = TableInfo::from_counts(&[(TableId::Module, 1)], HeapSizes::empty());
        let mut offset = 0;
        RowStore::decode(TableId::Module, &MODULE, &mut offset, 1, &info).unwrap()
    }

    #[test]
    fn resolved() {
        let store = module();
        let strings = StringsHeap::from(b"\0Sample.dll\0".to_vec()).unwrap();
        let mut guid_bytes = vec![0x11; 16];
        guid_bytes[0] = 0x78;
        let guids = GuidHeap::from(guid_bytes);

        let dump = dump_row(
            &store.row(1).unwrap(),
            DumpHeaps {
                strings: Some(&strings),
                guids: Some(&guids),
                blobs: None,
            },
        );

        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Generation        : 0x0");
        assert_eq!(lines[1], "Name              : \"Sample.dll\" (#Strings[0x1])");
        assert_eq!(
            lines[2],
            "Mvid              : #GUID[11111178-1111-1111-1111-111111111111]"
        );
        assert_eq!(lines[3], "EncId             : #GUID[null]");
    }

    #[test]
    fn raw_without_heaps() {
        let store = module();
        let dump = dump_row(&store.row(1).unwrap(), DumpHeaps::default());
        assert!(dump.contains("Name              : #Strings[0x1]\n"));
        assert!(dump.contains("Mvid              : #GUID[1]\n"));
    }

    #[test]
    fn references_and_blobs() {
        #[rustfmt::skip]
        let data = [
            // Flags, Name, Signature
            0x06, 0x00,  0x00, 0x00,  0x01, 0x00,
        ];
        let info = TableInfo::from_counts(&[(TableId::Field, 1)], HeapSizes::empty());
        let mut offset = 0;
        let fields = RowStore::decode(TableId::Field, &data, &mut offset, 1, &info).unwrap();
        let blobs = BlobHeap::from(vec![0x00, 0x02, 0x06, 0x08]).unwrap();

        let dump = dump_row(
            &fields.row(1).unwrap(),
            DumpHeaps {
                blobs: Some(&blobs),
                ..DumpHeaps::default()
            },
        );
        assert!(dump.contains("Flags             : 0x6\n"));
        assert!(dump.contains("Signature         : #Blob[0x1] (2 bytes) 06 08\n"));

        #[rustfmt::skip]
        let data = [
            // ResolutionScope, TypeName, TypeNamespace
            0x06, 0x00,  0x00, 0x00,  0x00, 0x00,
        ];
        let info = TableInfo::from_counts(&[(TableId::TypeRef, 1)], HeapSizes::empty());
        let mut offset = 0;
        let type_refs = RowStore::decode(TableId::TypeRef, &data, &mut offset, 1, &info).unwrap();
        let dump = dump_row(&type_refs.row(1).unwrap(), DumpHeaps::default());
        assert!(dump.starts_with("ResolutionScope   : AssemblyRef[1] (0x23000001)\n"));
    }
}

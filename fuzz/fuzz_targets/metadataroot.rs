#![no_main]

use cilmeta::{metadata::tables::TableId, LoaderConfig, MetadataRoot};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(root) = MetadataRoot::read_with_config(data, LoaderConfig::lenient()) else {
        return;
    };

    let _ = root.strings();
    let _ = root.guids();
    let _ = root.blobs();
    let _ = root.user_strings();

    if let Ok(tables) = root.tables() {
        for store in tables.tables() {
            for row in store.iter().take(16) {
                let _ = root.dump_row(store.id(), row.rid());
            }
        }
        let _ = tables.row_count(TableId::MethodDef);
    }
});

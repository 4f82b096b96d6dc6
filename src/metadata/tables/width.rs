//! On-disk widths of index columns.
//!
//! Every index column of a metadata table is stored with 2 bytes unless the values it may
//! take do not fit, in which case it uses 4 bytes (ECMA-335 II.24.2.6). These functions
//! decide the width from row counts and heap-size flags; they perform no I/O and cannot fail.

/// Width in bytes of a simple index into a table with `row_count` rows.
///
/// ```rust
/// use cilmeta::metadata::tables::width::simple_index_width;
///
/// assert_eq!(simple_index_width(65_535), 2);
/// assert_eq!(simple_index_width(65_536), 4);
/// ```
#[must_use]
pub const fn simple_index_width(row_count: u32) -> u8 {
    if row_count < (1 << 16) {
        2
    } else {
        4
    }
}

/// Width in bytes of a coded index whose union uses `tag_bits` tag bits and whose largest
/// participating table has `max_row_count` rows.
///
/// The remaining `16 - tag_bits` bits of a 2-byte value must be able to hold every row id.
///
/// ```rust
/// use cilmeta::metadata::tables::width::coded_index_width;
///
/// assert_eq!(coded_index_width(2, (1 << 14) - 1), 2);
/// assert_eq!(coded_index_width(2, 1 << 14), 4);
/// ```
#[must_use]
pub const fn coded_index_width(tag_bits: u32, max_row_count: u32) -> u8 {
    if tag_bits >= 16 {
        return 4;
    }

    if max_row_count < (1 << (16 - tag_bits)) {
        2
    } else {
        4
    }
}

/// Width in bytes of an index into a heap; `wide` is the heap's `heap_sizes` bit.
#[must_use]
pub const fn heap_index_width(wide: bool) -> u8 {
    if wide {
        4
    } else {
        2
    }
}

/// Effective row bound of the string pseudo-target folded into the `CustomAttributeType`
/// union: `1 << 17` when string indices are wide, else `1`.
#[must_use]
pub const fn custom_attribute_string_bound(wide_strings: bool) -> u32 {
    if wide_strings {
        1 << 17
    } else {
        1
    }
}

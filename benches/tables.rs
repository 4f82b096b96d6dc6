//! Benchmarks for the metadata decoding hot paths.
//!
//! - Tables heap decoding (row counts, width resolution, row decoding)
//! - `#Strings` heap construction and suffix lookups
//! - Compressed integer encoding
//! - Method body decoding

extern crate cilmeta;

use cilmeta::metadata::{
    method::MethodBody,
    streams::{StringsHeap, TablesHeap},
    tables::{schema, HeapSizes, TableId, TableInfo},
    token::{compress_uint, decompress_uint},
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

/// A `#~` stream with zero-filled rows for the given tables.
fn tables_stream(tables: &[(TableId, u32)], heap_sizes: u8) -> Vec<u8> {
    let valid = tables.iter().fold(0_u64, |bits, (table, _)| bits | table.bit());

    let mut data = Vec::new();
    data.extend_from_slice(&0_u32.to_le_bytes());
    data.extend_from_slice(&[2, 0, heap_sizes, 1]);
    data.extend_from_slice(&valid.to_le_bytes());
    data.extend_from_slice(&0_u64.to_le_bytes());
    for (_, rows) in tables {
        data.extend_from_slice(&rows.to_le_bytes());
    }

    let info = TableInfo::from_counts(tables, HeapSizes::from_bits_retain(heap_sizes));
    for (table, rows) in tables {
        let row_size: usize = schema(*table)
            .columns
            .iter()
            .map(|column| usize::from(info.column_bytes(column.kind)))
            .sum();
        data.resize(data.len() + row_size * *rows as usize, 0);
    }

    data
}

/// Benchmark decoding a tables heap shaped like a mid-sized library.
fn bench_tables_heap(c: &mut Criterion) {
    let data = tables_stream(
        &[
            (TableId::Module, 1),
            (TableId::TypeRef, 800),
            (TableId::TypeDef, 1_200),
            (TableId::Field, 6_000),
            (TableId::MethodDef, 12_000),
            (TableId::Param, 15_000),
            (TableId::MemberRef, 4_000),
            (TableId::CustomAttribute, 5_000),
            (TableId::AssemblyRef, 12),
        ],
        0x00,
    );

    c.bench_function("tables_heap_narrow", |b| {
        b.iter(|| {
            let heap = TablesHeap::read(black_box(&data)).unwrap();
            black_box(heap)
        });
    });
}

/// Benchmark decoding a tables heap with wide heap and table indices.
fn bench_tables_heap_wide(c: &mut Criterion) {
    let data = tables_stream(
        &[
            (TableId::TypeDef, 4_000),
            (TableId::MethodDef, 70_000),
            (TableId::Param, 90_000),
        ],
        0x07,
    );

    c.bench_function("tables_heap_wide", |b| {
        b.iter(|| {
            let heap = TablesHeap::read(black_box(&data)).unwrap();
            black_box(heap)
        });
    });
}

/// Benchmark building a `#Strings` heap and resolving aliased offsets.
fn bench_strings(c: &mut Criterion) {
    let mut data = vec![0_u8];
    for index in 0..5_000 {
        data.extend_from_slice(format!("System.Namespace{index}.TypeName{index}").as_bytes());
        data.push(0);
    }

    c.bench_function("strings_heap_build", |b| {
        b.iter(|| {
            let heap = StringsHeap::from(black_box(data.clone())).unwrap();
            black_box(heap)
        });
    });

    let heap = StringsHeap::from(data.clone()).unwrap();
    c.bench_function("strings_heap_lookup", |b| {
        b.iter(|| {
            for offset in (1..data.len()).step_by(97) {
                black_box(heap.lookup(black_box(offset)).unwrap());
            }
        });
    });
}

/// Benchmark compressed integer round trips across all encoded lengths.
fn bench_compressed_uint(c: &mut Criterion) {
    let values = [0x03_u32, 0x7F, 0x80, 0x2E57, 0x3FFF, 0x4000, 0x1FFF_FFFF];

    c.bench_function("compressed_uint", |b| {
        b.iter(|| {
            for value in values {
                let encoded = compress_uint(black_box(value)).unwrap();
                black_box(decompress_uint(encoded.as_bytes()).unwrap());
            }
        });
    });
}

/// Benchmark decoding a fat method body with a small exception section.
fn bench_method_body(c: &mut Criterion) {
    let mut data = vec![0x1B, 0x30, 0x04, 0x00];
    data.extend_from_slice(&256_u32.to_le_bytes());
    data.extend_from_slice(&0x1100_0001_u32.to_le_bytes());
    data.resize(12 + 256, 0x00);
    data.extend_from_slice(&[0x01, 0x10, 0x00, 0x00]);
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x00, 0x10, 0x10, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00]);

    c.bench_function("method_body_fat", |b| {
        b.iter(|| {
            let body = MethodBody::from(black_box(&data)).unwrap();
            black_box(body)
        });
    });
}

criterion_group!(
    benches,
    bench_tables_heap,
    bench_tables_heap_wide,
    bench_strings,
    bench_compressed_uint,
    bench_method_body
);
criterion_main!(benches);

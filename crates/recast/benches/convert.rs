// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion Benchmarks
//!
//! Measures steady-state plan execution (plans are compiled before timing):
//! - leaf parsing and formatting
//! - aliasing vs copying list conversion
//! - map to record matching
//! - cold compilation of a record pair in a fresh scope

#![allow(clippy::uninlined_format_args)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recast::types::{registry, PrimitiveKind, TypeDescriptor};
use recast::{Scope, TypeDescriptorBuilder, TypeRef, Value};
use std::sync::Arc;

fn prim(kind: PrimitiveKind) -> TypeRef {
    registry::primitive(kind)
}

fn bench_leaf(c: &mut Criterion) {
    let scope = Scope::builder().build();
    let to_string = scope
        .converter(&prim(PrimitiveKind::I64), &prim(PrimitiveKind::String))
        .expect("i64 -> String");
    let parse = scope
        .converter(&prim(PrimitiveKind::String), &prim(PrimitiveKind::I64))
        .expect("String -> i64");
    let text = Value::from("1234567");

    c.bench_function("leaf_format_i64", |b| {
        b.iter(|| to_string.convert(black_box(&Value::I64(1_234_567))))
    });
    c.bench_function("leaf_parse_i64", |b| b.iter(|| parse.convert(black_box(&text))));
}

fn bench_lists(c: &mut Criterion) {
    let from = Arc::new(TypeDescriptor::list(prim(PrimitiveKind::I64)));
    let to = Arc::new(TypeDescriptor::list(prim(PrimitiveKind::I64)));
    let widened = Arc::new(TypeDescriptor::list(prim(PrimitiveKind::F64)));

    let mut group = c.benchmark_group("list");
    for size in [16usize, 1024] {
        let src = Value::list((0..size as i64).map(Value::I64).collect());
        let cases = [
            ("alias", Scope::builder().build().converter(&from, &to)),
            ("copy", Scope::builder().disable_zero_copy().build().converter(&from, &to)),
            ("widen", Scope::builder().build().converter(&from, &widened)),
        ];
        for (name, conv) in cases {
            let conv = conv.expect("list plan");
            group.bench_with_input(BenchmarkId::new(name, size), &src, |b, src| {
                b.iter(|| conv.convert(black_box(src)))
            });
        }
    }
    group.finish();
}

fn server_type() -> TypeRef {
    TypeDescriptorBuilder::new("Server")
        .field("Host", PrimitiveKind::String)
        .field("Port", PrimitiveKind::U16)
        .field("MaxConnections", PrimitiveKind::U32)
        .field("Verbose", PrimitiveKind::Bool)
        .build_ref()
}

fn bench_map_to_record(c: &mut Criterion) {
    let server = server_type();
    let map = Arc::new(TypeDescriptor::map(prim(PrimitiveKind::String), prim(PrimitiveKind::String)));
    let conv = Scope::builder()
        .build()
        .converter(&map, &server)
        .expect("map -> record");
    let src = Value::map([
        (Value::from("host"), Value::from("localhost")),
        (Value::from("port"), Value::from("8080")),
        (Value::from("max_connections"), Value::from("512")),
        (Value::from("verbose"), Value::from("true")),
    ]);

    c.bench_function("map_to_record", |b| b.iter(|| conv.convert(black_box(&src))));
}

fn bench_cold_compile(c: &mut Criterion) {
    let server = server_type();
    let map = Arc::new(TypeDescriptor::map(prim(PrimitiveKind::String), registry::any_type()));

    c.bench_function("compile_record_pair", |b| {
        b.iter(|| {
            let scope = Scope::builder().build();
            black_box(scope.converter(&map, &server).expect("plan"))
        })
    });
}

criterion_group!(
    benches,
    bench_leaf,
    bench_lists,
    bench_map_to_record,
    bench_cold_compile
);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants

//! Typed entry point integration tests
//!
//! `cast`, `converter` and `deep_copy` over `Reflect` types.

use recast::{cast, cast_with_scope, converter, deep_copy, ConvertError, ErrorPhase, Scope};
use std::collections::HashMap;
use std::sync::Arc;

#[test]
fn test_int_string_round_trip() {
    for _ in 0..100 {
        let n = fastrand::i32(..);
        let text: String = cast(&n).unwrap();
        let back: i32 = cast(&text).unwrap();
        assert_eq!(back, n);
    }
}

#[test]
fn test_not_a_number() {
    let err = cast::<String, i64>(&"not-a-number".to_string()).unwrap_err();
    assert!(matches!(err, ConvertError::LeafParse { .. }));
    assert_eq!(err.phase(), ErrorPhase::Call);
    assert!(err.to_string().contains("not-a-number"));
}

#[test]
fn test_list_truncates_into_array() {
    let out: [i64; 2] = cast(&vec![1i64, 2, 3]).unwrap();
    assert_eq!(out, [1, 2]);
    let out: [u8; 4] = cast(&vec![9u16]).unwrap();
    assert_eq!(out, [9, 0, 0, 0]);
}

#[test]
fn test_bytes_and_strings() {
    let bytes: Vec<u8> = cast(&"héllo".to_string()).unwrap();
    assert_eq!(bytes, "héllo".as_bytes());
    let text: String = cast(&bytes).unwrap();
    assert_eq!(text, "héllo");
    let chars: Vec<char> = cast(&"ab".to_string()).unwrap();
    assert_eq!(chars, vec!['a', 'b']);
    let c: char = cast(&"z".to_string()).unwrap();
    assert_eq!(c, 'z');
    assert!(cast::<String, char>(&"zz".to_string()).is_err());
}

#[test]
fn test_nested_containers() {
    let mut src: HashMap<String, Vec<i32>> = HashMap::new();
    src.insert("evens".into(), vec![2, 4]);
    src.insert("odds".into(), vec![1, 3, 5]);
    let out: HashMap<String, Vec<String>> = cast(&src).unwrap();
    assert_eq!(out["odds"], vec!["1", "3", "5"]);

    let opt: Option<Option<i64>> = cast(&Some(7i32)).unwrap();
    assert_eq!(opt, Some(Some(7)));
    let none: Option<String> = cast(&Option::<i64>::None).unwrap();
    assert_eq!(none, None);
}

#[test]
fn test_converter_is_cached() {
    let scope = Scope::builder().build();
    let first = recast::converter_with_scope::<Vec<f32>, Vec<f64>>(&scope).unwrap();
    let second = recast::converter_with_scope::<Vec<f32>, Vec<f64>>(&scope).unwrap();
    assert_eq!(first.convert(&vec![0.5]).unwrap(), vec![0.5]);
    assert_eq!(second.convert(&vec![1.5, 2.0]).unwrap(), vec![1.5, 2.0]);
    assert!(scope.stats().hits >= 1);

    let global = converter::<u8, bool>().unwrap();
    assert!(global.convert(&1).unwrap());
    assert!(!global.convert(&0).unwrap());
}

#[test]
fn test_deep_copy() {
    let mut src: HashMap<i64, Option<Vec<String>>> = HashMap::new();
    src.insert(1, Some(vec!["a".into()]));
    src.insert(2, None);
    assert_eq!(deep_copy(&src).unwrap(), src);
}

#[test]
fn test_typed_override_in_scope() {
    let scope = Scope::builder()
        .register::<bool, String>(|b| Ok(if *b { "yes".into() } else { "no".into() }))
        .build();
    let out: Vec<String> = cast_with_scope(&scope, &vec![true, false]).unwrap();
    assert_eq!(out, vec!["yes", "no"]);
    // The global scope is unaffected.
    assert_eq!(cast::<bool, String>(&true).unwrap(), "true");
}

#[test]
fn test_concurrent_casts() {
    let scope = Arc::new(Scope::builder().build());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let scope = Arc::clone(&scope);
            std::thread::spawn(move || {
                for i in 0..50i64 {
                    let out: String = cast_with_scope(&scope, &(t * 100 + i)).unwrap();
                    assert_eq!(out, (t * 100 + i).to_string());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(scope.cached_plans(), 1);
}

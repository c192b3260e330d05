// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide descriptor registry.
//!
//! Canonical primitive descriptors, the built-in dynamic types and the
//! descriptors of Rust types reflected through [`crate::Reflect`] are created
//! lazily on first use and never change afterwards.

use super::{PrimitiveKind, TypeDescriptor, TypeRef};
use crate::value::Value;
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

const PRIMITIVE_KINDS: [PrimitiveKind; 14] = [
    PrimitiveKind::Bool,
    PrimitiveKind::I8,
    PrimitiveKind::I16,
    PrimitiveKind::I32,
    PrimitiveKind::I64,
    PrimitiveKind::U8,
    PrimitiveKind::U16,
    PrimitiveKind::U32,
    PrimitiveKind::U64,
    PrimitiveKind::Usize,
    PrimitiveKind::F32,
    PrimitiveKind::F64,
    PrimitiveKind::Char,
    PrimitiveKind::String,
];

struct Builtins {
    primitives: Vec<TypeRef>,
    any: TypeRef,
    error: TypeRef,
    conversion_error: TypeRef,
    raw_pointer: TypeRef,
}

fn builtins() -> &'static Builtins {
    static BUILTINS: OnceLock<Builtins> = OnceLock::new();
    BUILTINS.get_or_init(|| {
        let primitives = PRIMITIVE_KINDS
            .iter()
            .map(|kind| Arc::new(TypeDescriptor::primitive(*kind)))
            .collect();
        let conversion_error = Arc::new(
            TypeDescriptor::named_primitive("ConversionError", PrimitiveKind::String)
                .with_method("Error", Value::clone),
        );
        Builtins {
            primitives,
            any: Arc::new(TypeDescriptor::dynamic("", Vec::<String>::new())),
            error: Arc::new(TypeDescriptor::dynamic("error", ["Error"])),
            conversion_error,
            raw_pointer: Arc::new(TypeDescriptor::new("", super::TypeKind::RawPointer)),
        }
    })
}

fn rust_types() -> &'static DashMap<std::any::TypeId, TypeRef> {
    static RUST_TYPES: OnceLock<DashMap<std::any::TypeId, TypeRef>> = OnceLock::new();
    RUST_TYPES.get_or_init(DashMap::new)
}

/// Canonical descriptor of an unnamed primitive.
pub fn primitive(kind: PrimitiveKind) -> TypeRef {
    let index = PRIMITIVE_KINDS
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    Arc::clone(&builtins().primitives[index])
}

/// `dyn Any`: accepts every concrete type.
pub fn any_type() -> TypeRef {
    Arc::clone(&builtins().any)
}

/// Error-like dynamic type (method set `{Error}`).
pub fn error_type() -> TypeRef {
    Arc::clone(&builtins().error)
}

/// Concrete string-backed type packed into error slots by callable adapters.
pub fn conversion_error_type() -> TypeRef {
    Arc::clone(&builtins().conversion_error)
}

pub fn raw_pointer_type() -> TypeRef {
    Arc::clone(&builtins().raw_pointer)
}

/// Descriptor registered for the Rust type `T`, built on first request.
///
/// `build` runs outside any registry lock so it may itself request other
/// descriptors. When two threads race, the first insert wins and both
/// observe the same descriptor.
pub fn descriptor_of<T: 'static>(build: impl FnOnce() -> TypeRef) -> TypeRef {
    let key = std::any::TypeId::of::<T>();
    if let Some(hit) = rust_types().get(&key) {
        return Arc::clone(hit.value());
    }
    let built = build();
    Arc::clone(rust_types().entry(key).or_insert(built).value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_canonical() {
        let a = primitive(PrimitiveKind::I32);
        let b = primitive(PrimitiveKind::I32);
        assert!(Arc::ptr_eq(&a, &b));
        assert_ne!(primitive(PrimitiveKind::I32), primitive(PrimitiveKind::I64));
    }

    #[test]
    fn test_conversion_error_is_error_like() {
        let err = conversion_error_type();
        assert!(err.implements(&["Error".to_string()]));
        assert!(error_type().is_error_like());
        assert!(!any_type().is_error_like());
    }

    #[test]
    fn test_descriptor_of_stable() {
        struct Marker;
        let first = descriptor_of::<Marker>(|| Arc::new(TypeDescriptor::declared("Marker")));
        let second = descriptor_of::<Marker>(|| Arc::new(TypeDescriptor::declared("Other")));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name(), "Marker");
    }
}

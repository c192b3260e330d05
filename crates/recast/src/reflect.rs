// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rust types with a descriptor.
//!
//! [`Reflect`] maps a Rust type to its [`TypeDescriptor`](crate::types::TypeDescriptor)
//! and moves values in and out of the [`Value`] model. The typed entry points
//! ([`cast`](crate::cast), [`converter`](crate::converter),
//! [`deep_copy`](crate::deep_copy)) are built on it.
//!
//! Implemented for every primitive, `String`, `Vec<T>`, `[T; N]`,
//! `HashMap<K, V>` and `Option<T>` (a pointer that may be nil).

use crate::error::{ConvertError, Result};
use crate::types::{registry, PrimitiveKind, TypeDescriptor, TypeRef};
use crate::value::Value;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

pub trait Reflect: Sized + 'static {
    /// Descriptor of `Self`; the same `Arc` on every call.
    fn descriptor() -> TypeRef;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Result<Self>;
}

macro_rules! impl_reflect_primitive {
    ($($ty:ty => $kind:ident, $variant:ident);* $(;)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeRef {
                    registry::primitive(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(*v),
                        other => Err(ConvertError::mismatch(stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

impl_reflect_primitive! {
    bool => Bool, Bool;
    i8 => I8, I8;
    i16 => I16, I16;
    i32 => I32, I32;
    i64 => I64, I64;
    u8 => U8, U8;
    u16 => U16, U16;
    u32 => U32, U32;
    u64 => U64, U64;
    usize => Usize, Usize;
    f32 => F32, F32;
    f64 => F64, F64;
    char => Char, Char;
}

impl Reflect for String {
    fn descriptor() -> TypeRef {
        registry::primitive(PrimitiveKind::String)
    }

    fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }

    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ConvertError::mismatch("String", value))
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn descriptor() -> TypeRef {
        registry::descriptor_of::<Self>(|| Arc::new(TypeDescriptor::list(T::descriptor())))
    }

    fn to_value(&self) -> Value {
        Value::list(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::List(None) => Ok(Vec::new()),
            Value::List(Some(items)) => items.read().iter().map(T::from_value).collect(),
            other => Err(ConvertError::mismatch("Vec", other)),
        }
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn descriptor() -> TypeRef {
        registry::descriptor_of::<Self>(|| Arc::new(TypeDescriptor::array(T::descriptor(), N)))
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Reflect::to_value).collect())
    }

    fn from_value(value: &Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ConvertError::mismatch("array", value));
        };
        let items = items.iter().map(T::from_value).collect::<Result<Vec<_>>>()?;
        items
            .try_into()
            .map_err(|_| ConvertError::mismatch(&format!("array of {}", N), value))
    }
}

impl<K, V> Reflect for HashMap<K, V>
where
    K: Reflect + Eq + Hash,
    V: Reflect,
{
    fn descriptor() -> TypeRef {
        registry::descriptor_of::<Self>(|| {
            Arc::new(TypeDescriptor::map(K::descriptor(), V::descriptor()))
        })
    }

    fn to_value(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())))
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Map(None) => Ok(HashMap::new()),
            Value::Map(Some(entries)) => entries
                .read()
                .iter()
                .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            other => Err(ConvertError::mismatch("HashMap", other)),
        }
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> TypeRef {
        registry::descriptor_of::<Self>(|| Arc::new(TypeDescriptor::pointer(T::descriptor())))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => Value::pointer(inner.to_value()),
            None => Value::Pointer(None),
        }
    }

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Pointer(None) => Ok(None),
            Value::Pointer(Some(cell)) => T::from_value(&cell.read()).map(Some),
            other => Err(ConvertError::mismatch("Option", other)),
        }
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # recast - runtime value conversion
//!
//! Converts values between structurally related types described at runtime:
//! numbers to strings and back, lists to fixed arrays, maps to records,
//! records to records matched by field name, pointer chains of any depth,
//! dynamic values and callables.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! fn main() -> recast::Result<()> {
//!     let port: u16 = recast::cast(&"8080".to_string())?;
//!     assert_eq!(port, 8080);
//!
//!     let counts = HashMap::from([("a".to_string(), 1i64)]);
//!     let text: HashMap<String, String> = recast::cast(&counts)?;
//!     assert_eq!(text["a"], "1");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |   cast / converter / deep_copy        (typed, via Reflect)          |
//! +---------------------------------------------------------------------+
//! |   Scope: options, overrides, plan table (read-mostly RwLock)        |
//! +---------------------------------------------------------------------+
//! |   Compiler: override -> alias -> stringer -> unpack/deref -> kind   |
//! |   Converters: scalar | string | list | array | map | record |      |
//! |               pointer | dynamic | callable | channel | raw pointer  |
//! +---------------------------------------------------------------------+
//! |   Layout analyzer | Field matcher | Leaf parsers | Value model      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! A conversion for a pair of types is compiled once into a [`Plan`] and
//! cached in its [`Scope`]. Pairs whose layouts are compatible become a raw
//! copy that shares heap storage ([`PlanFlags::produces_alias`]); a scope built
//! with [`ScopeBuilder::deep_copy`] never shares.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDescriptor`] | Runtime shape of a type |
//! | [`Value`] | Runtime value of any shape |
//! | [`Scope`] | Options, overrides and plan cache |
//! | [`Converter`] | Pre-resolved plan for one pair |
//! | [`ConvertError`] | Compile-time or call-time failure |

/// Plan compiler and per-kind converters.
mod convert;
/// Conversion errors.
pub mod error;
/// Record field flattening and matching.
pub mod fields;
/// Layout compatibility and aliasing eligibility.
pub mod layout;
/// Primitive parsing and formatting.
mod leaf;
/// Compiled plans.
pub mod plan;
/// Rust type to descriptor mapping.
pub mod reflect;
/// Scopes, options and converters.
pub mod scope;
/// Type descriptors, builder and registry.
pub mod types;
/// Runtime value model.
pub mod value;

pub use error::{ConvertError, ErrorPhase, Result};
pub use layout::{is_aliasable, is_layout_compatible};
pub use plan::{Plan, PlanFlags};
pub use reflect::Reflect;
pub use scope::{Converter, ConverterFn, LookupStats, Scope, ScopeBuilder, ScopeOptions};
pub use types::{TypeDescriptor, TypeDescriptorBuilder, TypeRef};
pub use value::Value;

use std::fmt;
use std::marker::PhantomData;

/// Convert `value` to `T` in the global scope.
pub fn cast<F: Reflect, T: Reflect>(value: &F) -> Result<T> {
    cast_with_scope(Scope::global(), value)
}

pub fn cast_with_scope<F: Reflect, T: Reflect>(scope: &Scope, value: &F) -> Result<T> {
    let out = scope.convert(&F::descriptor(), &T::descriptor(), &value.to_value())?;
    T::from_value(&out)
}

/// Pre-resolved `F -> T` converter from the global scope.
pub fn converter<F: Reflect, T: Reflect>() -> Result<TypedConverter<F, T>> {
    converter_with_scope(Scope::global())
}

pub fn converter_with_scope<F: Reflect, T: Reflect>(scope: &Scope) -> Result<TypedConverter<F, T>> {
    Ok(TypedConverter {
        inner: scope.converter(&F::descriptor(), &T::descriptor())?,
        _types: PhantomData,
    })
}

/// Independent copy of `value` made by the global deep-copy scope.
pub fn deep_copy<T: Reflect>(value: &T) -> Result<T> {
    cast_with_scope(Scope::global_deep_copy(), value)
}

/// Deep copy of a runtime value: no heap storage is shared with `value`.
pub fn deep_copy_value(ty: &TypeRef, value: &Value) -> Result<Value> {
    Scope::global_deep_copy().convert(ty, ty, value)
}

/// [`Converter`] with Rust types at both ends.
pub struct TypedConverter<F, T> {
    inner: Converter,
    _types: PhantomData<fn(&F) -> T>,
}

impl<F: Reflect, T: Reflect> TypedConverter<F, T> {
    pub fn convert(&self, value: &F) -> Result<T> {
        T::from_value(&self.inner.convert(&value.to_value())?)
    }

    /// The untyped converter.
    pub fn as_converter(&self) -> &Converter {
        &self.inner
    }

    pub fn produces_alias(&self) -> bool {
        self.inner.produces_alias()
    }

    pub fn is_override(&self) -> bool {
        self.inner.is_override()
    }
}

impl<F, T> Clone for TypedConverter<F, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _types: PhantomData,
        }
    }
}

impl<F, T> fmt::Debug for TypedConverter<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedConverter").field(&self.inner).finish()
    }
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
